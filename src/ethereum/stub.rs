//! In-memory ledger used by tests. Serves ABI-encoded canned outputs and
//! records every invocation.

use super::abi::CategoryRegistry;
use super::provider::{LedgerClient, LedgerConnector};
use alloy::{
    dyn_abi::DynSolValue,
    json_abi::Function,
    primitives::{address, Address, Bytes, Selector, U256},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

#[derive(Clone)]
pub struct StubLedger {
    code: Bytes,
    balance: U256,
    nonce: u64,
    block_number: u64,
    outputs: HashMap<Selector, (String, Bytes)>,
    failures: HashMap<String, String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubLedger {
    pub fn new() -> Self {
        Self {
            code: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
            balance: U256::from(1_500_000_000_000_000_000u128),
            nonce: 1,
            block_number: 19_000_000,
            outputs: HashMap::new(),
            failures: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Stub that answers every function of every built-in category.
    pub fn canned(registry: &CategoryRegistry) -> Self {
        let mut ledger = Self::new();
        for category in registry.categories() {
            for step in category.steps {
                let function = category.function(step.function).unwrap();
                ledger = ledger.returning(function, canned_output(&function.name));
            }
        }
        ledger
    }

    pub fn with_code(mut self, code: &'static [u8]) -> Self {
        self.code = Bytes::from_static(code);
        self
    }

    pub fn returning(mut self, function: &Function, values: Vec<DynSolValue>) -> Self {
        let encoded = DynSolValue::Tuple(values).abi_encode_params();
        self.outputs
            .insert(function.selector(), (function.name.clone(), encoded.into()));
        self
    }

    /// Make `method` fail with `message`. `method` is an RPC method name such
    /// as `eth_getBalance`, or a contract function name for `eth_call`.
    pub fn failing(mut self, method: &str, message: &str) -> Self {
        self.failures.insert(method.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &str) -> Result<()> {
        self.calls.lock().unwrap().push(method.to_string());
        match self.failures.get(method) {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

/// Values the canned stub returns, keyed by function name
pub fn canned_output(function: &str) -> Vec<DynSolValue> {
    let uint = |value: u128| DynSolValue::Uint(U256::from(value), 256);

    match function {
        "name" => vec![DynSolValue::String("Derivative Ether".to_string())],
        "symbol" => vec![DynSolValue::String("dETH".to_string())],
        "decimals" => vec![DynSolValue::Uint(U256::from(18u8), 8)],
        "totalSupply" => vec![uint(1_000_000_000_000_000_000_000)],
        "owner" => vec![DynSolValue::Address(OWNER)],
        "getContractETHBalance" => vec![uint(42_000_000_000_000_000_000)],
        "getStakingStats" => vec![
            uint(640_000_000_000_000_000_000),
            uint(20),
            uint(32_000_000_000_000_000_000),
        ],
        "proposalCount" => vec![uint(7)],
        "votingPeriod" => vec![uint(259_200)],
        "executionDelay" => vec![uint(86_400)],
        "quorum" => vec![uint(4_000_000_000_000_000_000)],
        "getStakingOverview" => vec![
            uint(1_000_000_000_000_000_000_000),
            uint(960_000_000_000_000_000_000),
            uint(30),
            uint(32_000_000_000_000_000_000),
        ],
        other => panic!("no canned output for {}", other),
    }
}

#[async_trait]
impl LedgerClient for StubLedger {
    async fn get_code(&self, _address: Address) -> Result<Bytes> {
        self.record("eth_getCode")?;
        Ok(self.code.clone())
    }

    async fn get_balance(&self, _address: Address) -> Result<U256> {
        self.record("eth_getBalance")?;
        Ok(self.balance)
    }

    async fn get_transaction_count(&self, _address: Address) -> Result<u64> {
        self.record("eth_getTransactionCount")?;
        Ok(self.nonce)
    }

    async fn get_block_number(&self) -> Result<u64> {
        self.record("eth_blockNumber")?;
        Ok(self.block_number)
    }

    async fn call(&self, _to: Address, input: Bytes) -> Result<Bytes> {
        let selector = Selector::try_from(&input[..4])?;
        match self.outputs.get(&selector) {
            Some((name, output)) => {
                self.record(name)?;
                Ok(output.clone())
            }
            None => {
                self.record("eth_call")?;
                Err(anyhow!("execution reverted"))
            }
        }
    }
}

/// Hands out clones of one `StubLedger` and remembers the URLs asked for.
#[derive(Clone)]
pub struct StubConnector {
    ledger: StubLedger,
    urls: Arc<Mutex<Vec<String>>>,
    refusal: Option<String>,
}

impl StubConnector {
    pub fn new(ledger: StubLedger) -> Self {
        Self {
            ledger,
            urls: Arc::new(Mutex::new(Vec::new())),
            refusal: None,
        }
    }

    pub fn refusing(mut self, message: &str) -> Self {
        self.refusal = Some(message.to_string());
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn ledger(&self) -> &StubLedger {
        &self.ledger
    }
}

impl LedgerConnector for StubConnector {
    fn connect(&self, rpc_url: &str) -> Result<Box<dyn LedgerClient>> {
        self.urls.lock().unwrap().push(rpc_url.to_string());
        if let Some(message) = &self.refusal {
            return Err(anyhow!("{}", message));
        }
        Ok(Box::new(self.ledger.clone()))
    }
}
