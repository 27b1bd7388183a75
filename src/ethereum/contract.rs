use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    primitives::{hex, Address, U256},
};
use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{AccountFacts, AggregateError, ContractData, ContractInfo, ContractInfoRequest};
use crate::ethereum::{
    abi::{CategoryRegistry, ContractCategory, Field, Unit},
    provider::{LedgerClient, LedgerConnector, NetworkRegistry},
    utils,
};

/// Collects account facts and category metrics for one contract per request.
pub struct ContractAggregator {
    categories: Arc<CategoryRegistry>,
    networks: NetworkRegistry,
    connector: Arc<dyn LedgerConnector>,
}

impl ContractAggregator {
    pub fn new(
        categories: Arc<CategoryRegistry>,
        networks: NetworkRegistry,
        connector: Arc<dyn LedgerConnector>,
    ) -> Self {
        Self {
            categories,
            networks,
            connector,
        }
    }

    /// Gather everything known about `request.contract_address`.
    ///
    /// Only missing input and connection setup are errors. Failed reads are
    /// reported inside the returned [`ContractInfo`]: a failed account fact
    /// sets `error` and skips the category routine, a failed category call
    /// sets `contract_data.error`.
    pub async fn get_contract_info(
        &self,
        request: &ContractInfoRequest,
    ) -> Result<ContractInfo, AggregateError> {
        let (contract_type, contract_address) = request.required_fields().ok_or_else(|| {
            AggregateError::InvalidRequest("Contract type and address are required".to_string())
        })?;

        let network = request
            .network
            .clone()
            .unwrap_or_else(|| self.networks.default_network().to_string());

        info!(
            contract_type = %contract_type,
            contract_address = %contract_address,
            network = %network,
            "Fetching project contract information"
        );

        let rpc_url = self.networks.resolve(&network);
        let client = self.connector.connect(rpc_url)?;

        let mut contract_info = ContractInfo {
            contract_type: contract_type.to_string(),
            address: contract_address.to_string(),
            network,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            provider: rpc_url.to_string(),
            facts: None,
            contract_data: None,
            error: None,
        };

        match fetch_account_facts(client.as_ref(), contract_address).await {
            Ok((address, facts)) => {
                info!(
                    has_code = facts.has_code,
                    balance = %facts.balance,
                    transaction_count = facts.transaction_count,
                    current_block = facts.current_block_number,
                    "Basic contract info"
                );
                contract_info.facts = Some(facts);
                contract_info.contract_data =
                    Some(self.fetch_contract_data(client.as_ref(), contract_type, address).await);
            }
            Err(e) => {
                warn!("Error fetching contract details: {}", e);
                contract_info.error = Some(e.to_string());
            }
        }

        info!(timestamp = %contract_info.timestamp, "Project contract information assembled");
        Ok(contract_info)
    }

    async fn fetch_contract_data(
        &self,
        client: &dyn LedgerClient,
        contract_type: &str,
        address: Address,
    ) -> ContractData {
        let Some(category) = self.categories.lookup(contract_type) else {
            return ContractData::error(self.categories.unknown_type_message());
        };

        match run_category(client, category, address).await {
            Ok(values) => {
                info!("{} contract data:", category.label);
                for (field, value) in &values {
                    log_field(field, value);
                }

                ContractData::Fields(
                    values
                        .into_iter()
                        .map(|(field, value)| (field.key.to_string(), value))
                        .collect::<BTreeMap<_, _>>(),
                )
            }
            Err(e) => {
                warn!("Error fetching {} data: {}", category.label, e);
                ContractData::error(e.to_string())
            }
        }
    }
}

/// Code, balance, nonce and block height. The first failure discards the rest.
async fn fetch_account_facts(
    client: &dyn LedgerClient,
    contract_address: &str,
) -> Result<(Address, AccountFacts)> {
    let address = utils::parse_address(contract_address)?;

    let code = client.get_code(address).await?;
    let balance = client.get_balance(address).await?;
    let transaction_count = client.get_transaction_count(address).await?;
    let current_block_number = client.get_block_number().await?;

    let facts = AccountFacts {
        has_code: !code.is_empty(),
        code_length: utils::hex_code_length(&code),
        balance: utils::format_ether(balance),
        transaction_count,
        current_block_number,
    };

    Ok((address, facts))
}

/// Issue every call of `category` in order, stopping at the first failure.
async fn run_category(
    client: &dyn LedgerClient,
    category: &ContractCategory,
    address: Address,
) -> Result<Vec<(Field, String)>> {
    let mut values = Vec::new();

    for step in category.steps {
        let function = category.function(step.function)?;

        let calldata = function
            .abi_encode_input(&[])
            .map_err(|e| anyhow!("Failed to encode {} call: {}", function.name, e))?;

        let output = client.call(address, calldata.into()).await?;

        let decoded = function
            .abi_decode_output(&output, false)
            .map_err(|e| anyhow!("Failed to decode {} result: {}", function.name, e))?;

        if decoded.len() != step.fields.len() {
            return Err(anyhow!(
                "{} returned {} values, expected {}",
                function.name,
                decoded.len(),
                step.fields.len()
            ));
        }

        for (field, value) in step.fields.iter().zip(&decoded) {
            values.push((*field, render_value(value)?));
        }
    }

    Ok(values)
}

/// Render a decoded value as a string; integers stay exact decimals.
fn render_value(value: &DynSolValue) -> Result<String> {
    match value {
        DynSolValue::Address(addr) => Ok(addr.to_checksum(None)),
        DynSolValue::Uint(num, _) => Ok(num.to_string()),
        DynSolValue::Int(num, _) => Ok(num.to_string()),
        DynSolValue::Bool(b) => Ok(b.to_string()),
        DynSolValue::String(s) => Ok(s.clone()),
        DynSolValue::Bytes(bytes) => Ok(hex::encode_prefixed(bytes)),
        DynSolValue::FixedBytes(word, size) => Ok(hex::encode_prefixed(&word[..*size])),
        _ => Err(anyhow!("Unsupported return type: {:?}", value)),
    }
}

fn log_field(field: &Field, value: &str) {
    match field.unit {
        Unit::Wei => match value.parse::<U256>() {
            Ok(wei) => info!("  {}: {} ETH", field.key, utils::format_ether(wei)),
            Err(_) => info!("  {}: {}", field.key, value),
        },
        Unit::Seconds => info!("  {}: {} seconds", field.key, value),
        Unit::Plain => info!("  {}: {}", field.key, value),
    }
}
