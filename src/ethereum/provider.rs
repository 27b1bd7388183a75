use crate::config::Config;
use alloy::{
    primitives::{Address, Bytes, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionRequest,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Read access to a ledger node
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    async fn get_balance(&self, address: Address) -> Result<U256>;

    async fn get_transaction_count(&self, address: Address) -> Result<u64>;

    async fn get_block_number(&self) -> Result<u64>;

    /// `eth_call` against `to` with pre-encoded calldata
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes>;
}

/// Opens a client for an RPC endpoint. Called once per request.
pub trait LedgerConnector: Send + Sync {
    fn connect(&self, rpc_url: &str) -> Result<Box<dyn LedgerClient>>;
}

/// Network name to RPC endpoint table
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    endpoints: HashMap<String, String>,
    default_network: String,
    fallback_url: String,
}

impl NetworkRegistry {
    pub fn from_config(config: &Config) -> Result<Self> {
        let fallback_url = config
            .networks
            .get(&config.fallback_network)
            .map(|network| network.rpc_url.clone())
            .ok_or_else(|| {
                anyhow!(
                    "Fallback network '{}' not configured",
                    config.fallback_network
                )
            })?;

        let endpoints = config
            .networks
            .iter()
            .map(|(name, network)| (name.clone(), network.rpc_url.clone()))
            .collect();

        Ok(Self {
            endpoints,
            default_network: config.default_network.clone(),
            fallback_url,
        })
    }

    /// Endpoint for `network`; unknown names get the fallback endpoint.
    pub fn resolve(&self, network: &str) -> &str {
        self.endpoints
            .get(network)
            .map(String::as_str)
            .unwrap_or(&self.fallback_url)
    }

    pub fn default_network(&self) -> &str {
        &self.default_network
    }

    pub fn get_available_networks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endpoints.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Connects over HTTP with alloy
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    timeout: Option<Duration>,
}

impl HttpConnector {
    /// A zero `timeout` is treated as no timeout.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout: timeout.filter(|limit| !limit.is_zero()),
        }
    }
}

impl LedgerConnector for HttpConnector {
    fn connect(&self, rpc_url: &str) -> Result<Box<dyn LedgerClient>> {
        let url = rpc_url
            .parse()
            .map_err(|e| anyhow!("Invalid RPC URL '{}': {}", rpc_url, e))?;
        let provider = ProviderBuilder::new().on_http(url);

        Ok(Box::new(HttpLedgerClient {
            provider,
            timeout: self.timeout,
        }))
    }
}

pub struct HttpLedgerClient {
    provider: RootProvider<Http<Client>>,
    timeout: Option<Duration>,
}

impl HttpLedgerClient {
    async fn bounded<T, E, F>(&self, method: &str, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| anyhow!("{} timed out after {}s", method, limit.as_secs()))?,
            None => request.await,
        };

        response.map_err(|e| {
            tracing::debug!("{} failed: {}", method, e);
            e.into()
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.bounded("eth_getCode", async {
            self.provider.get_code_at(address).await
        })
        .await
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.bounded("eth_getBalance", async {
            self.provider.get_balance(address).await
        })
        .await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        self.bounded("eth_getTransactionCount", async {
            self.provider.get_transaction_count(address).await
        })
        .await
    }

    async fn get_block_number(&self) -> Result<u64> {
        self.bounded("eth_blockNumber", async {
            self.provider.get_block_number().await
        })
        .await
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes> {
        let call_request = TransactionRequest::default().to(to).input(input.into());

        self.bounded("eth_call", async {
            self.provider.call(&call_request).await
        })
        .await
    }
}
