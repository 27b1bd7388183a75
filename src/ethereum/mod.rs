pub mod abi;
pub mod contract;
pub mod provider;
#[cfg(test)]
pub mod stub;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /project-contract`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfoRequest {
    pub contract_type: Option<String>,
    pub contract_address: Option<String>,
    pub network: Option<String>,
}

impl ContractInfoRequest {
    /// Returns `(contract_type, contract_address)` when both are present and non-empty.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let contract_type = self.contract_type.as_deref().filter(|s| !s.is_empty())?;
        let contract_address = self.contract_address.as_deref().filter(|s| !s.is_empty())?;
        Some((contract_type, contract_address))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub contract_type: String,
    pub address: String,
    pub network: String,
    pub timestamp: String,
    pub provider: String,
    #[serde(flatten)]
    pub facts: Option<AccountFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_data: Option<ContractData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generic facts about any address. Either all of them are known or none are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFacts {
    pub has_code: bool,
    pub code_length: usize,
    pub balance: String,
    pub transaction_count: u64,
    pub current_block_number: u64,
}

/// Category-specific values, or the error that stopped the category routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContractData {
    Fields(BTreeMap<String, String>),
    Error { error: String },
}

impl ContractData {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
