use alloy::json_abi::{Function, JsonAbi};
use anyhow::{anyhow, Result};
use tracing::debug;

/// How a decoded value is meant to be read; only affects log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Plain,
    Wei,
    Seconds,
}

/// One response key filled from one output of a call
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub key: &'static str,
    pub unit: Unit,
}

/// A read-only call issued against the contract, in plan order
#[derive(Debug, Clone, Copy)]
pub struct CallStep {
    pub function: &'static str,
    pub fields: &'static [Field],
}

/// Static description of a supported contract category
#[derive(Debug, Clone, Copy)]
pub struct CategoryDefinition {
    pub label: &'static str,
    pub abi_json: &'static str,
    pub steps: &'static [CallStep],
}

const fn plain(key: &'static str) -> Field {
    Field {
        key,
        unit: Unit::Plain,
    }
}

const fn wei(key: &'static str) -> Field {
    Field {
        key,
        unit: Unit::Wei,
    }
}

const fn seconds(key: &'static str) -> Field {
    Field {
        key,
        unit: Unit::Seconds,
    }
}

const fn step(function: &'static str, fields: &'static [Field]) -> CallStep {
    CallStep { function, fields }
}

pub const CATEGORIES: &[CategoryDefinition] = &[
    CategoryDefinition {
        label: "dETH",
        abi_json: include_str!("../../abis/dETH.json"),
        steps: &[
            step("name", &[plain("name")]),
            step("symbol", &[plain("symbol")]),
            step("decimals", &[plain("decimals")]),
            step("totalSupply", &[wei("totalSupply")]),
            step("owner", &[plain("owner")]),
            step("getContractETHBalance", &[wei("ethBalance")]),
        ],
    },
    CategoryDefinition {
        label: "sETH",
        abi_json: include_str!("../../abis/sETH.json"),
        steps: &[
            step("name", &[plain("name")]),
            step("symbol", &[plain("symbol")]),
            step("decimals", &[plain("decimals")]),
            step("totalSupply", &[wei("totalSupply")]),
            step("owner", &[plain("owner")]),
            step(
                "getStakingStats",
                &[wei("totalStaked"), plain("totalStakers"), wei("averageStake")],
            ),
        ],
    },
    CategoryDefinition {
        label: "Governance",
        abi_json: include_str!("../../abis/governance.json"),
        steps: &[
            step("proposalCount", &[plain("proposalCount")]),
            step("votingPeriod", &[seconds("votingPeriod")]),
            step("executionDelay", &[seconds("executionDelay")]),
            step("quorum", &[wei("quorum")]),
            step("owner", &[plain("owner")]),
        ],
    },
    CategoryDefinition {
        label: "StakingDashboard",
        abi_json: include_str!("../../abis/stakingDashboard.json"),
        steps: &[step(
            "getStakingOverview",
            &[
                wei("totalETHDeposited"),
                wei("totalETHStaked"),
                plain("totalStakers"),
                wei("averageStakeAmount"),
            ],
        )],
    },
];

/// A category with its parsed ABI
#[derive(Debug)]
pub struct ContractCategory {
    pub label: &'static str,
    pub steps: &'static [CallStep],
    abi: JsonAbi,
}

impl ContractCategory {
    fn from_definition(definition: &CategoryDefinition) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_str(definition.abi_json)
            .map_err(|e| anyhow!("Failed to parse {} ABI: {}", definition.label, e))?;

        let category = Self {
            label: definition.label,
            steps: definition.steps,
            abi,
        };

        for step in category.steps {
            let function = category.function(step.function)?;

            if !function.inputs.is_empty() {
                return Err(anyhow!(
                    "{}.{} takes {} inputs, only argument-less calls are supported",
                    category.label,
                    step.function,
                    function.inputs.len()
                ));
            }

            if function.outputs.len() != step.fields.len() {
                return Err(anyhow!(
                    "{}.{} returns {} values but {} fields are mapped",
                    category.label,
                    step.function,
                    function.outputs.len(),
                    step.fields.len()
                ));
            }
        }

        Ok(category)
    }

    /// Lowercase name used to match the request's `contractType`
    pub fn key(&self) -> String {
        self.label.to_lowercase()
    }

    pub fn function(&self, name: &str) -> Result<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| {
                let available_functions: Vec<String> =
                    self.abi.functions().map(|f| f.name.clone()).collect();
                anyhow!(
                    "Function '{}' not found in {} ABI. Available functions: {}",
                    name,
                    self.label,
                    available_functions.join(", ")
                )
            })
    }
}

/// Every supported category, loaded once at startup
#[derive(Debug)]
pub struct CategoryRegistry {
    categories: Vec<ContractCategory>,
}

impl CategoryRegistry {
    pub fn load() -> Result<Self> {
        Self::from_definitions(CATEGORIES)
    }

    pub fn from_definitions(definitions: &[CategoryDefinition]) -> Result<Self> {
        let categories = definitions
            .iter()
            .map(ContractCategory::from_definition)
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} contract categories", categories.len());
        Ok(Self { categories })
    }

    /// Case-insensitive lookup by category name
    pub fn lookup(&self, contract_type: &str) -> Option<&ContractCategory> {
        let key = contract_type.to_lowercase();
        self.categories.iter().find(|category| category.key() == key)
    }

    pub fn categories(&self) -> impl Iterator<Item = &ContractCategory> {
        self.categories.iter()
    }

    pub fn unknown_type_message(&self) -> String {
        let labels: Vec<&str> = self.categories.iter().map(|c| c.label).collect();
        format!(
            "Unknown contract type. Supported types: {}",
            labels.join(", ")
        )
    }
}
