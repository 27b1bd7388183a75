use alloy::transports::http::reqwest::Url;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub default_network: String,
    pub fallback_network: String,
    pub networks: HashMap<String, NetworkConfig>,
    pub server: ServerConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Upper bound for a single RPC round-trip. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

impl RpcConfig {
    /// Per-call bound handed to the RPC client. `0` means unbounded, like an absent value.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(30),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut networks = HashMap::new();

        networks.insert(
            "mainnet".to_string(),
            NetworkConfig {
                rpc_url: "https://eth.llamarpc.com".to_string(),
                chain_id: 1,
            },
        );

        networks.insert(
            "sepolia".to_string(),
            NetworkConfig {
                rpc_url: format!("https://sepolia.infura.io/v3/{}", API_KEY_PLACEHOLDER),
                chain_id: 11155111,
            },
        );

        networks.insert(
            "goerli".to_string(),
            NetworkConfig {
                rpc_url: format!("https://goerli.infura.io/v3/{}", API_KEY_PLACEHOLDER),
                chain_id: 5,
            },
        );

        networks.insert(
            "localhost".to_string(),
            NetworkConfig {
                rpc_url: "http://localhost:8545".to_string(),
                chain_id: 31337,
            },
        );

        Self {
            networks,
            default_network: "mainnet".to_string(),
            fallback_network: "localhost".to_string(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            rpc: RpcConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_env_vars(std::env::var("INFURA_API_KEY").ok().as_deref());
        config
    }

    /// Substitute the API key placeholder in RPC URLs
    fn apply_env_vars(&mut self, api_key: Option<&str>) {
        match api_key {
            Some(api_key) => {
                tracing::info!("Using INFURA_API_KEY environment variable for RPC URLs");

                for (network_name, network_config) in &mut self.networks {
                    if network_config.rpc_url.contains(API_KEY_PLACEHOLDER) {
                        network_config.rpc_url =
                            network_config.rpc_url.replace(API_KEY_PLACEHOLDER, api_key);
                        tracing::debug!("Updated {} RPC URL with API key", network_name);
                    }
                }
            }
            None => {
                for (network_name, network_config) in &self.networks {
                    if network_config.rpc_url.contains(API_KEY_PLACEHOLDER) {
                        tracing::warn!("RPC endpoint for {} still has an API key placeholder, set INFURA_API_KEY to use it", network_name);
                    }
                }
            }
        }
    }

    /// Check that the configuration can actually serve requests
    pub fn validate(&self) -> Result<()> {
        if !self.networks.contains_key(&self.fallback_network) {
            return Err(anyhow!(
                "Fallback network '{}' is not configured",
                self.fallback_network
            ));
        }

        if !self.networks.contains_key(&self.default_network) {
            return Err(anyhow!(
                "Default network '{}' is not configured",
                self.default_network
            ));
        }

        for (network_name, network_config) in &self.networks {
            network_config.rpc_url.parse::<Url>().map_err(|e| {
                anyhow!(
                    "Invalid RPC URL '{}' for network '{}': {}",
                    network_config.rpc_url,
                    network_name,
                    e
                )
            })?;
        }

        Ok(())
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir
            .join("project-contract-info")
            .join("config.toml"))
    }

    /// Render the default configuration as a commented TOML file
    pub fn generate_sample() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        Ok(format!(
            "# Project contract info service configuration\n\
             # Requests naming an unknown network are served by `fallback_network`.\n\
             # Set INFURA_API_KEY to fill in the {} placeholders.\n\n{}",
            API_KEY_PLACEHOLDER, body
        ))
    }
}
