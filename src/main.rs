mod config;
mod ethereum;
mod server;

use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use config::Config;
use ethereum::{
    abi::CategoryRegistry,
    contract::ContractAggregator,
    provider::{HttpConnector, NetworkRegistry},
};
use server::AppState;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("project-contract-info")
        .version("0.1.0")
        .about("HTTP service reporting account facts and category metrics for project contracts")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Address to listen on"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16))
                .help("Port to listen on"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .help("Network used when a request names none (mainnet, sepolia, goerli, localhost)"),
        )
        .arg(
            Arg::new("rpc-url")
                .short('r')
                .long("rpc-url")
                .value_name("URL")
                .help("RPC endpoint URL for the default network"),
        )
        .arg(
            Arg::new("rpc-timeout")
                .long("rpc-timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .help("Timeout for a single RPC call, 0 disables it"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample()?);
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load_or_default(config_path).await;

    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    if let Some(network) = matches.get_one::<String>("network") {
        config.default_network = network.clone();
    }

    if let Some(rpc_url) = matches.get_one::<String>("rpc-url") {
        let network_config = config
            .networks
            .get_mut(&config.default_network)
            .ok_or_else(|| anyhow!("Network '{}' is not configured", config.default_network))?;
        network_config.rpc_url = rpc_url.clone();
    }

    if let Some(timeout) = matches.get_one::<u64>("rpc-timeout") {
        config.rpc.timeout_secs = Some(*timeout);
    }

    config.validate()?;

    let categories = Arc::new(CategoryRegistry::load()?);
    let networks = NetworkRegistry::from_config(&config)?;
    let connector = HttpConnector::new(config.rpc.timeout());

    info!("Starting project contract info server");
    info!("Default network: {}", networks.default_network());
    info!("Known networks: {}", networks.get_available_networks().join(", "));
    info!(
        "Supported contract types: {}",
        categories
            .categories()
            .map(|category| category.label)
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "Unknown networks fall back to: {}",
        networks.resolve(&config.fallback_network)
    );

    let state = AppState {
        aggregator: Arc::new(ContractAggregator::new(
            categories,
            networks,
            Arc::new(connector),
        )),
    };

    if let Err(e) = server::serve(&config.server, state).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
