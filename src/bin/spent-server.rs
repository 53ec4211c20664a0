#![forbid(unsafe_code)]
//! HTTP server exposing spent address export and merge

use clap::Parser;
use spentledger::api::{run_api_server, ApiNode};
use spentledger::cli::{init_logging, load_service_from_config};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override api.port from the config
    #[arg(long)]
    port: Option<u16>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, service) = load_service_from_config(cli.config.as_deref())?;
    tracing::info!(
        "Serving registry {} (default file {})",
        config.database.path,
        service.spent_file().display()
    );

    let host = config.api_host()?;
    let port = cli.port.unwrap_or(config.api.port);
    let node = ApiNode::new(service).with_cors_origins(config.api.cors_origins.clone());
    run_api_server(Arc::new(node), host, port).await
}
