// Node internals stay public for tests and external consumers.
#![allow(dead_code)]

mod api;
mod config;
mod node;
mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::YatriConfig;
use crate::node::RegistryNode;

#[derive(Parser, Debug)]
#[command(
    name = "yatri-node",
    version,
    about = "Yatri digital identity registry node"
)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "yatri.toml")]
    config: PathBuf,

    /// Override the API port
    #[arg(long)]
    port: Option<u16>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write a default configuration file and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if args.init {
        let config = YatriConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default configuration");
        return Ok(());
    }

    let mut config = YatriConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting yatri registry node"
    );

    let node = Arc::new(RegistryNode::new(config)?);

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for shutdown signal");
    };

    tokio::select! {
        result = Arc::clone(&node).run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "node terminated with error");
            }
        }
        _ = shutdown => {
            tracing::info!("shutdown signal received");
        }
    }

    node.shutdown();
    Ok(())
}
