//! OpenRefine reconciliation service for the Library of Congress authorities.

use clap::Parser;
use loc_reconcile::ServiceConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// OpenRefine reconciliation endpoint backed by id.loc.gov suggest2.
#[derive(Parser)]
#[command(name = "loc-reconcile", version, about)]
struct Cli {
    /// Path to TOML configuration file (defaults to the user config dir when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `[server] host`.
    #[arg(long)]
    host: Option<String>,

    /// Override `[server] port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(long)]
    debug: bool,

    /// Disable the suggest2 hit cache.
    #[arg(long)]
    no_cache: bool,

    /// Write the effective configuration to this path and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "loc_reconcile=debug,loc_suggest=debug"
    } else {
        "loc_reconcile=info,loc_suggest=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    if let Some(path) = cli.write_config {
        config.save_to_file(&path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    info!("loc-reconcile v{} starting", env!("CARGO_PKG_VERSION"));
    loc_reconcile::serve(&config, shutdown_signal()).await?;
    info!("loc-reconcile shut down cleanly");
    Ok(())
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<ServiceConfig> {
    if let Some(path) = explicit {
        info!("loading config from {}", path.display());
        return Ok(ServiceConfig::from_file(path)?);
    }
    let path = ServiceConfig::default_config_path();
    if path.exists() {
        info!("loading config from {}", path.display());
        Ok(ServiceConfig::from_file(&path)?)
    } else {
        Ok(ServiceConfig::default())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
