//! Catch server entry point.
//!
//! Usage: `catch-server [config.json]`; `CATCH_*` environment variables
//! override the file. Runs until Ctrl-C, then drains pending writes.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use catch_core::logging::init_tracing;
use catch_server::{CatchRuntime, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref()).context("loading server config")?;

    init_tracing(&config.tracing);
    info!("Starting catch server (backend {:?})", config.backend);

    let runtime = CatchRuntime::start(&config)
        .await
        .context("starting catch runtime")?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("Shutdown requested, flushing player writes");
    runtime.shutdown().await;
    Ok(())
}
