//! Worksite sync daemon
//!
//! Serves the offline write queue over HTTP. Domain handlers are wired in
//! by the embedding backend through a `RegistryFactory`; the bare daemon
//! starts with an empty registry, so batch syncs record a missing-handler
//! error per item until handlers are registered.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;

use worksite_sync::api;
use worksite_sync::app_state::app_state_factory;
use worksite_sync::log_appender::setup_logging;
use worksite_sync::sync::handler_registry::EmptyRegistryFactory;

#[derive(Parser, Debug)]
#[command(name = "worksite-syncd", about = "Offline write queue daemon")]
struct Args {
    /// Override the bind address from the settings file
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let app_state = app_state_factory(Arc::new(EmptyRegistryFactory))
        .await
        .context("Failed to initialize application state")?;

    setup_logging(app_state.project_config.project_dirs.data_dir())
        .await
        .context("Failed to setup logging")?;

    app_state
        .persistency()
        .init_database()
        .await
        .context("Failed to initialize database schema")?;

    warn!("No domain handlers registered; batch syncs will report missing handlers");

    let bind_addr = args
        .bind
        .unwrap_or_else(|| app_state.project_config.settings.server.bind_addr.clone());

    info!("Starting worksite-syncd on {}", bind_addr);
    api::serve(app_state, &bind_addr).await
}
