//! Metric agent
//!
//! Samples process and host statistics and reports them to the metric server.

use anyhow::Result;
use clap::Parser;
use metricstore::application::agent::Agent;
use metricstore::application::system::shutdown::ShutdownSignal;
use metricstore::config::AgentConfig;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Metric agent {} starting...", env!("CARGO_PKG_VERSION"));

    let config = AgentConfig::parse();
    let shutdown = ShutdownSignal::new();
    shutdown.trigger_on_ctrl_c();

    Agent::new(config).run(shutdown).await
}
