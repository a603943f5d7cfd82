//! Metric server
//!
//! Accepts metric updates over HTTP and keeps them in memory (optionally
//! snapshotted to a JSON file) or in SQLite.
//!
//! # Usage
//! ```sh
//! ADDRESS=127.0.0.1:8080 STORE_INTERVAL=10s cargo run --bin server
//! ```

use anyhow::Result;
use clap::Parser;
use metricstore::application::system::Application;
use metricstore::application::system::shutdown::ShutdownSignal;
use metricstore::config::ServerConfig;
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

    info!("Metric server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::parse();
    info!(
        "Configuration loaded: store_interval={:?}, store_file={:?}, restore={}, database={}",
        config.store_interval,
        config.store_file,
        config.restore,
        config.uses_database()
    );

    let app = Application::build(config).await?;
    let listener = app.bind().await?;

    let shutdown = ShutdownSignal::new();
    shutdown.trigger_on_ctrl_c();

    info!("Server running. Press Ctrl+C to shutdown.");
    app.run(listener, shutdown).await
}
