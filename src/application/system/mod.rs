pub mod shutdown;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::application::snapshot_scheduler::SnapshotScheduler;
use crate::application::system::shutdown::ShutdownSignal;
use crate::config::ServerConfig;
use crate::domain::protocol::Signer;
use crate::domain::repositories::MetricRepository;
use crate::infrastructure::{Database, InMemoryMetricRepository, SqliteMetricRepository};
use crate::interfaces::http::{AppState, metric_routes};

/// The metric server: one repository, chosen at startup, behind the HTTP
/// routes and the snapshot scheduler.
pub struct Application {
    pub config: ServerConfig,
    pub repository: Arc<dyn MetricRepository>,
    pub signer: Signer,
}

impl Application {
    pub async fn build(config: ServerConfig) -> Result<Self> {
        info!("Building metric server (address: {})...", config.address);

        let repository: Arc<dyn MetricRepository> = if config.uses_database() {
            match Database::new(&config.database_dsn).await {
                Ok(database) => {
                    info!("Using SQL storage");
                    Arc::new(SqliteMetricRepository::new(database))
                }
                Err(e) => {
                    // Requests still get a clear error and /ping reports the outage
                    error!("Database unavailable, serving without storage: {:#}", e);
                    Arc::new(SqliteMetricRepository::disconnected())
                }
            }
        } else {
            info!(
                "Using in-memory storage (snapshot: {:?}, write-through: {})",
                config.snapshot_path(),
                config.write_through()
            );
            Arc::new(InMemoryMetricRepository::with_config(
                config.in_memory_config(),
            ))
        };

        if let Err(e) = repository.restore().await {
            warn!("Restore failed, starting empty: {}", e);
        }

        let signer = Signer::new(&config.key);
        if signer.is_enabled() {
            info!("Request signatures enabled");
        }

        Ok(Self {
            config,
            repository,
            signer,
        })
    }

    /// Serves until `shutdown` fires, then flushes and closes the repository.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<()> {
        let scheduler = self.config.snapshot_period().map(|period| {
            let scheduler =
                SnapshotScheduler::new(self.repository.clone(), period, shutdown.clone());
            tokio::spawn(scheduler.run())
        });

        let app = metric_routes(AppState::new(self.repository.clone(), self.signer.clone()));
        info!("Listening on {}", listener.local_addr()?);

        let wait = shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { wait.wait().await })
            .await
            .context("http server failed")?;

        // The server may also stop on its own error; make sure tasks see it.
        shutdown.trigger();
        if let Some(handle) = scheduler
            && let Err(e) = handle.await
        {
            warn!("Snapshot scheduler ended abnormally: {}", e);
        }

        info!("Flushing metrics before exit...");
        if let Err(e) = self.repository.flush().await {
            error!("Final flush failed: {}", e);
        }
        if let Err(e) = self.repository.close().await {
            error!("Closing storage failed: {}", e);
        }
        info!("Server stopped.");
        Ok(())
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(&self.config.address)
            .await
            .with_context(|| format!("bind {}", self.config.address))
    }
}
