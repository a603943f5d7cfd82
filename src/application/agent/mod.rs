//! Metric collection agent: samplers fill a shared set of metrics, the
//! sender reports it to the server.

pub mod metrics;
pub mod registry;
pub mod samplers;
pub mod sender;

pub use metrics::{AgentMetrics, Reading};
pub use samplers::{HostStats, ProcessStats, Sampler, StatsProvider};
pub use sender::{MetricsSender, TransmitMode};

use crate::application::system::shutdown::ShutdownSignal;
use crate::config::AgentConfig;
use crate::domain::protocol::Signer;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use anyhow::Result;
use tracing::{info, warn};

pub struct Agent {
    config: AgentConfig,
    metrics: AgentMetrics,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            metrics: AgentMetrics::new(),
        }
    }

    /// Runs both samplers and the sender until `shutdown` fires.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<()> {
        info!(
            "Starting agent. Server: {}, Poll: {:?}, Report: {:?}, Mode: {:?}",
            self.config.address,
            self.config.poll_interval,
            self.config.report_interval,
            self.config.mode
        );

        let mut tasks = Vec::new();

        match ProcessStats::new() {
            Ok(process) => {
                let sampler = Sampler::new(
                    process,
                    self.metrics.clone(),
                    self.config.poll_interval,
                    shutdown.clone(),
                );
                tasks.push(tokio::spawn(sampler.run()));
            }
            Err(e) => warn!("Process stats unavailable: {:#}", e),
        }

        let host = Sampler::new(
            HostStats::new(),
            self.metrics.clone(),
            self.config.poll_interval,
            shutdown.clone(),
        );
        tasks.push(tokio::spawn(host.run()));

        let sender = MetricsSender::new(
            HttpClientFactory::create_client(self.config.report_interval),
            &self.config.address,
            Signer::new(&self.config.key),
            self.config.mode,
            self.config.report_interval,
        );
        tasks.push(tokio::spawn(sender.run(
            self.metrics.clone(),
            self.config.report_interval,
            shutdown.clone(),
        )));

        shutdown.wait().await;
        for task in tasks {
            if let Err(e) = task.await {
                warn!("Agent task ended abnormally: {}", e);
            }
        }
        info!("Agent stopped.");
        Ok(())
    }
}
