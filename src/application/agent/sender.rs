use crate::application::agent::metrics::AgentMetrics;
use crate::application::system::shutdown::ShutdownSignal;
use crate::domain::protocol::path::update_path;
use crate::domain::protocol::{Signer, WireMetric};
use crate::domain::types::MetricUpdate;
use crate::infrastructure::http_client_factory::base_url;
use anyhow::{Context, Result, bail};
use futures::future::join_all;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::str::FromStr;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

/// How a report is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitMode {
    /// One `POST /update/{kind}/{name}/{value}` per metric
    Plain,
    /// One JSON `POST /update` per metric
    Json,
    /// A single JSON array to `POST /updates`
    Batch,
}

impl FromStr for TransmitMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(TransmitMode::Plain),
            "json" => Ok(TransmitMode::Json),
            "jsonbatch" | "batch" => Ok(TransmitMode::Batch),
            other => bail!("unknown transmit mode {:?} (expected plain, json or jsonbatch)", other),
        }
    }
}

/// Pushes agent reports to the server. Nothing is retried.
pub struct MetricsSender {
    client: Client,
    base_url: String,
    signer: Signer,
    mode: TransmitMode,
    fan_out_deadline: Duration,
}

impl MetricsSender {
    pub fn new(
        client: Client,
        address: &str,
        signer: Signer,
        mode: TransmitMode,
        fan_out_deadline: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url(address),
            signer,
            mode,
            fan_out_deadline,
        }
    }

    /// Sends one report and returns how many metrics the server accepted.
    pub async fn send(&self, updates: &[MetricUpdate]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        match self.mode {
            TransmitMode::Batch => self.send_batch(updates).await,
            TransmitMode::Plain | TransmitMode::Json => self.send_each(updates).await,
        }
    }

    async fn send_batch(&self, updates: &[MetricUpdate]) -> Result<usize> {
        let body: Vec<WireMetric> = updates
            .iter()
            .map(|u| WireMetric::from_update(u, &self.signer))
            .collect();

        self.client
            .post(format!("{}/updates/", self.base_url))
            .json(&body)
            .send()
            .await
            .context("send batch")?
            .error_for_status()
            .context("batch rejected")?;

        Ok(updates.len())
    }

    /// Fans out one request per metric, bounded by the fan-out deadline.
    /// Individual failures are logged; the count of successes is returned.
    async fn send_each(&self, updates: &[MetricUpdate]) -> Result<usize> {
        let requests = updates.iter().map(|u| self.send_one(u));

        let results = time::timeout(self.fan_out_deadline, join_all(requests))
            .await
            .context("report deadline exceeded")?;

        let mut sent = 0;
        for (update, result) in updates.iter().zip(results) {
            match result {
                Ok(()) => sent += 1,
                Err(e) => warn!("Failed to send {}: {:#}", update.name, e),
            }
        }
        Ok(sent)
    }

    async fn send_one(&self, update: &MetricUpdate) -> Result<()> {
        let request = match self.mode {
            TransmitMode::Plain => self
                .client
                .post(format!("{}{}", self.base_url, update_path(update)))
                .header(CONTENT_TYPE, "text/plain"),
            _ => self
                .client
                .post(format!("{}/update/", self.base_url))
                .json(&WireMetric::from_update(update, &self.signer)),
        };

        request.send().await?.error_for_status()?;
        Ok(())
    }

    /// Reports on a fixed period until shutdown. The first report goes out
    /// one period after start.
    pub async fn run(self, metrics: AgentMetrics, period: Duration, shutdown: ShutdownSignal) {
        info!(
            "MetricsSender started. Mode: {:?}, Interval: {:?}, Target: {}",
            self.mode, period, self.base_url
        );

        let mut interval = time::interval(period);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = metrics.next_report().await;
                    match self.send(&report).await {
                        Ok(sent) => debug!("Reported {}/{} metrics", sent, report.len()),
                        Err(e) => error!("Report failed: {:#}", e),
                    }
                }
                _ = shutdown.wait() => {
                    info!("MetricsSender stopped.");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MetricValue;
    use crate::infrastructure::http_client_factory::HttpClientFactory;

    #[test]
    fn test_transmit_mode_parsing() {
        assert_eq!("plain".parse::<TransmitMode>().unwrap(), TransmitMode::Plain);
        assert_eq!("JSON".parse::<TransmitMode>().unwrap(), TransmitMode::Json);
        assert_eq!(
            "jsonbatch".parse::<TransmitMode>().unwrap(),
            TransmitMode::Batch
        );
        assert!("xml".parse::<TransmitMode>().is_err());
    }

    #[tokio::test]
    async fn test_empty_report_sends_nothing() {
        let sender = MetricsSender::new(
            HttpClientFactory::create_client(Duration::from_millis(100)),
            "127.0.0.1:1",
            Signer::disabled(),
            TransmitMode::Batch,
            Duration::from_millis(100),
        );
        assert_eq!(sender.send(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_batch() {
        let sender = MetricsSender::new(
            HttpClientFactory::create_client(Duration::from_millis(200)),
            "127.0.0.1:1",
            Signer::disabled(),
            TransmitMode::Batch,
            Duration::from_millis(200),
        );
        let report = [MetricUpdate::new("PollCount", MetricValue::Counter(1))];
        assert!(sender.send(&report).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_counts_zero_per_metric() {
        let sender = MetricsSender::new(
            HttpClientFactory::create_client(Duration::from_millis(200)),
            "127.0.0.1:1",
            Signer::disabled(),
            TransmitMode::Json,
            Duration::from_secs(2),
        );
        let report = [
            MetricUpdate::new("PollCount", MetricValue::Counter(1)),
            MetricUpdate::new("Alloc", MetricValue::Gauge(1.5)),
        ];
        assert_eq!(sender.send(&report).await.unwrap(), 0);
    }
}
