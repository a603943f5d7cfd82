use crate::application::agent::registry::{POLL_COUNT, RANDOM_VALUE, TRACKED_METRICS};
use crate::domain::types::{MetricKind, MetricRecord, MetricSnapshot, MetricUpdate, MetricValue};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// One named gauge reading produced by a stats provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub name: &'static str,
    pub value: f64,
}

impl Reading {
    pub fn new(name: &'static str, value: f64) -> Self {
        Self { name, value }
    }
}

/// Locally collected metrics shared by the samplers and the sender.
///
/// All access goes through one lock.
#[derive(Clone)]
pub struct AgentMetrics {
    values: Arc<Mutex<MetricSnapshot>>,
}

impl AgentMetrics {
    /// Seeds every registered name with a zero value of its kind.
    pub fn new() -> Self {
        let values = TRACKED_METRICS
            .iter()
            .map(|(name, kind)| {
                let zero = match kind {
                    MetricKind::Gauge => MetricValue::Gauge(0.0),
                    MetricKind::Counter => MetricValue::Counter(0),
                };
                (name.to_string(), MetricRecord::new(zero))
            })
            .collect();

        Self {
            values: Arc::new(Mutex::new(values)),
        }
    }

    /// Stores gauge readings for registered gauge names; anything else is
    /// ignored. Returns how many readings were applied.
    pub async fn record(&self, readings: &[Reading]) -> usize {
        let mut values = self.values.lock().await;
        let mut applied = 0;
        for reading in readings {
            match values.get_mut(reading.name) {
                Some(record) if record.kind == MetricKind::Gauge => {
                    record.value = reading.value;
                    applied += 1;
                }
                _ => debug!("Ignoring unregistered reading {}", reading.name),
            }
        }
        applied
    }

    /// Starts a report: bumps the poll counter, reseeds the random gauge and
    /// returns a consistent copy of every metric, all under one lock.
    pub async fn next_report(&self) -> Vec<MetricUpdate> {
        let mut values = self.values.lock().await;

        if let Some(poll_count) = values.get_mut(POLL_COUNT) {
            poll_count.apply(MetricValue::Counter(1));
        }
        if let Some(random) = values.get_mut(RANDOM_VALUE) {
            random.value = rand::random::<f64>();
        }

        values
            .iter()
            .map(|(name, record)| MetricUpdate::new(name.clone(), record.value()))
            .collect()
    }

    pub async fn get(&self, name: &str) -> Option<MetricValue> {
        self.values.lock().await.get(name).map(|r| r.value())
    }
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::agent::registry::TOTAL_MEMORY;

    #[tokio::test]
    async fn test_seeded_from_registry() {
        let metrics = AgentMetrics::new();
        assert_eq!(metrics.get(POLL_COUNT).await, Some(MetricValue::Counter(0)));
        assert_eq!(metrics.get(TOTAL_MEMORY).await, Some(MetricValue::Gauge(0.0)));
        assert_eq!(metrics.get("Unknown").await, None);
    }

    #[tokio::test]
    async fn test_record_only_touches_registered_gauges() {
        let metrics = AgentMetrics::new();

        let applied = metrics
            .record(&[
                Reading::new(TOTAL_MEMORY, 1024.0),
                Reading::new("NotTracked", 1.0),
                Reading::new(POLL_COUNT, 99.0),
            ])
            .await;

        assert_eq!(applied, 1);
        assert_eq!(
            metrics.get(TOTAL_MEMORY).await,
            Some(MetricValue::Gauge(1024.0))
        );
        assert_eq!(metrics.get(POLL_COUNT).await, Some(MetricValue::Counter(0)));
    }

    #[tokio::test]
    async fn test_each_report_bumps_poll_count_once() {
        let metrics = AgentMetrics::new();

        let first = metrics.next_report().await;
        let second = metrics.next_report().await;

        let poll = |report: &[MetricUpdate]| {
            report
                .iter()
                .find(|u| u.name == POLL_COUNT)
                .map(|u| u.value)
                .unwrap()
        };
        assert_eq!(poll(&first), MetricValue::Counter(1));
        assert_eq!(poll(&second), MetricValue::Counter(2));
        assert_eq!(first.len(), TRACKED_METRICS.len());
    }

    #[tokio::test]
    async fn test_random_value_reseeded_in_unit_interval() {
        let metrics = AgentMetrics::new();
        metrics.next_report().await;

        match metrics.get(RANDOM_VALUE).await {
            Some(MetricValue::Gauge(v)) => assert!((0.0..1.0).contains(&v)),
            other => panic!("unexpected RandomValue {:?}", other),
        }
    }
}
