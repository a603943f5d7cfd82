use crate::application::system::shutdown::ShutdownSignal;
use crate::domain::repositories::MetricRepository;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{error, info};

/// Flushes the repository to its snapshot target on a fixed period,
/// independent of request traffic.
///
/// A failed flush is fatal: the scheduler triggers process shutdown and stops.
pub struct SnapshotScheduler {
    repository: Arc<dyn MetricRepository>,
    period: Duration,
    shutdown: ShutdownSignal,
}

impl SnapshotScheduler {
    pub fn new(
        repository: Arc<dyn MetricRepository>,
        period: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            repository,
            period,
            shutdown,
        }
    }

    pub async fn run(self) {
        info!("SnapshotScheduler started. Interval: {:?}", self.period);

        let mut interval = time::interval(self.period);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.repository.flush().await {
                        error!("SnapshotScheduler: flush failed, shutting down: {}", e);
                        self.shutdown.trigger();
                        return;
                    }
                }
                _ = self.shutdown.wait() => {
                    info!("SnapshotScheduler stopped.");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RepositoryError;
    use crate::domain::repositories::RepositoryResult;
    use crate::domain::types::{MetricRecord, MetricSnapshot, MetricUpdate, MetricValue};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRepo {
        flushes: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MetricRepository for CountingRepo {
        async fn save(&self, _name: &str, _value: MetricValue) -> RepositoryResult<()> {
            Ok(())
        }
        async fn save_all(&self, _updates: &[MetricUpdate]) -> RepositoryResult<()> {
            Ok(())
        }
        async fn find_by_name(&self, name: &str) -> RepositoryResult<MetricRecord> {
            Err(RepositoryError::NotFound(name.to_string()))
        }
        async fn find_all(&self) -> RepositoryResult<MetricSnapshot> {
            Ok(MetricSnapshot::new())
        }
        async fn restore(&self) -> RepositoryResult<()> {
            Ok(())
        }
        async fn flush(&self) -> RepositoryResult<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RepositoryError::Io(std::io::Error::other("disk gone")));
            }
            Ok(())
        }
        async fn close(&self) -> RepositoryResult<()> {
            Ok(())
        }
        async fn ping(&self) -> RepositoryResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_flushes_periodically_until_shutdown() {
        let repo = Arc::new(CountingRepo {
            flushes: AtomicUsize::new(0),
            fail: false,
        });
        let shutdown = ShutdownSignal::new();
        let scheduler =
            SnapshotScheduler::new(repo.clone(), Duration::from_millis(10), shutdown.clone());

        let handle = tokio::spawn(scheduler.run());
        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler should stop on shutdown")
            .unwrap();
        assert!(repo.flushes.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_flush_failure_triggers_shutdown() {
        let repo = Arc::new(CountingRepo {
            flushes: AtomicUsize::new(0),
            fail: true,
        });
        let shutdown = ShutdownSignal::new();
        let scheduler =
            SnapshotScheduler::new(repo.clone(), Duration::from_millis(10), shutdown.clone());

        tokio::time::timeout(Duration::from_secs(1), scheduler.run())
            .await
            .expect("scheduler should exit after a failed flush");

        assert!(shutdown.is_triggered());
        assert_eq!(repo.flushes.load(Ordering::SeqCst), 1);
    }
}
