//! In-Memory Metric Repository
//!
//! Thread-safe implementation of `MetricRepository` backed by a single
//! `Arc<RwLock>` map.
//!
//! # Locking
//!
//! - Writers hold the exclusive lock only while the map is mutated. A batch
//!   is applied inside one critical section, so readers never see half of it.
//! - Readers take the shared lock and copy what they return.
//! - Snapshot writes happen after the write lock is released.
//!
//! # Persistence
//!
//! With a snapshot path configured, `flush` writes the whole map to a JSON
//! file and `restore` loads it back at startup. In write-through mode every
//! successful write is followed by a flush. A failed flush is reported to
//! the caller but the in-memory mutation stays applied: memory and file may
//! then disagree until the next successful flush.

use crate::domain::errors::RepositoryError;
use crate::domain::repositories::{MetricRepository, RepositoryResult};
use crate::domain::types::{MetricRecord, MetricSnapshot, MetricUpdate, MetricValue};
use crate::infrastructure::snapshot_file::SnapshotFile;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Persistence options for the in-memory repository
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfig {
    pub snapshot_path: Option<PathBuf>,
    pub restore: bool,
    pub write_through: bool,
}

pub struct InMemoryMetricRepository {
    metrics: Arc<RwLock<MetricSnapshot>>,
    snapshot: Option<SnapshotFile>,
    restore_on_start: bool,
    write_through: bool,
    // serialises snapshot writers so an older copy never replaces a newer one
    flush_lock: Mutex<()>,
}

impl InMemoryMetricRepository {
    /// Repository without a persistence target
    pub fn new() -> Self {
        Self::with_config(InMemoryConfig::default())
    }

    pub fn with_config(config: InMemoryConfig) -> Self {
        Self {
            metrics: Arc::new(RwLock::new(MetricSnapshot::new())),
            snapshot: config.snapshot_path.map(SnapshotFile::new),
            restore_on_start: config.restore,
            write_through: config.write_through,
            flush_lock: Mutex::new(()),
        }
    }

    fn upsert(metrics: &mut MetricSnapshot, name: &str, value: MetricValue) {
        match metrics.get_mut(name) {
            Some(record) => record.apply(value),
            None => {
                metrics.insert(name.to_string(), MetricRecord::new(value));
            }
        }
    }

    async fn flush_if_write_through(&self) -> RepositoryResult<()> {
        if self.write_through {
            self.flush().await?;
        }
        Ok(())
    }
}

impl Default for InMemoryMetricRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricRepository for InMemoryMetricRepository {
    async fn save(&self, name: &str, value: MetricValue) -> RepositoryResult<()> {
        {
            let mut metrics = self.metrics.write().await;
            Self::upsert(&mut metrics, name, value);
        }
        self.flush_if_write_through().await
    }

    async fn save_all(&self, updates: &[MetricUpdate]) -> RepositoryResult<()> {
        {
            let mut metrics = self.metrics.write().await;
            for update in updates {
                Self::upsert(&mut metrics, &update.name, update.value);
            }
        }
        self.flush_if_write_through().await
    }

    async fn find_by_name(&self, name: &str) -> RepositoryResult<MetricRecord> {
        let metrics = self.metrics.read().await;
        metrics
            .get(name)
            .copied()
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))
    }

    async fn find_all(&self) -> RepositoryResult<MetricSnapshot> {
        Ok(self.metrics.read().await.clone())
    }

    async fn restore(&self) -> RepositoryResult<()> {
        let Some(file) = self.snapshot.as_ref().filter(|_| self.restore_on_start) else {
            return Ok(());
        };

        let restored = file.load().await?;
        let count = restored.len();
        self.metrics.write().await.extend(restored);

        info!("Restored {} metrics from {:?}", count, file.path());
        Ok(())
    }

    async fn flush(&self) -> RepositoryResult<()> {
        let Some(file) = self.snapshot.as_ref() else {
            debug!("No snapshot path configured, skipping flush");
            return Ok(());
        };

        let _guard = self.flush_lock.lock().await;
        let snapshot = self.metrics.read().await.clone();
        file.save(&snapshot).await
    }

    async fn close(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
