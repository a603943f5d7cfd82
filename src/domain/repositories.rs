//! Repository Pattern Abstractions
//!
//! This module defines the metric repository trait shared by every storage
//! backend, keeping request handling independent of where metrics live.
//!
//! # Implementations
//!
//! - `InMemoryMetricRepository`: `Arc<RwLock>` map with optional JSON
//!   snapshot persistence.
//! - `SqliteMetricRepository`: transactional upserts through `sqlx`.
//!
//! The concrete backend is chosen once at startup and shared as
//! `Arc<dyn MetricRepository>`.
//!
//! # Upsert semantics
//!
//! Every write follows the accumulation law: a counter update adds to the
//! stored magnitude, a gauge update replaces it, and the stored kind tag is
//! overwritten by the update's kind.
//!
//! # Example
//!
//! ```rust,no_run
//! use metricstore::domain::repositories::MetricRepository;
//! use metricstore::domain::types::MetricValue;
//! use metricstore::infrastructure::InMemoryMetricRepository;
//!
//! # async {
//! let repo = InMemoryMetricRepository::new();
//! repo.save("PollCount", MetricValue::Counter(1)).await?;
//! let stored = repo.find_by_name("PollCount").await?;
//! # Ok::<(), metricstore::domain::errors::RepositoryError>(())
//! # };
//! ```

use crate::domain::errors::RepositoryError;
use crate::domain::types::{MetricRecord, MetricSnapshot, MetricUpdate, MetricValue};
use async_trait::async_trait;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage contract for named metrics
#[async_trait]
pub trait MetricRepository: Send + Sync {
    /// Upsert a single metric
    async fn save(&self, name: &str, value: MetricValue) -> RepositoryResult<()>;

    /// Upsert a batch as one atomic unit; no element is applied if any fails
    async fn save_all(&self, updates: &[MetricUpdate]) -> RepositoryResult<()>;

    /// Current state of a metric, or `RepositoryError::NotFound`
    async fn find_by_name(&self, name: &str) -> RepositoryResult<MetricRecord>;

    /// Isolated copy of the full state
    async fn find_all(&self) -> RepositoryResult<MetricSnapshot>;

    /// Load initial state from the persistence target (no-op when unsupported)
    async fn restore(&self) -> RepositoryResult<()>;

    /// Write the current state to the persistence target (no-op when unsupported)
    async fn flush(&self) -> RepositoryResult<()>;

    /// Release backend resources
    async fn close(&self) -> RepositoryResult<()>;

    /// Liveness probe
    async fn ping(&self) -> RepositoryResult<()>;
}
