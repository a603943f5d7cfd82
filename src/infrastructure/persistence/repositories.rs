use crate::domain::errors::RepositoryError;
use crate::domain::repositories::{MetricRepository, RepositoryResult};
use crate::domain::types::{MetricKind, MetricRecord, MetricSnapshot, MetricUpdate, MetricValue};
use crate::infrastructure::persistence::database::Database;
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, Row, SqlitePool};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

// Counters add to the stored accumulator, gauges replace the float column.
const UPSERT_METRIC: &str = r#"
    INSERT INTO metrics (id, type, delta, gauge, updated_at)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT(id, type) DO UPDATE SET
        delta = metrics.delta + excluded.delta,
        gauge = excluded.gauge,
        updated_at = excluded.updated_at
"#;

/// SQL-backed metric repository.
///
/// Rows are keyed by `(id, type)`, so a name that changes kind gets a second
/// row; reads resolve a name to its most recently written row. Write stamps
/// are strictly increasing within the process, batch elements included, so
/// "most recent" is never a tie. Durability is left to the database, so
/// `restore` and `flush` do nothing.
pub struct SqliteMetricRepository {
    pool: Option<SqlitePool>,
    last_stamp: AtomicI64,
}

impl SqliteMetricRepository {
    pub fn new(database: Database) -> Self {
        Self {
            pool: Some(database.pool),
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Repository with no live connection; every operation reports
    /// `RepositoryError::NoConnection`.
    pub fn disconnected() -> Self {
        Self {
            pool: None,
            last_stamp: AtomicI64::new(0),
        }
    }

    fn pool(&self) -> RepositoryResult<&SqlitePool> {
        self.pool.as_ref().ok_or(RepositoryError::NoConnection)
    }

    /// Reserves `count` consecutive write stamps (microseconds, never behind
    /// the wall clock) and returns the first.
    fn reserve_stamps(&self, count: usize) -> i64 {
        let count = count.max(1) as i64;
        let now = Utc::now().timestamp_micros();
        let mut last = self.last_stamp.load(Ordering::Acquire);
        loop {
            let first = now.max(last + 1);
            match self.last_stamp.compare_exchange_weak(
                last,
                first + count - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return first,
                Err(current) => last = current,
            }
        }
    }

    fn upsert(
        name: &str,
        value: MetricValue,
        updated_at: i64,
    ) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
        sqlx::query(UPSERT_METRIC)
            .bind(name)
            .bind(value.kind().as_str())
            .bind(value.delta())
            .bind(value.gauge())
            .bind(updated_at)
    }

    fn map_row(row: &SqliteRow) -> RepositoryResult<MetricRecord> {
        let kind: String = row.try_get("type")?;
        let kind = kind
            .parse::<MetricKind>()
            .map_err(|e| RepositoryError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(MetricRecord {
            delta: row.try_get("delta")?,
            value: row.try_get("gauge")?,
            kind,
        })
    }
}

#[async_trait]
impl MetricRepository for SqliteMetricRepository {
    async fn save(&self, name: &str, value: MetricValue) -> RepositoryResult<()> {
        let pool = self.pool()?;

        Self::upsert(name, value, self.reserve_stamps(1))
            .execute(pool)
            .await?;

        debug!("Upserted metric {}", name);
        Ok(())
    }

    async fn save_all(&self, updates: &[MetricUpdate]) -> RepositoryResult<()> {
        let pool = self.pool()?;
        let first_stamp = self.reserve_stamps(updates.len());

        let mut tx = pool.begin().await?;

        // sqlx prepares UPSERT_METRIC once per connection and reuses it for every element
        for (update, updated_at) in updates.iter().zip(first_stamp..) {
            if let Err(cause) = Self::upsert(&update.name, update.value, updated_at)
                .execute(&mut *tx)
                .await
            {
                warn!("Batch upsert failed on {}: {}", update.name, cause);
                return Err(match tx.rollback().await {
                    Ok(()) => RepositoryError::Database(cause),
                    Err(rollback) => RepositoryError::Rollback { cause, rollback },
                });
            }
        }

        tx.commit().await?;

        debug!("Upserted batch of {} metrics", updates.len());
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> RepositoryResult<MetricRecord> {
        let pool = self.pool()?;

        let row = sqlx::query(
            "SELECT type, delta, gauge FROM metrics WHERE id = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;

        Self::map_row(&row)
    }

    async fn find_all(&self) -> RepositoryResult<MetricSnapshot> {
        let pool = self.pool()?;

        // Later rows overwrite earlier ones, so the latest kind wins per name.
        let mut rows =
            sqlx::query("SELECT id, type, delta, gauge FROM metrics ORDER BY updated_at ASC")
                .fetch(pool);

        let mut metrics = MetricSnapshot::new();
        while let Some(row) = rows.try_next().await? {
            let name: String = row.try_get("id")?;
            metrics.insert(name, Self::map_row(&row)?);
        }

        Ok(metrics)
    }

    async fn restore(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn flush(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn close(&self) -> RepositoryResult<()> {
        self.pool()?.close().await;
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        let mut conn = self.pool()?.acquire().await?;
        conn.ping().await?;
        Ok(())
    }
}
