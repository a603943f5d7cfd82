use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Connection pool wrapper owning the metrics schema
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let in_memory = db_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database DSN: {}", db_url))?
            .create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal); // Better for concurrency
        }

        // An in-memory database lives and dies with its connection, so keep exactly one forever.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metrics (
                id TEXT NOT NULL,
                type TEXT NOT NULL,
                delta INTEGER NOT NULL DEFAULT 0,
                gauge REAL NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (id, type)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create metrics table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_metrics_id_updated
            ON metrics (id, updated_at);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create metrics index")?;

        info!("Database schema initialized.");
        Ok(())
    }
}
