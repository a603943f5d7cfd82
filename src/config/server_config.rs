//! Server configuration parsing from flags and environment variables.

use crate::config::parse_duration;
use crate::infrastructure::InMemoryConfig;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "server", version, about = "Metric collection server")]
pub struct ServerConfig {
    /// Bind address
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// Snapshot period; 0 writes the snapshot after every update
    #[arg(short = 'i', long, env = "STORE_INTERVAL", default_value = "300s", value_parser = parse_duration)]
    pub store_interval: Duration,

    /// Snapshot file; empty disables snapshots
    #[arg(short = 'f', long, env = "STORE_FILE", default_value = "/tmp/metricstore-db.json")]
    pub store_file: String,

    /// Load the snapshot file at startup
    #[arg(short = 'r', long, env = "RESTORE", default_value_t = true, action = ArgAction::Set)]
    pub restore: bool,

    /// Shared signing key; empty disables signatures
    #[arg(short = 'k', long, env = "KEY", default_value = "", hide_env_values = true)]
    pub key: String,

    /// Database DSN; when set, metrics are stored in SQLite instead of memory
    #[arg(short = 'd', long, env = "DATABASE_DSN", default_value = "")]
    pub database_dsn: String,
}

impl ServerConfig {
    pub fn write_through(&self) -> bool {
        self.store_interval.is_zero()
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        let path = self.store_file.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    pub fn uses_database(&self) -> bool {
        !self.database_dsn.trim().is_empty()
    }

    /// Periodic snapshots run only with a target and a non-zero period.
    pub fn snapshot_period(&self) -> Option<Duration> {
        (!self.write_through() && self.snapshot_path().is_some()).then_some(self.store_interval)
    }

    pub fn in_memory_config(&self) -> InMemoryConfig {
        InMemoryConfig {
            snapshot_path: self.snapshot_path(),
            restore: self.restore,
            write_through: self.write_through(),
        }
    }
}
