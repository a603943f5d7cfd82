pub mod http_client_factory;
pub mod persistence;
pub mod repositories;
pub mod snapshot_file;

pub use persistence::{Database, SqliteMetricRepository};
pub use repositories::{InMemoryConfig, InMemoryMetricRepository};
pub use snapshot_file::SnapshotFile;
