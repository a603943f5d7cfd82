use crate::domain::errors::RepositoryError;
use crate::domain::types::MetricSnapshot;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// JSON snapshot file: an object mapping metric name to `{delta, value, type}`.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    file_path: PathBuf,
}

impl SnapshotFile {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Reads the whole snapshot. A missing file is reported as an I/O error.
    pub async fn load(&self) -> Result<MetricSnapshot, RepositoryError> {
        let content = fs::read(&self.file_path).await?;
        let snapshot: MetricSnapshot = serde_json::from_slice(&content)?;

        debug!(
            "Loaded {} metrics from {:?}",
            snapshot.len(),
            self.file_path
        );
        Ok(snapshot)
    }

    /// Replaces the file with `snapshot`.
    pub async fn save(&self, snapshot: &MetricSnapshot) -> Result<(), RepositoryError> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec(snapshot)?;

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.file_path).await?;

        debug!("Saved {} metrics to {:?}", snapshot.len(), self.file_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{MetricRecord, MetricValue};

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("metrics.json"));

        let mut snapshot = MetricSnapshot::new();
        snapshot.insert("Alloc".into(), MetricRecord::new(MetricValue::Gauge(12.5)));
        snapshot.insert("PollCount".into(), MetricRecord::new(MetricValue::Counter(3)));

        file.save(&snapshot).await.unwrap();
        assert_eq!(file.load().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("metrics.json"));

        let mut snapshot = MetricSnapshot::new();
        snapshot.insert("PollCount".into(), MetricRecord::new(MetricValue::Counter(3)));
        file.save(&snapshot).await.unwrap();

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(raw, r#"{"PollCount":{"delta":3,"type":"counter"}}"#);
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested/deeper/metrics.json"));

        file.save(&MetricSnapshot::new()).await.unwrap();
        assert!(file.path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("absent.json"));

        assert!(matches!(file.load().await, Err(RepositoryError::Io(_))));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        std::fs::write(&path, "{not json").unwrap();

        let file = SnapshotFile::new(path);
        assert!(matches!(
            file.load().await,
            Err(RepositoryError::Serialization(_))
        ));
    }
}
