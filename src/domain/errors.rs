use thiserror::Error;

/// Errors raised while decoding, validating or authenticating wire metrics.
///
/// None of these variants ever reach storage: a request that fails here has
/// no side effects.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed request body: {0}")]
    Malformed(String),

    #[error("metric name is empty")]
    EmptyId,

    #[error("unknown data type: {0}")]
    UnsupportedKind(String),

    #[error("missing data value for {id}")]
    MissingValue { id: String },

    #[error("incorrect value: {0}")]
    InvalidNumber(String),

    #[error("unknown or bad hash value for {id}")]
    BadSignature { id: String },
}

impl ProtocolError {
    /// Authentication failures are distinct from structural validation failures.
    pub fn is_authentication(&self) -> bool {
        matches!(self, ProtocolError::BadSignature { .. })
    }
}

/// Errors reported by repository backends
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("metric {0:?} not found")]
    NotFound(String),

    #[error("no database connection")]
    NoConnection,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("save all: tx err {cause}: roll back err {rollback}")]
    Rollback {
        cause: sqlx::Error,
        rollback: sqlx::Error,
    },

    #[error("snapshot file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_connection_message() {
        assert_eq!(
            RepositoryError::NoConnection.to_string(),
            "no database connection"
        );
    }

    #[test]
    fn test_not_found_names_the_metric() {
        let msg = RepositoryError::NotFound("Alloc".to_string()).to_string();
        assert!(msg.contains("\"Alloc\""));
    }

    #[test]
    fn test_rollback_error_carries_both_causes() {
        let error = RepositoryError::Rollback {
            cause: sqlx::Error::RowNotFound,
            rollback: sqlx::Error::PoolClosed,
        };

        let msg = error.to_string();
        assert!(msg.contains("tx err"));
        assert!(msg.contains("roll back err"));
    }

    #[test]
    fn test_only_bad_signature_is_authentication() {
        assert!(ProtocolError::BadSignature { id: "a".into() }.is_authentication());
        assert!(!ProtocolError::EmptyId.is_authentication());
        assert!(!ProtocolError::UnsupportedKind("x".into()).is_authentication());
    }
}
