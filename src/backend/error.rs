/// Error types for backend operations

use thiserror::Error;

/// Backend (connection/statement) errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// Database reported an error for a statement
    #[error("Database error: {0}")]
    Database(String),

    /// Transaction-level failure
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization error building statement parameters
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("Backend error: {0}")]
    Other(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BackendError::Database("relation missing".to_string()).to_string(),
            "Database error: relation missing"
        );
        assert_eq!(
            BackendError::Transaction("commit refused".to_string()).to_string(),
            "Transaction error: commit refused"
        );
        assert_eq!(
            BackendError::Other("boom".to_string()).to_string(),
            "Backend error: boom"
        );
    }
}
