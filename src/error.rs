/// Error types for the bulk loading engine

use crate::backend::BackendError;
use crate::types::EntityKind;
use thiserror::Error;

/// Errors raised by the loading pipeline and orchestrator
#[derive(Error, Debug)]
pub enum LoadError {
    /// A record failed schema validation before any write occurred
    #[error("Validation failed for {kind} type '{label}': {message}")]
    Validation {
        kind: EntityKind,
        label: String,
        message: String,
    },

    /// A staging-table create or insert failed
    #[error("Staging failed ({context}): {source}")]
    Staging {
        context: String,
        #[source]
        source: BackendError,
    },

    /// Bridge creation or graph mutation failed
    #[error("Mutation failed ({context}): {source}")]
    Mutation {
        context: String,
        #[source]
        source: BackendError,
    },

    /// A staged edge references a vertex that does not exist in the store
    #[error("Edge '{etype}' from '{from}' to '{to}': missing {missing} vertex")]
    EndpointMissing {
        etype: String,
        from: String,
        to: String,
        /// Which endpoint failed to resolve ("from", "to" or "from and to")
        missing: String,
    },

    /// Summary of an endpoint integrity check that found failing rows
    #[error("Endpoint check failed: {failing} of {total} staged edges reference missing vertices")]
    EndpointCheck { failing: usize, total: usize },

    /// Commit or rollback itself failed
    #[error("Transaction {action} failed: {source}")]
    Transaction {
        action: &'static str,
        #[source]
        source: BackendError,
    },

    /// A staging relation or bridge handle could not be dropped.
    /// Always downgraded to a warning by the pipeline.
    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    /// Invalid loader configuration
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// IO error reading a payload file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error in a payload file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parse error in a payload file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A result-returning load reported failure (used by the throwing adapters)
    #[error("Load failed with {} error(s): {}", errors.len(), errors.join("; "))]
    Failed { errors: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_missing_display() {
        let err = LoadError::EndpointMissing {
            etype: "WORKS_AT".to_string(),
            from: "1".to_string(),
            to: "3".to_string(),
            missing: "to".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("WORKS_AT"));
        assert!(msg.contains("'3'"));
        assert!(msg.contains("missing to vertex"));
    }

    #[test]
    fn test_failed_display_joins_errors() {
        let err = LoadError::Failed {
            errors: vec!["first".to_string(), "second".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("first; second"));
    }
}
