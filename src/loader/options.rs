/// Loader configuration
///
/// One explicit options struct with documented defaults, validated once up
/// front rather than merged ad hoc at each call site.

use crate::backend::SharedTransaction;
use crate::cypher::is_valid_identifier;
use crate::error::LoadError;
use crate::staging::StagingStrategy;
use crate::types::ProgressSink;

/// Options for one load invocation
#[derive(Clone)]
pub struct LoadOptions {
    /// Caller-supplied transaction. When present, the loader never commits
    /// or rolls it back; that responsibility stays with the caller.
    pub transaction: Option<SharedTransaction>,
    /// Target graph name. Default: `"graph"`.
    pub graph_name: String,
    /// Namespace for staging relations and bridge functions.
    /// Default: `"public"`.
    pub staging_namespace: String,
    /// Rows per insert batch. Default: 1000.
    pub batch_size: usize,
    /// Bound on concurrent batch inserts in the parallel-batch strategy.
    /// Default: `min(num_cpus, 4)`.
    pub max_parallel_batches: usize,
    /// Input size above which sequential/bulk staging switches to
    /// streaming automatically. Default: 10,000.
    pub streaming_threshold: usize,
    /// Staging population strategy. Default: `Bulk`.
    pub strategy: StagingStrategy,
    /// Whether records are validated against the schema before staging.
    /// Default: true.
    pub validate: bool,
    /// Progress sink; events arrive on the unified 0-100 scale.
    pub on_progress: Option<ProgressSink>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            transaction: None,
            graph_name: "graph".to_string(),
            staging_namespace: "public".to_string(),
            batch_size: 1000,
            max_parallel_batches: num_cpus::get().min(4).max(1),
            streaming_threshold: 10_000,
            strategy: StagingStrategy::Bulk,
            validate: true,
            on_progress: None,
        }
    }
}

impl std::fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("transaction", &self.transaction.is_some())
            .field("graph_name", &self.graph_name)
            .field("staging_namespace", &self.staging_namespace)
            .field("batch_size", &self.batch_size)
            .field("max_parallel_batches", &self.max_parallel_batches)
            .field("streaming_threshold", &self.streaming_threshold)
            .field("strategy", &self.strategy)
            .field("validate", &self.validate)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl LoadOptions {
    /// Check the options once at the start of an invocation
    pub fn validated(self) -> Result<Self, LoadError> {
        if self.batch_size == 0 {
            return Err(LoadError::InvalidOptions(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.max_parallel_batches == 0 {
            return Err(LoadError::InvalidOptions(
                "max_parallel_batches must be greater than zero".to_string(),
            ));
        }
        if !is_valid_identifier(&self.graph_name) {
            return Err(LoadError::InvalidOptions(format!(
                "graph name '{}' is not a valid identifier",
                self.graph_name
            )));
        }
        if !is_valid_identifier(&self.staging_namespace) {
            return Err(LoadError::InvalidOptions(format!(
                "staging namespace '{}' is not a valid identifier",
                self.staging_namespace
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoadOptions::default();
        assert_eq!(options.batch_size, 1000);
        assert_eq!(options.graph_name, "graph");
        assert_eq!(options.staging_namespace, "public");
        assert!(options.validate);
        assert!(options.max_parallel_batches >= 1);
        assert!(options.validated().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let options = LoadOptions {
            batch_size: 0,
            ..LoadOptions::default()
        };
        assert!(matches!(
            options.validated(),
            Err(LoadError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_invalid_namespace_rejected() {
        let options = LoadOptions {
            staging_namespace: "pub lic; --".to_string(),
            ..LoadOptions::default()
        };
        assert!(options.validated().is_err());
    }
}
