/// Backend abstraction for the graph-capable relational store
///
/// The loader never owns a socket or a pool; it talks to the store through
/// these traits:
/// - `GraphBackend`: statement execution and transaction acquisition
/// - `BackendTransaction`: statement execution within one transaction,
///   plus commit/rollback
///
/// Transactions are shared (`Arc<dyn BackendTransaction>`) because the
/// parallel-batch staging strategy issues bounded concurrent inserts
/// against the same transaction.

pub mod error;
pub mod mock;

use async_trait::async_trait;
pub use error::{BackendError, BackendResult};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Rows returned by one statement execution
///
/// Each row is a JSON object keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub rows: Vec<JsonValue>,
}

impl QueryResult {
    /// Result with no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result with the given rows
    pub fn with_rows(rows: Vec<JsonValue>) -> Self {
        Self { rows }
    }

    /// Number of rows returned
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Connection-level interface to the store
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Execute one statement outside any explicit transaction
    ///
    /// # Arguments
    /// * `sql` - The statement text
    /// * `params` - Positional parameters (`$1`, `$2`, ...)
    async fn execute(&self, sql: &str, params: Vec<JsonValue>) -> BackendResult<QueryResult>;

    /// Begin a transaction
    async fn begin_transaction(&self) -> BackendResult<Arc<dyn BackendTransaction>>;
}

/// One open transaction against the store
///
/// All staging, bridging and mutation statements for one load invocation
/// execute against a single transaction; it is the sole mutation boundary.
#[async_trait]
pub trait BackendTransaction: Send + Sync {
    /// Execute one statement within this transaction
    async fn execute(&self, sql: &str, params: Vec<JsonValue>) -> BackendResult<QueryResult>;

    /// Commit the transaction
    async fn commit(&self) -> BackendResult<()>;

    /// Roll back the transaction
    async fn rollback(&self) -> BackendResult<()>;
}

/// Shared backend handle
pub type SharedBackend = Arc<dyn GraphBackend>;

/// Shared transaction handle
pub type SharedTransaction = Arc<dyn BackendTransaction>;
