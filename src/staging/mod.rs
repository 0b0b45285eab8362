/// Staging store
///
/// A transaction-scoped relation holding one row per input record: a type
/// discriminator plus the normalized property payload, and endpoint ids
/// for edges. Populated by one of four strategies and dropped (best
/// effort) when the pipeline finishes, success or failure.

use crate::backend::{BackendError, SharedTransaction};
use crate::error::LoadError;
use crate::types::EntityKind;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinSet;
use tracing::debug;

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Collision-resistant token naming the staging relation and bridge handle
/// of one invocation.
///
/// Combines process id, a process-wide counter and a random suffix, so
/// concurrent invocations in one process (or across processes sharing a
/// namespace) never collide.
pub fn unique_token() -> String {
    let counter = TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed);
    let salt: u32 = rand::random();
    format!("{}_{}_{:08x}", std::process::id(), counter, salt)
}

/// How staging rows are inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingStrategy {
    /// One parameterized insert per record, in input order
    Sequential,
    /// One multi-row insert per batch
    Bulk,
    /// Records consumed and flushed in fixed-size chunks; selected
    /// automatically when the input exceeds the streaming threshold
    Streaming,
    /// Batches inserted concurrently, bounded by the parallelism cap.
    /// Order is preserved within a batch, not across batches.
    ParallelBatch,
}

/// One normalized row awaiting staging
#[derive(Debug, Clone)]
pub struct StagedRow {
    /// Position within the input sequence for this kind
    pub seq: usize,
    /// Type discriminator (vertex or edge label)
    pub label: String,
    /// `(from, to)` endpoint ids; present only for edges
    pub endpoints: Option<(String, String)>,
    /// Normalized property payload
    pub properties: JsonValue,
}

/// Handle to one invocation's staging relation
#[derive(Debug, Clone)]
pub struct StagingTable {
    namespace: String,
    name: String,
    kind: EntityKind,
}

impl StagingTable {
    /// Derive the staging table for one invocation token
    pub fn new(namespace: &str, kind: EntityKind, token: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: format!("{}_staging_{}", kind.name(), token),
            kind,
        }
    }

    /// Unqualified table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace the table lives in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", self.namespace, self.name)
    }

    /// Create the relation if absent
    pub async fn create(&self, tx: &SharedTransaction) -> Result<(), LoadError> {
        let columns = match self.kind {
            EntityKind::Vertex => {
                "seq BIGINT NOT NULL,\n    vtype TEXT NOT NULL,\n    properties JSONB NOT NULL"
            }
            EntityKind::Edge => {
                "seq BIGINT NOT NULL,\n    etype TEXT NOT NULL,\n    from_id TEXT NOT NULL,\n    to_id TEXT NOT NULL,\n    properties JSONB NOT NULL"
            }
        };
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.qualified(),
            columns
        );
        debug!(table = %self.name, "creating staging table");
        tx.execute(&sql, Vec::new()).await.map_err(|source| LoadError::Staging {
            context: format!("creating staging table {}", self.name),
            source,
        })?;
        Ok(())
    }

    /// Drop the relation. Best effort: failures surface as `Cleanup`
    /// errors for the caller to downgrade to warnings.
    pub async fn drop(&self, tx: &SharedTransaction) -> Result<(), LoadError> {
        let sql = format!("DROP TABLE IF EXISTS {}", self.qualified());
        tx.execute(&sql, Vec::new())
            .await
            .map_err(|e| LoadError::Cleanup(format!("dropping staging table {}: {}", self.name, e)))?;
        Ok(())
    }

    /// Insert rows using the selected strategy.
    ///
    /// `on_progress` is called with the cumulative number of rows inserted
    /// so far within this call.
    pub async fn insert(
        &self,
        tx: &SharedTransaction,
        rows: Vec<StagedRow>,
        strategy: StagingStrategy,
        batch_size: usize,
        max_parallel: usize,
        on_progress: &(dyn Fn(usize) + Sync),
    ) -> Result<usize, LoadError> {
        if rows.is_empty() {
            return Ok(0);
        }
        match strategy {
            StagingStrategy::Sequential => self.insert_sequential(tx, &rows, on_progress).await,
            StagingStrategy::Bulk => {
                self.insert_bulk(tx, &rows, batch_size, on_progress).await
            }
            StagingStrategy::Streaming => {
                self.insert_streaming(tx, rows.into_iter(), batch_size, on_progress)
                    .await
            }
            StagingStrategy::ParallelBatch => {
                self.insert_parallel(tx, rows, batch_size, max_parallel, on_progress)
                    .await
            }
        }
    }

    async fn insert_sequential(
        &self,
        tx: &SharedTransaction,
        rows: &[StagedRow],
        on_progress: &(dyn Fn(usize) + Sync),
    ) -> Result<usize, LoadError> {
        let sql = self.insert_statement(1);
        let mut inserted = 0;
        for row in rows {
            tx.execute(&sql, self.row_params(row))
                .await
                .map_err(|source| self.insert_error(source))?;
            inserted += 1;
            on_progress(inserted);
        }
        Ok(inserted)
    }

    async fn insert_bulk(
        &self,
        tx: &SharedTransaction,
        rows: &[StagedRow],
        batch_size: usize,
        on_progress: &(dyn Fn(usize) + Sync),
    ) -> Result<usize, LoadError> {
        let mut inserted = 0;
        for batch in rows.chunks(batch_size) {
            let sql = self.insert_statement(batch.len());
            let params = batch.iter().flat_map(|r| self.row_params(r)).collect();
            tx.execute(&sql, params)
                .await
                .map_err(|source| self.insert_error(source))?;
            inserted += batch.len();
            on_progress(inserted);
        }
        Ok(inserted)
    }

    async fn insert_streaming<I>(
        &self,
        tx: &SharedTransaction,
        rows: I,
        chunk_size: usize,
        on_progress: &(dyn Fn(usize) + Sync),
    ) -> Result<usize, LoadError>
    where
        I: Iterator<Item = StagedRow>,
    {
        let mut inserted = 0;
        let mut chunk: Vec<StagedRow> = Vec::with_capacity(chunk_size);
        for row in rows {
            chunk.push(row);
            if chunk.len() >= chunk_size {
                inserted += self.flush_chunk(tx, &chunk).await?;
                on_progress(inserted);
                chunk.clear();
            }
        }
        if !chunk.is_empty() {
            inserted += self.flush_chunk(tx, &chunk).await?;
            on_progress(inserted);
        }
        Ok(inserted)
    }

    async fn insert_parallel(
        &self,
        tx: &SharedTransaction,
        rows: Vec<StagedRow>,
        batch_size: usize,
        max_parallel: usize,
        on_progress: &(dyn Fn(usize) + Sync),
    ) -> Result<usize, LoadError> {
        // Rows carry preassigned sequence numbers, so insertion order
        // across batches does not affect the bridged payload order.
        let batches: Vec<Vec<StagedRow>> = rows
            .chunks(batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        let mut inserted = 0;
        for wave in batches.chunks(max_parallel.max(1)) {
            let mut tasks: JoinSet<Result<usize, BackendError>> = JoinSet::new();
            for batch in wave {
                let sql = self.insert_statement(batch.len());
                let params: Vec<JsonValue> =
                    batch.iter().flat_map(|r| self.row_params(r)).collect();
                let count = batch.len();
                let tx = tx.clone();
                tasks.spawn(async move {
                    tx.execute(&sql, params).await?;
                    Ok(count)
                });
            }
            while let Some(joined) = tasks.join_next().await {
                let count = joined
                    .map_err(|e| self.insert_error(BackendError::Other(e.to_string())))?
                    .map_err(|source| self.insert_error(source))?;
                inserted += count;
                on_progress(inserted);
            }
        }
        Ok(inserted)
    }

    async fn flush_chunk(
        &self,
        tx: &SharedTransaction,
        chunk: &[StagedRow],
    ) -> Result<usize, LoadError> {
        let sql = self.insert_statement(chunk.len());
        let params = chunk.iter().flat_map(|r| self.row_params(r)).collect();
        tx.execute(&sql, params)
            .await
            .map_err(|source| self.insert_error(source))?;
        Ok(chunk.len())
    }

    /// Multi-row parameterized insert statement for `row_count` rows
    fn insert_statement(&self, row_count: usize) -> String {
        let (columns, arity) = match self.kind {
            EntityKind::Vertex => ("seq, vtype, properties", 3),
            EntityKind::Edge => ("seq, etype, from_id, to_id, properties", 5),
        };
        let mut placeholders = Vec::with_capacity(row_count);
        for row in 0..row_count {
            let slots: Vec<String> = (0..arity)
                .map(|i| format!("${}", row * arity + i + 1))
                .collect();
            placeholders.push(format!("({})", slots.join(", ")));
        }
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.qualified(),
            columns,
            placeholders.join(", ")
        )
    }

    fn row_params(&self, row: &StagedRow) -> Vec<JsonValue> {
        let mut params = vec![
            JsonValue::from(row.seq as u64),
            JsonValue::String(row.label.clone()),
        ];
        if let Some((from, to)) = &row.endpoints {
            params.push(JsonValue::String(from.clone()));
            params.push(JsonValue::String(to.clone()));
        }
        params.push(row.properties.clone());
        params
    }

    fn insert_error(&self, source: BackendError) -> LoadError {
        LoadError::Staging {
            context: format!("inserting into staging table {}", self.name),
            source,
        }
    }
}
