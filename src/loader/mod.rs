/// Load orchestrator
///
/// Sequences vertex loading before edge loading, owns the transaction
/// lifecycle (or defers to a caller-supplied transaction), aggregates
/// per-kind outcomes into one `LoadResult`, and republishes progress on a
/// unified 0-100% scale.

pub mod file;
pub mod options;

use crate::backend::{SharedBackend, SharedTransaction};
use crate::error::LoadError;
use crate::pipeline::{IngestionPipeline, KindOutcome, PipelineConfig};
use crate::schema::SchemaProvider;
use crate::types::progress::scaled_sink;
use crate::types::{EntityKind, GraphData, LoadResult, ProgressReporter, TypeMap};
pub use options::LoadOptions;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Client-side engine that bulk-loads typed graph data into the store
pub struct GraphLoader {
    backend: SharedBackend,
    schema: Arc<dyn SchemaProvider>,
}

impl GraphLoader {
    pub fn new(backend: SharedBackend, schema: Arc<dyn SchemaProvider>) -> Self {
        Self { backend, schema }
    }

    /// Load a full payload: all vertices first, then all edges.
    ///
    /// Always returns a `LoadResult`; failures are reported in it rather
    /// than propagated. Use `try_load_graph_data` for exception-style
    /// control flow.
    pub async fn load_graph_data(&self, data: GraphData, options: LoadOptions) -> LoadResult {
        let started = Instant::now();
        let options = match options.validated() {
            Ok(options) => options,
            Err(err) => return failed_result(vec![err.to_string()], started),
        };

        if data.is_empty() {
            return LoadResult::empty();
        }

        let caller_owns_tx = options.transaction.is_some();
        let tx = match self.obtain_transaction(&options).await {
            Ok(tx) => tx,
            Err(err) => return failed_result(vec![err.to_string()], started),
        };

        let has_vertices = data.vertex_record_count() > 0;
        let has_edges = data.edge_record_count() > 0;

        // When both kinds are present, vertex progress is compressed into
        // 0-50 and edge progress into 50-100 of the unified scale
        let (vertex_range, edge_range) = if has_vertices && has_edges {
            ((0u8, 50u8), (50u8, 50u8))
        } else {
            ((0u8, 100u8), (0u8, 100u8))
        };

        let mut vertex_outcome = KindOutcome {
            success: true,
            ..KindOutcome::default()
        };
        if has_vertices {
            vertex_outcome = self
                .run_kind(
                    &tx,
                    &options,
                    EntityKind::Vertex,
                    &data.vertices,
                    vertex_range,
                    started,
                )
                .await;
        }

        // Edge endpoint verification depends on vertices already existing,
        // so a failed vertex kind aborts the invocation
        let mut edge_outcome = KindOutcome {
            success: true,
            ..KindOutcome::default()
        };
        if has_edges && vertex_outcome.success {
            edge_outcome = self
                .run_kind(
                    &tx,
                    &options,
                    EntityKind::Edge,
                    &data.edges,
                    edge_range,
                    started,
                )
                .await;
        }

        let mut success = vertex_outcome.success && edge_outcome.success;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        errors.extend(vertex_outcome.errors.clone());
        errors.extend(edge_outcome.errors.clone());
        warnings.extend(vertex_outcome.warnings.clone());
        warnings.extend(edge_outcome.warnings.clone());

        if !caller_owns_tx {
            success = self
                .finish_transaction(&tx, success, &mut errors, &mut warnings)
                .await;
        }

        // A failing kind always reports zero (no partial creation is
        // permitted); a kind that completed before the failure keeps its
        // count as the progress achieved before rollback
        let (vertex_count, edge_count) = (vertex_outcome.count, edge_outcome.count);

        if success {
            info!(
                vertices = vertex_outcome.count,
                edges = edge_outcome.count,
                "bulk load succeeded"
            );
        } else {
            warn!(errors = errors.len(), "bulk load failed");
        }

        LoadResult::from_parts(
            success,
            vertex_count,
            edge_count,
            vertex_outcome.types,
            edge_outcome.types,
            errors,
            warnings,
            elapsed_ms(started),
        )
    }

    /// Throwing adapter over `load_graph_data`
    pub async fn try_load_graph_data(
        &self,
        data: GraphData,
        options: LoadOptions,
    ) -> Result<LoadResult, LoadError> {
        let result = self.load_graph_data(data, options).await;
        if result.success {
            Ok(result)
        } else {
            Err(LoadError::Failed {
                errors: result.errors().to_vec(),
            })
        }
    }

    /// Load only vertices
    pub async fn load_vertices(&self, vertices: TypeMap, options: LoadOptions) -> LoadResult {
        self.load_graph_data(GraphData::with_vertices(vertices), options)
            .await
    }

    /// Load only edges (their endpoint vertices must already exist)
    pub async fn load_edges(&self, edges: TypeMap, options: LoadOptions) -> LoadResult {
        self.load_graph_data(GraphData::with_edges(edges), options)
            .await
    }

    async fn obtain_transaction(
        &self,
        options: &LoadOptions,
    ) -> Result<SharedTransaction, LoadError> {
        match &options.transaction {
            Some(tx) => Ok(tx.clone()),
            None => self
                .backend
                .begin_transaction()
                .await
                .map_err(|source| LoadError::Transaction {
                    action: "begin",
                    source,
                }),
        }
    }

    async fn run_kind(
        &self,
        tx: &SharedTransaction,
        options: &LoadOptions,
        kind: EntityKind,
        data: &TypeMap,
        range: (u8, u8),
        started: Instant,
    ) -> KindOutcome {
        let sink = options
            .on_progress
            .clone()
            .map(|sink| scaled_sink(sink, range.0, range.1));
        let reporter = ProgressReporter::new(sink, kind, started);
        let pipeline = IngestionPipeline::new(
            tx.clone(),
            self.schema.clone(),
            PipelineConfig {
                graph_name: options.graph_name.clone(),
                staging_namespace: options.staging_namespace.clone(),
                batch_size: options.batch_size,
                max_parallel_batches: options.max_parallel_batches,
                streaming_threshold: options.streaming_threshold,
                strategy: options.strategy,
                validate: options.validate,
            },
            reporter,
        );
        debug!(kind = %kind, types = data.len(), "running kind pipeline");
        pipeline.run(kind, data).await
    }

    /// Commit on success, roll back on failure. Only called for an owned
    /// transaction; a caller-supplied transaction stays with the caller.
    /// Returns the final success flag.
    async fn finish_transaction(
        &self,
        tx: &SharedTransaction,
        success: bool,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> bool {
        if success {
            match tx.commit().await {
                Ok(()) => true,
                Err(commit_err) => {
                    errors.push(
                        LoadError::Transaction {
                            action: "commit",
                            source: commit_err,
                        }
                        .to_string(),
                    );
                    // A secondary rollback failure is appended as a
                    // warning, never replacing the primary error
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(%rollback_err, "rollback after failed commit also failed");
                        warnings.push(format!(
                            "rollback after failed commit also failed: {}",
                            rollback_err
                        ));
                    }
                    false
                }
            }
        } else {
            if let Err(source) = tx.rollback().await {
                errors.push(
                    LoadError::Transaction {
                        action: "rollback",
                        source,
                    }
                    .to_string(),
                );
            }
            false
        }
    }
}

fn failed_result(errors: Vec<String>, started: Instant) -> LoadResult {
    LoadResult::from_parts(
        false,
        0,
        0,
        Vec::new(),
        Vec::new(),
        errors,
        Vec::new(),
        elapsed_ms(started),
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
