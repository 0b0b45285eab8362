/// Batch ingestion pipeline
///
/// Drives one entity kind (vertex or edge) through:
/// `Validating -> Staging -> Bridging (edges) -> Mutating -> CleaningUp`.
///
/// No partial creation is permitted: a kind either creates every staged
/// record or none. Cleanup of the staging relation and bridge handle runs
/// on every exit path after the first write, on a best-effort basis.

use crate::backend::SharedTransaction;
use crate::bridge::BridgeHandle;
use crate::cypher;
use crate::error::LoadError;
use crate::schema::SchemaProvider;
use crate::staging::{unique_token, StagedRow, StagingStrategy, StagingTable};
use crate::types::graph_data::{endpoint_id, TypeMap};
use crate::types::{EntityKind, LoadPhase, ProgressReporter};
use crate::validation::{filter_properties, validate_edge, validate_vertex};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pipeline tunables, resolved once by the orchestrator
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub graph_name: String,
    pub staging_namespace: String,
    pub batch_size: usize,
    pub max_parallel_batches: usize,
    pub streaming_threshold: usize,
    pub strategy: StagingStrategy,
    pub validate: bool,
}

/// Outcome of one kind's pipeline run
#[derive(Debug, Clone, Default)]
pub struct KindOutcome {
    pub success: bool,
    pub count: usize,
    pub types: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl KindOutcome {
    fn succeeded(count: usize, types: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            count,
            types,
            errors: Vec::new(),
            warnings,
        }
    }

    fn failed(types: Vec<String>, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            count: 0,
            types,
            errors,
            warnings,
        }
    }
}

/// Runs the ingestion pipeline for one kind within one transaction
pub struct IngestionPipeline {
    tx: SharedTransaction,
    schema: Arc<dyn SchemaProvider>,
    config: PipelineConfig,
    reporter: ProgressReporter,
}

impl IngestionPipeline {
    pub fn new(
        tx: SharedTransaction,
        schema: Arc<dyn SchemaProvider>,
        config: PipelineConfig,
        reporter: ProgressReporter,
    ) -> Self {
        Self {
            tx,
            schema,
            config,
            reporter,
        }
    }

    /// Run the full pipeline for one kind.
    ///
    /// Never returns an error: failures are folded into the outcome so the
    /// orchestrator can aggregate them and decide on rollback.
    pub async fn run(&self, kind: EntityKind, data: &TypeMap) -> KindOutcome {
        // Types with zero records are skipped entirely and do not appear
        // in the result's type list.
        let populated: Vec<(&String, &Vec<serde_json::Map<String, JsonValue>>)> = data
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .collect();
        if populated.is_empty() {
            return KindOutcome::succeeded(0, Vec::new(), Vec::new());
        }

        let types: Vec<String> = populated.iter().map(|(label, _)| (*label).clone()).collect();
        let total_records: usize = populated.iter().map(|(_, records)| records.len()).sum();
        let mut warnings = Vec::new();

        // Validating: abort the whole kind before any database write
        if let Err(err) = self.validate_kind(kind, &populated, total_records) {
            return KindOutcome::failed(types, vec![err.to_string()], warnings);
        }

        let rows = self.normalize(kind, &populated, &mut warnings);

        // Staging
        let token = unique_token();
        let staging = StagingTable::new(&self.config.staging_namespace, kind, &token);
        if let Err(err) = staging.create(&self.tx).await {
            return KindOutcome::failed(types, vec![err.to_string()], warnings);
        }

        if let Err(err) = self.stage_rows(kind, &staging, rows.clone()).await {
            self.cleanup(&staging, None, &mut warnings).await;
            return KindOutcome::failed(types, vec![err.to_string()], warnings);
        }

        // Bridging (edges only): verify endpoint integrity against the
        // store before any edge is created
        if kind == EntityKind::Edge {
            match self.check_endpoints(&staging).await {
                Ok(errors) if !errors.is_empty() => {
                    for err in &errors {
                        warnings.push(err.clone());
                    }
                    self.cleanup(&staging, None, &mut warnings).await;
                    return KindOutcome::failed(types, errors, warnings);
                }
                Ok(_) => {}
                Err(err) => {
                    self.cleanup(&staging, None, &mut warnings).await;
                    return KindOutcome::failed(types, vec![err.to_string()], warnings);
                }
            }
        }

        // Mutating
        let bridge = BridgeHandle::new(&self.config.staging_namespace, kind, &token);
        if let Err(err) = bridge.create(&self.tx, &staging).await {
            self.cleanup(&staging, None, &mut warnings).await;
            return KindOutcome::failed(types, vec![err.to_string()], warnings);
        }

        let created = match self.mutate(kind, &bridge, &rows).await {
            Ok(created) => created,
            Err(err) => {
                self.cleanup(&staging, Some(&bridge), &mut warnings).await;
                return KindOutcome::failed(types, vec![err.to_string()], warnings);
            }
        };

        self.cleanup(&staging, Some(&bridge), &mut warnings).await;
        debug!(kind = %kind, created, "kind pipeline succeeded");
        KindOutcome::succeeded(created, types, warnings)
    }

    fn validate_kind(
        &self,
        kind: EntityKind,
        populated: &[(&String, &Vec<serde_json::Map<String, JsonValue>>)],
        total_records: usize,
    ) -> Result<(), LoadError> {
        let mut checked = 0;
        for (label, records) in populated {
            cypher::ensure_valid_label(kind, label)?;
            for (index, record) in records.iter().enumerate() {
                if self.config.validate {
                    let validated = match kind {
                        EntityKind::Vertex => {
                            validate_vertex(self.schema.as_ref(), label, index, record)
                        }
                        EntityKind::Edge => {
                            validate_edge(self.schema.as_ref(), label, index, record)
                        }
                    };
                    validated.map_err(|e| LoadError::Validation {
                        kind,
                        label: (*label).clone(),
                        message: e.to_string(),
                    })?;
                }
                checked += 1;
            }
            if self.config.validate {
                self.reporter.emit(
                    LoadPhase::Validation,
                    checked,
                    total_records,
                    Some(format!("validated {} type '{}'", kind, label)),
                );
            }
        }
        Ok(())
    }

    /// Extract schema-recognized properties and endpoint ids, assigning a
    /// sequence number per row in input order
    fn normalize(
        &self,
        kind: EntityKind,
        populated: &[(&String, &Vec<serde_json::Map<String, JsonValue>>)],
        warnings: &mut Vec<String>,
    ) -> Vec<StagedRow> {
        let mut rows = Vec::new();
        let mut seq = 0;
        for (label, records) in populated {
            let label_schema = match kind {
                EntityKind::Vertex => self.schema.vertex_schema(label),
                EntityKind::Edge => self.schema.edge_schema(label),
            };
            if label_schema.is_none() {
                // Intentional permissive fallback: unknown types load with
                // all of their own keys as properties
                warnings.push(format!(
                    "{} type '{}' is not present in the schema; loading with all properties",
                    kind, label
                ));
            }
            for record in records.iter() {
                let endpoints = if kind == EntityKind::Edge {
                    match (endpoint_id(record, "from"), endpoint_id(record, "to")) {
                        (Some(from), Some(to)) => Some((from, to)),
                        _ => {
                            warnings.push(format!(
                                "edge type '{}' record {} is missing an endpoint reference; skipped",
                                label, seq
                            ));
                            seq += 1;
                            continue;
                        }
                    }
                } else {
                    None
                };
                let properties = filter_properties(
                    label_schema,
                    record,
                    kind == EntityKind::Edge,
                );
                rows.push(StagedRow {
                    seq,
                    label: (*label).clone(),
                    endpoints,
                    properties: JsonValue::Object(properties),
                });
                seq += 1;
            }
        }
        rows
    }

    async fn stage_rows(
        &self,
        kind: EntityKind,
        staging: &StagingTable,
        rows: Vec<StagedRow>,
    ) -> Result<usize, LoadError> {
        let total = rows.len();
        let strategy = self.effective_strategy(total);
        debug!(kind = %kind, total, ?strategy, "staging records");

        let reporter = self.reporter.clone();
        staging
            .insert(
                &self.tx,
                rows,
                strategy,
                self.config.batch_size,
                self.config.max_parallel_batches,
                &move |inserted| {
                    reporter.emit(LoadPhase::Storing, inserted, total, None);
                },
            )
            .await
    }

    /// Streaming takes over automatically for large inputs; an explicit
    /// parallel-batch selection is honored as-is
    fn effective_strategy(&self, total: usize) -> StagingStrategy {
        match self.config.strategy {
            StagingStrategy::Sequential | StagingStrategy::Bulk
                if total > self.config.streaming_threshold =>
            {
                StagingStrategy::Streaming
            }
            other => other,
        }
    }

    /// Run the endpoint check, returning one error per failing row plus a
    /// summary error when any row fails
    async fn check_endpoints(&self, staging: &StagingTable) -> Result<Vec<String>, LoadError> {
        let sql = cypher::endpoint_check_statement(
            &self.config.graph_name,
            &self.config.staging_namespace,
            staging.name(),
        );
        let result = self
            .tx
            .execute(&sql, Vec::new())
            .await
            .map_err(|source| LoadError::Staging {
                context: "checking edge endpoints".to_string(),
                source,
            })?;

        let total = result.row_count();
        let mut errors = Vec::new();
        for row in &result.rows {
            let from_exists = row.get("from_exists").and_then(JsonValue::as_bool).unwrap_or(false);
            let to_exists = row.get("to_exists").and_then(JsonValue::as_bool).unwrap_or(false);
            if from_exists && to_exists {
                continue;
            }
            let missing = match (from_exists, to_exists) {
                (false, false) => "from and to",
                (false, true) => "from",
                _ => "to",
            };
            errors.push(
                LoadError::EndpointMissing {
                    etype: string_field(row, "etype"),
                    from: string_field(row, "from_id"),
                    to: string_field(row, "to_id"),
                    missing: missing.to_string(),
                }
                .to_string(),
            );
        }
        if !errors.is_empty() {
            errors.push(
                LoadError::EndpointCheck {
                    failing: errors.len(),
                    total,
                }
                .to_string(),
            );
        }
        Ok(errors)
    }

    /// Execute one creation statement per staged type, all dereferencing
    /// the same bridge handle
    async fn mutate(
        &self,
        kind: EntityKind,
        bridge: &BridgeHandle,
        rows: &[StagedRow],
    ) -> Result<usize, LoadError> {
        let total = rows.len();
        let mut created = 0;
        let mut done = 0;

        let mut staged_types: Vec<&str> = Vec::new();
        for row in rows {
            if staged_types.last() != Some(&row.label.as_str())
                && !staged_types.contains(&row.label.as_str())
            {
                staged_types.push(&row.label);
            }
        }

        for label in staged_types {
            let sql = match kind {
                EntityKind::Vertex => cypher::vertex_create_statement(
                    &self.config.graph_name,
                    &self.config.staging_namespace,
                    bridge.name(),
                    label,
                ),
                EntityKind::Edge => cypher::edge_create_statement(
                    &self.config.graph_name,
                    &self.config.staging_namespace,
                    bridge.name(),
                    label,
                ),
            };
            let result =
                self.tx
                    .execute(&sql, Vec::new())
                    .await
                    .map_err(|source| LoadError::Mutation {
                        context: format!("creating {} type '{}'", kind, label),
                        source,
                    })?;

            let staged_of_type = rows.iter().filter(|r| r.label == label).count();
            let reported = result
                .rows
                .first()
                .and_then(|row| row.get("created"))
                .and_then(JsonValue::as_u64)
                .map(|n| n as usize)
                .unwrap_or(staged_of_type);
            created += reported;
            done += staged_of_type;
            self.reporter.emit(
                LoadPhase::Creating,
                done,
                total,
                Some(format!("created {} type '{}'", kind, label)),
            );
        }

        // A kind whose rows were all skipped during normalization still
        // finishes its progress range
        if total == 0 {
            self.reporter.emit(LoadPhase::Creating, 0, 0, None);
        }
        Ok(created)
    }

    /// Drop the bridge handle and staging relation. Failures are logged
    /// and downgraded to warnings, never escalated.
    async fn cleanup(
        &self,
        staging: &StagingTable,
        bridge: Option<&BridgeHandle>,
        warnings: &mut Vec<String>,
    ) {
        if let Some(bridge) = bridge {
            if let Err(err) = bridge.drop(&self.tx).await {
                warn!(%err, "bridge cleanup failed");
                warnings.push(err.to_string());
            }
        }
        if let Err(err) = staging.drop(&self.tx).await {
            warn!(%err, "staging cleanup failed");
            warnings.push(err.to_string());
        }
    }
}

fn string_field(row: &JsonValue, key: &str) -> String {
    match row.get(key) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
