/// In-memory mock backend
///
/// Understands exactly the statement shapes this crate generates (staging
/// DDL/DML, bridge functions, endpoint checks, cypher mutations) and keeps
/// a small in-memory graph with transactional commit/rollback semantics.
/// Used by unit and integration tests; also handy for dry-running a load
/// without a database.

use super::{BackendError, BackendResult, BackendTransaction, GraphBackend, QueryResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct MockEdge {
    label: String,
    from: String,
    to: String,
    #[allow(dead_code)]
    properties: JsonValue,
}

#[derive(Debug, Clone)]
struct StagedRow {
    seq: u64,
    label: String,
    from: Option<String>,
    to: Option<String>,
    properties: JsonValue,
}

#[derive(Default)]
struct MockState {
    // Committed graph
    vertices: HashMap<String, (String, JsonValue)>,
    edges: Vec<MockEdge>,
    // Uncommitted graph mutations of the open transaction
    tx_vertices: HashMap<String, (String, JsonValue)>,
    tx_edges: Vec<MockEdge>,
    // Transaction-scoped side-channel objects
    staging: HashMap<String, Vec<StagedRow>>,
    functions: HashMap<String, String>,
    // Side-channel objects still live at commit time
    leaked: Vec<String>,
    executed: Vec<String>,
}

impl MockState {
    fn vertex_exists(&self, id: &str) -> bool {
        self.vertices.contains_key(id) || self.tx_vertices.contains_key(id)
    }

    fn commit(&mut self) {
        let tx_vertices = std::mem::take(&mut self.tx_vertices);
        self.vertices.extend(tx_vertices);
        self.edges.append(&mut self.tx_edges);
        for name in self.staging.keys() {
            self.leaked.push(format!("table {}", name));
        }
        for name in self.functions.keys() {
            self.leaked.push(format!("function {}", name));
        }
        self.staging.clear();
        self.functions.clear();
    }

    fn rollback(&mut self) {
        self.tx_vertices.clear();
        self.tx_edges.clear();
        self.staging.clear();
        self.functions.clear();
    }
}

/// Mock backend over shared in-memory state
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    fail_on: Option<String>,
    fail_commit: bool,
    fail_rollback: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            fail_on: None,
            fail_commit: false,
            fail_rollback: false,
        }
    }

    /// Fail any statement whose text contains the given fragment
    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    /// Fail the next commit
    pub fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Fail the next rollback
    pub fn fail_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    /// Seed a committed vertex, as if created by an earlier invocation
    pub fn seed_vertex(&self, id: &str, label: &str, properties: JsonValue) {
        self.state
            .lock()
            .vertices
            .insert(id.to_string(), (label.to_string(), properties));
    }

    /// Number of committed vertices
    pub fn vertex_count(&self) -> usize {
        self.state.lock().vertices.len()
    }

    /// Number of committed edges
    pub fn edge_count(&self) -> usize {
        self.state.lock().edges.len()
    }

    /// True if a committed vertex with this id exists
    pub fn has_vertex(&self, id: &str) -> bool {
        self.state.lock().vertices.contains_key(id)
    }

    /// Committed edges with the given label, as (from, to) pairs
    pub fn edges_with_label(&self, label: &str) -> Vec<(String, String)> {
        self.state
            .lock()
            .edges
            .iter()
            .filter(|e| e.label == label)
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect()
    }

    /// Rows currently staged in a live (uncommitted) staging table
    pub fn staged_row_count(&self, table: &str) -> usize {
        self.state
            .lock()
            .staging
            .get(table)
            .map_or(0, Vec::len)
    }

    /// True if a bridge function with this name is currently defined
    pub fn has_function(&self, name: &str) -> bool {
        self.state.lock().functions.contains_key(name)
    }

    /// Side-channel objects that were still live when a commit ran
    pub fn leaked_objects(&self) -> Vec<String> {
        self.state.lock().leaked.clone()
    }

    /// Every statement executed so far, in order
    pub fn executed_statements(&self) -> Vec<String> {
        self.state.lock().executed.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphBackend for MockBackend {
    async fn execute(&self, sql: &str, params: Vec<JsonValue>) -> BackendResult<QueryResult> {
        // Autocommit path: interpret and fold straight into committed state
        let result = interpret(&self.state, &self.fail_on, sql, params)?;
        self.state.lock().commit();
        Ok(result)
    }

    async fn begin_transaction(&self) -> BackendResult<Arc<dyn BackendTransaction>> {
        Ok(Arc::new(MockTransaction {
            state: self.state.clone(),
            fail_on: self.fail_on.clone(),
            fail_commit: self.fail_commit,
            fail_rollback: self.fail_rollback,
        }))
    }
}

/// One open transaction against the mock state
pub struct MockTransaction {
    state: Arc<Mutex<MockState>>,
    fail_on: Option<String>,
    fail_commit: bool,
    fail_rollback: bool,
}

#[async_trait]
impl BackendTransaction for MockTransaction {
    async fn execute(&self, sql: &str, params: Vec<JsonValue>) -> BackendResult<QueryResult> {
        interpret(&self.state, &self.fail_on, sql, params)
    }

    async fn commit(&self) -> BackendResult<()> {
        if self.fail_commit {
            return Err(BackendError::Transaction("injected commit failure".to_string()));
        }
        self.state.lock().commit();
        Ok(())
    }

    async fn rollback(&self) -> BackendResult<()> {
        if self.fail_rollback {
            return Err(BackendError::Transaction(
                "injected rollback failure".to_string(),
            ));
        }
        self.state.lock().rollback();
        Ok(())
    }
}

fn interpret(
    state: &Arc<Mutex<MockState>>,
    fail_on: &Option<String>,
    sql: &str,
    params: Vec<JsonValue>,
) -> BackendResult<QueryResult> {
    let mut state = state.lock();
    state.executed.push(sql.to_string());

    if let Some(fragment) = fail_on {
        if sql.contains(fragment.as_str()) {
            return Err(BackendError::Database(format!(
                "injected failure on '{}'",
                fragment
            )));
        }
    }

    let idents = quoted_identifiers(sql);

    if sql.starts_with("CREATE TABLE IF NOT EXISTS") {
        let table = idents
            .get(1)
            .ok_or_else(|| BackendError::Database("malformed CREATE TABLE".to_string()))?;
        state.staging.entry(table.clone()).or_default();
        return Ok(QueryResult::empty());
    }

    if sql.starts_with("INSERT INTO") {
        let table = idents
            .get(1)
            .ok_or_else(|| BackendError::Database("malformed INSERT".to_string()))?
            .clone();
        let is_edge = sql.contains("etype");
        let arity = if is_edge { 5 } else { 3 };
        if params.len() % arity != 0 {
            return Err(BackendError::Database("parameter arity mismatch".to_string()));
        }
        let rows = state
            .staging
            .get_mut(&table)
            .ok_or_else(|| BackendError::Database(format!("relation {} does not exist", table)))?;
        for chunk in params.chunks(arity) {
            rows.push(StagedRow {
                seq: chunk[0].as_u64().unwrap_or(0),
                label: scalar_string(&chunk[1]),
                from: is_edge.then(|| scalar_string(&chunk[2])),
                to: is_edge.then(|| scalar_string(&chunk[3])),
                properties: chunk[arity - 1].clone(),
            });
        }
        return Ok(QueryResult::empty());
    }

    if sql.starts_with("CREATE OR REPLACE FUNCTION") {
        let function = idents
            .get(1)
            .ok_or_else(|| BackendError::Database("malformed CREATE FUNCTION".to_string()))?
            .clone();
        let table = idents
            .get(3)
            .ok_or_else(|| BackendError::Database("malformed bridge body".to_string()))?
            .clone();
        if !state.staging.contains_key(&table) {
            return Err(BackendError::Database(format!(
                "relation {} does not exist",
                table
            )));
        }
        state.functions.insert(function, table);
        return Ok(QueryResult::empty());
    }

    if sql.starts_with("DROP FUNCTION IF EXISTS") {
        if let Some(function) = idents.get(1) {
            state.functions.remove(function);
        }
        return Ok(QueryResult::empty());
    }

    if sql.starts_with("DROP TABLE IF EXISTS") {
        if let Some(table) = idents.get(1) {
            state.staging.remove(table);
        }
        return Ok(QueryResult::empty());
    }

    if sql.starts_with("SELECT s.seq") {
        // Endpoint check over the edge staging table
        let table = idents
            .last()
            .ok_or_else(|| BackendError::Database("malformed endpoint check".to_string()))?;
        let rows = state
            .staging
            .get(table)
            .ok_or_else(|| BackendError::Database(format!("relation {} does not exist", table)))?
            .clone();
        let result_rows = rows
            .iter()
            .map(|row| {
                let from = row.from.clone().unwrap_or_default();
                let to = row.to.clone().unwrap_or_default();
                json!({
                    "seq": row.seq,
                    "etype": row.label,
                    "from_id": from,
                    "to_id": to,
                    "from_exists": state.vertex_exists(&from),
                    "to_exists": state.vertex_exists(&to),
                })
            })
            .collect();
        return Ok(QueryResult::with_rows(result_rows));
    }

    if sql.starts_with("SELECT * FROM cypher(") {
        return run_cypher_mutation(&mut state, sql);
    }

    Err(BackendError::Database(format!(
        "mock backend cannot interpret statement: {}",
        sql.lines().next().unwrap_or_default()
    )))
}

fn run_cypher_mutation(state: &mut MockState, sql: &str) -> BackendResult<QueryResult> {
    let bridge_table = state
        .functions
        .iter()
        .find(|(name, _)| sql.contains(&format!("{}()", name)))
        .map(|(_, table)| table.clone())
        .ok_or_else(|| BackendError::Database("bridge function does not exist".to_string()))?;

    let label = extract_between(sql, "rec.type = '", "'")
        .ok_or_else(|| BackendError::Database("missing type filter".to_string()))?;

    let rows: Vec<StagedRow> = state
        .staging
        .get(&bridge_table)
        .ok_or_else(|| BackendError::Database("staging relation does not exist".to_string()))?
        .iter()
        .filter(|row| row.label == label)
        .cloned()
        .collect();

    let mut created = 0usize;
    if sql.contains("CREATE (v:") {
        for row in rows {
            let id = row
                .properties
                .get("id")
                .map(scalar_string)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("{}#{}", row.label, row.seq));
            state
                .tx_vertices
                .insert(id, (row.label.clone(), row.properties.clone()));
            created += 1;
        }
    } else if sql.contains("CREATE (a)-[") {
        for row in rows {
            let from = row.from.clone().unwrap_or_default();
            let to = row.to.clone().unwrap_or_default();
            // MATCH semantics: rows whose endpoints do not resolve simply
            // create nothing
            if state.vertex_exists(&from) && state.vertex_exists(&to) {
                state.tx_edges.push(MockEdge {
                    label: row.label.clone(),
                    from,
                    to,
                    properties: row.properties.clone(),
                });
                created += 1;
            }
        }
    } else {
        return Err(BackendError::Database(
            "mock backend cannot interpret cypher body".to_string(),
        ));
    }

    Ok(QueryResult::with_rows(vec![json!({ "created": created })]))
}

/// All tokens enclosed in double quotes, in order of appearance
fn quoted_identifiers(sql: &str) -> Vec<String> {
    let mut idents = Vec::new();
    let mut rest = sql;
    while let Some(start) = rest.find('"') {
        rest = &rest[start + 1..];
        match rest.find('"') {
            Some(end) => {
                idents.push(rest[..end].to_string());
                rest = &rest[end + 1..];
            }
            None => break,
        }
    }
    idents
}

fn extract_between(haystack: &str, prefix: &str, suffix: &str) -> Option<String> {
    let start = haystack.find(prefix)? + prefix.len();
    let end = haystack[start..].find(suffix)? + start;
    Some(haystack[start..end].to_string())
}

fn scalar_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
