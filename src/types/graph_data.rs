use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A single input record: an open-ended key/value structure.
///
/// For edges, the reserved keys `from` and `to` identify endpoint vertex
/// ids; all other keys are candidate properties.
pub type Record = serde_json::Map<String, JsonValue>;

/// Mapping of type name to record sequence for one entity kind.
///
/// A BTreeMap keeps per-type iteration deterministic; order within a
/// record sequence is preserved (it matters for streaming and
/// parallel-batch chunking).
pub type TypeMap = BTreeMap<String, Vec<Record>>;

/// The full payload of one load invocation
///
/// Matches the JSON file format consumed by `load_from_file`:
///
/// ```json
/// {
///   "vertices": {
///     "Person": [{"id": "1", "name": "Alice", "age": 30}]
///   },
///   "edges": {
///     "WORKS_AT": [{"from": "1", "to": "2", "since": 2015}]
///   }
/// }
/// ```
///
/// Both mappings default to empty if absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphData {
    #[serde(default)]
    pub vertices: TypeMap,
    #[serde(default)]
    pub edges: TypeMap,
}

impl GraphData {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload with only vertices
    pub fn with_vertices(vertices: TypeMap) -> Self {
        Self {
            vertices,
            edges: TypeMap::new(),
        }
    }

    /// Payload with only edges
    pub fn with_edges(edges: TypeMap) -> Self {
        Self {
            vertices: TypeMap::new(),
            edges,
        }
    }

    /// Total number of vertex records across all types
    pub fn vertex_record_count(&self) -> usize {
        self.vertices.values().map(Vec::len).sum()
    }

    /// Total number of edge records across all types
    pub fn edge_record_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// True if the payload contains no records at all
    pub fn is_empty(&self) -> bool {
        self.vertex_record_count() == 0 && self.edge_record_count() == 0
    }
}

/// Extract an endpoint id (`from` or `to`) from an edge record.
///
/// Accepts strings and numbers; numbers are coerced to their string form.
/// Returns `None` for missing keys and non-scalar values.
pub fn endpoint_id(record: &Record, key: &str) -> Option<String> {
    match record.get(key) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_empty_payload() {
        let data = GraphData::new();
        assert!(data.is_empty());
        assert_eq!(data.vertex_record_count(), 0);
        assert_eq!(data.edge_record_count(), 0);
    }

    #[test]
    fn test_record_counts() {
        let mut vertices = TypeMap::new();
        vertices.insert(
            "Person".to_string(),
            vec![
                record(json!({"id": "1", "name": "Alice"})),
                record(json!({"id": "2", "name": "Bob"})),
            ],
        );
        vertices.insert("Company".to_string(), vec![record(json!({"id": "3"}))]);

        let data = GraphData::with_vertices(vertices);
        assert_eq!(data.vertex_record_count(), 3);
        assert!(!data.is_empty());
    }

    #[test]
    fn test_deserialize_with_missing_mappings() {
        let data: GraphData = serde_json::from_str("{}").unwrap();
        assert!(data.is_empty());

        let data: GraphData =
            serde_json::from_str(r#"{"vertices": {"Person": [{"id": "1"}]}}"#).unwrap();
        assert_eq!(data.vertex_record_count(), 1);
        assert_eq!(data.edge_record_count(), 0);
    }

    #[test]
    fn test_endpoint_id_coercion() {
        let rec = record(json!({"from": "1", "to": 3, "weight": [1, 2]}));
        assert_eq!(endpoint_id(&rec, "from"), Some("1".to_string()));
        assert_eq!(endpoint_id(&rec, "to"), Some("3".to_string()));
        assert_eq!(endpoint_id(&rec, "weight"), None);
        assert_eq!(endpoint_id(&rec, "missing"), None);
    }
}
