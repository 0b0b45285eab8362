/// File-based payload ingestion
///
/// JSON format: a single object with two top-level mappings, `vertices`
/// and `edges`, each `label -> array<record>`; both default to empty.
///
/// CSV format (one file per kind): a `label` column plus one column per
/// property; edge files additionally carry `from` and `to` columns.
/// Property values parse as JSON where possible and fall back to strings.

use super::{GraphLoader, LoadOptions};
use crate::error::LoadError;
use crate::types::{GraphData, LoadResult, Record};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// CSV vertex row
#[derive(Debug, Deserialize)]
struct CsvVertexRow {
    label: String,
    #[serde(flatten)]
    properties: HashMap<String, JsonValue>,
}

/// CSV edge row
#[derive(Debug, Deserialize)]
struct CsvEdgeRow {
    label: String,
    from: String,
    to: String,
    #[serde(flatten)]
    properties: HashMap<String, JsonValue>,
}

impl GraphLoader {
    /// Read a JSON payload from disk and load it
    pub async fn load_from_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: LoadOptions,
    ) -> LoadResult {
        match read_graph_data(path) {
            Ok(data) => self.load_graph_data(data, options).await,
            Err(err) => LoadResult::from_parts(
                false,
                0,
                0,
                Vec::new(),
                Vec::new(),
                vec![err.to_string()],
                Vec::new(),
                0,
            ),
        }
    }

    /// Read vertex and edge CSV files, build a payload, and load it
    pub async fn load_from_csv_files<P: AsRef<Path>>(
        &self,
        vertices_path: P,
        edges_path: P,
        options: LoadOptions,
    ) -> LoadResult {
        let data = match read_csv_graph_data(vertices_path, edges_path) {
            Ok(data) => data,
            Err(err) => {
                return LoadResult::from_parts(
                    false,
                    0,
                    0,
                    Vec::new(),
                    Vec::new(),
                    vec![err.to_string()],
                    Vec::new(),
                    0,
                )
            }
        };
        self.load_graph_data(data, options).await
    }
}

/// Parse a JSON payload file
pub fn read_graph_data<P: AsRef<Path>>(path: P) -> Result<GraphData, LoadError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let data = serde_json::from_reader(reader)?;
    Ok(data)
}

/// Parse vertex and edge CSV files into a payload
pub fn read_csv_graph_data<P: AsRef<Path>>(
    vertices_path: P,
    edges_path: P,
) -> Result<GraphData, LoadError> {
    let mut data = GraphData::new();

    let mut reader = csv::Reader::from_reader(BufReader::new(File::open(vertices_path)?));
    for row in reader.deserialize() {
        let row: CsvVertexRow = row?;
        let record = csv_properties(&stringify_cells(&row.properties));
        data.vertices.entry(row.label).or_default().push(record);
    }

    let mut reader = csv::Reader::from_reader(BufReader::new(File::open(edges_path)?));
    for row in reader.deserialize() {
        let row: CsvEdgeRow = row?;
        let mut record = csv_properties(&stringify_cells(&row.properties));
        record.insert("from".to_string(), JsonValue::String(row.from));
        record.insert("to".to_string(), JsonValue::String(row.to));
        data.edges.entry(row.label).or_default().push(record);
    }

    Ok(data)
}

/// Flattened cells arrive type-inferred by the csv crate; render them
/// back to the raw string form `csv_properties` expects, dropping the
/// nulls that empty cells infer to
fn stringify_cells(cells: &HashMap<String, JsonValue>) -> HashMap<String, String> {
    cells
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let cell = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), cell)
        })
        .collect()
}

/// CSV cells are strings; recover numbers, booleans and null where the
/// cell parses as a bare JSON scalar
fn csv_properties(cells: &HashMap<String, String>) -> Record {
    let mut record = Record::new();
    for (key, cell) in cells {
        if cell.is_empty() {
            continue;
        }
        let value = match serde_json::from_str::<JsonValue>(cell) {
            Ok(parsed) if !parsed.is_string() && !parsed.is_object() && !parsed.is_array() => {
                parsed
            }
            _ => JsonValue::String(cell.clone()),
        };
        record.insert(key.clone(), value);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_json_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(
            &path,
            r#"{
                "vertices": {
                    "Person": [{"id": "1", "name": "Alice", "age": 30}]
                },
                "edges": {
                    "KNOWS": [{"from": "1", "to": "2", "since": 2020}]
                }
            }"#,
        )
        .unwrap();

        let data = read_graph_data(&path).unwrap();
        assert_eq!(data.vertex_record_count(), 1);
        assert_eq!(data.edge_record_count(), 1);
        assert_eq!(data.vertices["Person"][0]["name"], json!("Alice"));
    }

    #[test]
    fn test_read_json_payload_missing_mappings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{}").unwrap();
        let data = read_graph_data(&path).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_read_csv_payload() {
        let dir = TempDir::new().unwrap();
        let vertices = dir.path().join("vertices.csv");
        let edges = dir.path().join("edges.csv");

        let mut file = File::create(&vertices).unwrap();
        writeln!(file, "label,id,name,age").unwrap();
        writeln!(file, "Person,1,Alice,30").unwrap();
        writeln!(file, "Person,2,Bob,25").unwrap();

        let mut file = File::create(&edges).unwrap();
        writeln!(file, "label,from,to,since").unwrap();
        writeln!(file, "KNOWS,1,2,2020").unwrap();

        let data = read_csv_graph_data(&vertices, &edges).unwrap();
        assert_eq!(data.vertex_record_count(), 2);
        assert_eq!(data.edge_record_count(), 1);
        // Numeric cells are recovered as numbers, ids stay strings
        assert_eq!(data.vertices["Person"][0]["age"], json!(30));
        assert_eq!(data.edges["KNOWS"][0]["from"], json!("1"));
        assert_eq!(data.edges["KNOWS"][0]["since"], json!(2020));
    }

    #[test]
    fn test_csv_empty_cells_are_dropped() {
        let mut cells = HashMap::new();
        cells.insert("name".to_string(), String::new());
        cells.insert("age".to_string(), "30".to_string());
        let record = csv_properties(&cells);
        assert!(!record.contains_key("name"));
        assert_eq!(record["age"], json!(30));
    }
}
