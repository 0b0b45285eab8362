/// End-to-end tests for the bulk loading engine against the mock backend

use graph_bulk_loader::backend::mock::MockBackend;
use graph_bulk_loader::{
    EntityKind, GraphBackend, GraphData, GraphLoader, LoadError, LoadOptions, ProgressEvent,
    ProgressSink, StagingStrategy, StaticSchema, TypeMap,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn loader(backend: &Arc<MockBackend>) -> GraphLoader {
    GraphLoader::new(backend.clone(), Arc::new(StaticSchema::new()))
}

fn type_map_from_json(label: &str, records: Vec<serde_json::Value>) -> TypeMap {
    let mut map = TypeMap::new();
    map.insert(
        label.to_string(),
        records
            .into_iter()
            .map(|value| value.as_object().expect("JSON object record").clone())
            .collect(),
    );
    map
}

fn people_and_employment() -> GraphData {
    GraphData {
        vertices: type_map_from_json(
            "Person",
            vec![
                json!({"id": "1", "name": "Alice", "age": 30}),
                json!({"id": "2", "name": "Bob", "age": 25}),
            ],
        ),
        edges: type_map_from_json("WORKS_AT", vec![json!({"from": "1", "to": "2", "since": 2015})]),
    }
}

#[tokio::test]
async fn test_load_vertices_only() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let vertices = type_map_from_json(
        "Person",
        vec![
            json!({"id": "1", "name": "Alice", "age": 30}),
            json!({"id": "2", "name": "Bob", "age": 25}),
        ],
    );
    let result = loader.load_vertices(vertices, LoadOptions::default()).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.vertex_count, 2);
    assert_eq!(result.vertex_types, vec!["Person"]);
    assert_eq!(result.edge_count, 0);
    assert!(result.edge_types.is_empty());

    assert_eq!(backend.vertex_count(), 2);
    assert!(backend.has_vertex("1"));
    assert!(backend.has_vertex("2"));
}

#[tokio::test]
async fn test_empty_input_is_a_successful_noop() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let result = loader
        .load_graph_data(GraphData::new(), LoadOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(result.vertex_count, 0);
    assert_eq!(result.edge_count, 0);
    assert!(result.vertex_types.is_empty());
    assert!(result.edge_types.is_empty());
    assert!(result.errors.is_none());
    assert!(result.warnings.is_none());
    // No round trips at all
    assert!(backend.executed_statements().is_empty());
}

#[tokio::test]
async fn test_vertices_then_edges_in_one_invocation() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let result = loader
        .load_graph_data(people_and_employment(), LoadOptions::default())
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.vertex_count, 2);
    assert_eq!(result.edge_count, 1);
    assert_eq!(backend.edges_with_label("WORKS_AT"), vec![("1".to_string(), "2".to_string())]);

    // Vertices are created and visible before the edge endpoint check runs
    let statements = backend.executed_statements();
    let vertex_create = statements
        .iter()
        .position(|s| s.contains("CREATE (v:Person)"))
        .expect("vertex creation statement");
    let endpoint_check = statements
        .iter()
        .position(|s| s.starts_with("SELECT s.seq"))
        .expect("endpoint check statement");
    let edge_create = statements
        .iter()
        .position(|s| s.contains("CREATE (a)-[r:WORKS_AT]"))
        .expect("edge creation statement");
    assert!(vertex_create < endpoint_check);
    assert!(endpoint_check < edge_create);
}

#[tokio::test]
async fn test_missing_endpoint_fails_the_whole_edge_kind() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_vertex("1", "Person", json!({"id": "1"}));
    backend.seed_vertex("2", "Person", json!({"id": "2"}));
    let loader = loader(&backend);

    // One good edge and one referencing the non-existent vertex "3":
    // all-or-nothing per kind, so neither is created
    let edges = type_map_from_json(
        "WORKS_AT",
        vec![
            json!({"from": "1", "to": "2", "since": 2015}),
            json!({"from": "1", "to": "3", "since": 2016}),
        ],
    );
    let result = loader.load_edges(edges, LoadOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.edge_count, 0);
    assert!(result
        .errors()
        .iter()
        .any(|e| e.contains("WORKS_AT") && e.contains("'3'")));
    assert!(result
        .errors()
        .iter()
        .any(|e| e.contains("1 of 2 staged edges")));
    assert_eq!(backend.edge_count(), 0);
}

#[tokio::test]
async fn test_cleanup_postcondition_on_success() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let result = loader
        .load_graph_data(people_and_employment(), LoadOptions::default())
        .await;
    assert!(result.success);

    // Nothing created by the invocation remains queryable
    assert!(backend.leaked_objects().is_empty());
    let statements = backend.executed_statements();
    assert_eq!(
        statements.iter().filter(|s| s.starts_with("DROP TABLE")).count(),
        2
    );
    assert_eq!(
        statements.iter().filter(|s| s.starts_with("DROP FUNCTION")).count(),
        2
    );
}

#[tokio::test]
async fn test_progress_is_monotonic_and_ends_at_100() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    let sink: ProgressSink = Arc::new(move |event| captured.lock().push(event));

    let result = loader
        .load_graph_data(
            people_and_employment(),
            LoadOptions {
                on_progress: Some(sink),
                ..LoadOptions::default()
            },
        )
        .await;
    assert!(result.success);

    let events = events.lock();
    assert!(!events.is_empty());
    let percentages: Vec<u8> = events.iter().map(|e| e.percentage).collect();
    assert!(
        percentages.windows(2).all(|w| w[0] <= w[1]),
        "not monotonic: {:?}",
        percentages
    );
    assert_eq!(*percentages.last().unwrap(), 100);

    // Vertex progress is compressed into 0-50, edge progress into 50-100
    let vertex_max = events
        .iter()
        .filter(|e| e.kind == EntityKind::Vertex)
        .map(|e| e.percentage)
        .max()
        .unwrap();
    assert!(vertex_max <= 50);
}

#[tokio::test]
async fn test_caller_supplied_transaction_is_left_open() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let tx = backend.begin_transaction().await.unwrap();
    let result = loader
        .load_graph_data(
            people_and_employment(),
            LoadOptions {
                transaction: Some(tx.clone()),
                ..LoadOptions::default()
            },
        )
        .await;
    assert!(result.success);

    // The engine neither committed nor rolled back
    assert_eq!(backend.vertex_count(), 0);
    tx.commit().await.unwrap();
    assert_eq!(backend.vertex_count(), 2);
    assert_eq!(backend.edge_count(), 1);
    assert!(backend.leaked_objects().is_empty());
}

#[tokio::test]
async fn test_staging_failure_rolls_back_owned_transaction() {
    let backend = Arc::new(MockBackend::new().fail_on("INSERT INTO"));
    backend.seed_vertex("0", "Person", json!({"id": "0"}));
    let loader = loader(&backend);

    let result = loader
        .load_graph_data(people_and_employment(), LoadOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.vertex_count, 0);
    assert!(result.errors().iter().any(|e| e.contains("Staging failed")));
    // Pre-existing data untouched, nothing new committed
    assert_eq!(backend.vertex_count(), 1);
    assert_eq!(backend.edge_count(), 0);
}

#[tokio::test]
async fn test_commit_failure_is_reported_distinctly() {
    let backend = Arc::new(MockBackend::new().fail_commit().fail_rollback());
    let loader = loader(&backend);

    let result = loader
        .load_graph_data(people_and_employment(), LoadOptions::default())
        .await;

    assert!(!result.success);
    assert!(result
        .errors()
        .iter()
        .any(|e| e.contains("Transaction commit failed")));
    // The secondary rollback failure is a warning, not the primary error
    assert!(result
        .warnings()
        .iter()
        .any(|w| w.contains("rollback after failed commit")));
}

#[tokio::test]
async fn test_required_property_violation_aborts_before_writes() {
    let backend = Arc::new(MockBackend::new());
    let mut schema = StaticSchema::new();
    let mut person = graph_bulk_loader::LabelSchema::default();
    person.required.push("id".to_string());
    schema.define_vertex("Person", person);
    let loader = GraphLoader::new(backend.clone(), Arc::new(schema));

    let vertices = type_map_from_json("Person", vec![json!({"name": "NoId"})]);
    let result = loader.load_vertices(vertices, LoadOptions::default()).await;

    assert!(!result.success);
    assert!(result
        .errors()
        .iter()
        .any(|e| e.contains("required property 'id'")));
    assert_eq!(backend.vertex_count(), 0);
}

#[tokio::test]
async fn test_unvalidated_edges_missing_endpoints_are_skipped() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_vertex("1", "Person", json!({"id": "1"}));
    backend.seed_vertex("2", "Person", json!({"id": "2"}));
    let loader = loader(&backend);

    let edges = type_map_from_json(
        "KNOWS",
        vec![
            json!({"from": "1", "to": "2"}),
            json!({"from": "1"}),
        ],
    );
    let result = loader
        .load_edges(
            edges,
            LoadOptions {
                validate: false,
                ..LoadOptions::default()
            },
        )
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.edge_count, 1);
    assert!(result
        .warnings()
        .iter()
        .any(|w| w.contains("missing an endpoint reference")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_batch_strategy_end_to_end() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let records = (0..50)
        .map(|i| json!({"id": i.to_string(), "n": i}))
        .collect();
    let vertices = type_map_from_json("Item", records);
    let result = loader
        .load_vertices(
            vertices,
            LoadOptions {
                strategy: StagingStrategy::ParallelBatch,
                batch_size: 7,
                max_parallel_batches: 3,
                ..LoadOptions::default()
            },
        )
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.vertex_count, 50);
    assert_eq!(backend.vertex_count(), 50);
}

#[tokio::test]
async fn test_bulk_loads_above_the_streaming_threshold() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    // 12 records with a threshold of 10: the bulk selection is upgraded to
    // streaming and the load still creates every record
    let records = (0..12).map(|i| json!({"id": i.to_string()})).collect();
    let vertices = type_map_from_json("Item", records);
    let result = loader
        .load_vertices(
            vertices,
            LoadOptions {
                strategy: StagingStrategy::Bulk,
                streaming_threshold: 10,
                batch_size: 5,
                ..LoadOptions::default()
            },
        )
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.vertex_count, 12);
    assert_eq!(backend.vertex_count(), 12);
    // Rows were flushed in chunks of batch_size, not one statement
    let inserts = backend
        .executed_statements()
        .iter()
        .filter(|s| s.starts_with("INSERT INTO"))
        .count();
    assert_eq!(inserts, 3);
}

#[tokio::test]
async fn test_try_load_graph_data_throws_on_failure() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let edges = type_map_from_json("WORKS_AT", vec![json!({"from": "1", "to": "3"})]);
    let err = loader
        .try_load_graph_data(GraphData::with_edges(edges), LoadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Failed { .. }));
    assert!(err.to_string().contains("'3'"));

    let ok = loader
        .try_load_graph_data(GraphData::new(), LoadOptions::default())
        .await
        .unwrap();
    assert!(ok.success);
}

#[tokio::test]
async fn test_load_from_file() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(
        &path,
        r#"{
            "vertices": {
                "Person": [
                    {"id": "1", "name": "Alice", "age": 30},
                    {"id": "2", "name": "Bob", "age": 25}
                ]
            },
            "edges": {
                "KNOWS": [{"from": "1", "to": "2", "since": 2020}]
            }
        }"#,
    )
    .unwrap();

    let result = loader.load_from_file(&path, LoadOptions::default()).await;
    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.vertex_count, 2);
    assert_eq!(result.edge_count, 1);
    assert_eq!(result.vertex_types, vec!["Person"]);
    assert_eq!(result.edge_types, vec!["KNOWS"]);
}

#[tokio::test]
async fn test_load_from_csv_files() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let dir = TempDir::new().unwrap();
    let vertices = dir.path().join("vertices.csv");
    let edges = dir.path().join("edges.csv");
    std::fs::write(&vertices, "label,id,name\nPerson,1,Alice\nPerson,2,Bob\n").unwrap();
    std::fs::write(&edges, "label,from,to,since\nKNOWS,1,2,2020\n").unwrap();

    let result = loader
        .load_from_csv_files(&vertices, &edges, LoadOptions::default())
        .await;
    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.vertex_count, 2);
    assert_eq!(result.edge_count, 1);
}

#[tokio::test]
async fn test_invalid_options_fail_fast() {
    let backend = Arc::new(MockBackend::new());
    let loader = loader(&backend);

    let result = loader
        .load_graph_data(
            people_and_employment(),
            LoadOptions {
                batch_size: 0,
                ..LoadOptions::default()
            },
        )
        .await;
    assert!(!result.success);
    assert!(result.errors()[0].contains("batch_size"));
    assert!(backend.executed_statements().is_empty());
}
