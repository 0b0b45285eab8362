/// Graph Bulk Loader
///
/// A client-side engine that bulk-loads typed graph data (vertices and
/// edges) into a graph-query-capable relational backend whose graph
/// language accepts only literal scalars inline. Composite payloads are
/// routed through a transaction-scoped staging relation and exposed to
/// graph statements behind a zero-argument bridge function.
///
/// # Architecture
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │            Graph Bulk Loader                     │
/// ├──────────────────────────────────────────────────┤
/// │  ┌────────────────────────────────┐              │
/// │  │   Load Orchestrator            │              │
/// │  └────────────┬───────────────────┘              │
/// │               ↓                                   │
/// │  ┌────────────────────────────────┐              │
/// │  │   Ingestion Pipeline           │              │
/// │  │   (validate → stage → bridge   │              │
/// │  │    → mutate → clean up)        │              │
/// │  └────────────┬───────────────────┘              │
/// │               ↓                                   │
/// │  ┌────────────────────────────────┐              │
/// │  │   Backend (SQL + cypher())     │              │
/// │  └────────────────────────────────┘              │
/// └──────────────────────────────────────────────────┘
/// ```
///
/// # Modules
///
/// - `types`: Core data types (GraphData, LoadResult, ProgressEvent)
/// - `schema`: Per-label schema definitions and the provider trait
/// - `validation`: Record validation and property filtering
/// - `backend`: Connection/transaction abstraction and the mock backend
/// - `staging`: Transaction-scoped staging relations and insert strategies
/// - `bridge`: Zero-argument bridge functions over staged payloads
/// - `cypher`: Graph-mutation statement templates
/// - `pipeline`: The per-kind ingestion state machine
/// - `loader`: The orchestrator and its entry points

pub mod backend;
pub mod bridge;
pub mod cypher;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod staging;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use types::{
    EntityKind, GraphData, LoadPhase, LoadResult, ProgressEvent, ProgressSink, Record, TypeMap,
};

// Re-export backend types
pub use backend::{
    BackendError, BackendResult, BackendTransaction, GraphBackend, QueryResult, SharedBackend,
    SharedTransaction,
};

// Re-export schema types
pub use schema::{LabelSchema, PropertyDefinition, PropertyType, SchemaProvider, StaticSchema};

// Re-export loader types
pub use loader::{GraphLoader, LoadOptions};

// Re-export staging strategy selection
pub use staging::StagingStrategy;

// Re-export error types
pub use error::LoadError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
