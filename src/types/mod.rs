/// Core data types for the loading engine
///
/// - `GraphData`: the caller-supplied payload (type name -> records)
/// - `LoadResult`: the aggregated outcome of one load invocation
/// - `ProgressEvent`: progress notifications emitted during a load

pub mod graph_data;
pub mod load_result;
pub mod progress;

pub use graph_data::{GraphData, Record, TypeMap};
pub use load_result::LoadResult;
pub use progress::{LoadPhase, ProgressEvent, ProgressReporter, ProgressSink};

use serde::{Deserialize, Serialize};

/// The two entity categories the pipeline processes, always in this order:
/// vertices first, then edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Vertex,
    Edge,
}

impl EntityKind {
    /// Lowercase singular name, used in messages and staging identifiers
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Vertex => "vertex",
            EntityKind::Edge => "edge",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
