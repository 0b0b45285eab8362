use serde::Serialize;

/// Aggregated outcome of one load invocation
///
/// Produced once per orchestrator call and immutable after construction.
/// Empty error/warning lists are omitted (`None`) rather than serialized
/// as empty collections.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadResult {
    /// True only if every processed kind succeeded
    pub success: bool,
    /// Number of vertices created in the graph
    pub vertex_count: usize,
    /// Number of edges created in the graph
    pub edge_count: usize,
    /// Vertex types actually processed (types with zero records are skipped)
    pub vertex_types: Vec<String>,
    /// Edge types actually processed
    pub edge_types: Vec<String>,
    /// Errors accumulated across both kinds, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Warnings accumulated across both kinds, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    /// Wall-clock duration of the invocation in milliseconds
    pub duration_ms: u64,
}

impl LoadResult {
    /// An empty, successful result (no records processed)
    pub fn empty() -> Self {
        Self {
            success: true,
            vertex_count: 0,
            edge_count: 0,
            vertex_types: Vec::new(),
            edge_types: Vec::new(),
            errors: None,
            warnings: None,
            duration_ms: 0,
        }
    }

    /// Build a result from aggregated parts, normalizing empty lists to `None`
    pub fn from_parts(
        success: bool,
        vertex_count: usize,
        edge_count: usize,
        vertex_types: Vec<String>,
        edge_types: Vec<String>,
        errors: Vec<String>,
        warnings: Vec<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            success,
            vertex_count,
            edge_count,
            vertex_types,
            edge_types,
            errors: if errors.is_empty() { None } else { Some(errors) },
            warnings: if warnings.is_empty() {
                None
            } else {
                Some(warnings)
            },
            duration_ms,
        }
    }

    /// All errors as a slice (empty if none)
    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }

    /// All warnings as a slice (empty if none)
    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = LoadResult::empty();
        assert!(result.success);
        assert_eq!(result.vertex_count, 0);
        assert_eq!(result.edge_count, 0);
        assert!(result.vertex_types.is_empty());
        assert!(result.errors.is_none());
    }

    #[test]
    fn test_from_parts_omits_empty_lists() {
        let result = LoadResult::from_parts(
            true,
            2,
            0,
            vec!["Person".to_string()],
            vec![],
            vec![],
            vec!["warn".to_string()],
            12,
        );
        assert!(result.errors.is_none());
        assert_eq!(result.warnings(), &["warn".to_string()]);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json.get("warnings").is_some());
    }
}
