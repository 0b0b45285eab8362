/// Schema collaborator interface
///
/// The loader consumes per-label schema definitions to decide which record
/// keys are persisted as properties and whether required ones are present.
/// Absence of a label is not an error; it disables schema-aware filtering
/// and required-field checks for that label only.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Recognized property types for schema-aware validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    /// Matches any JSON value
    Any,
}

impl PropertyType {
    /// Check whether a JSON value matches this type
    pub fn matches(&self, value: &JsonValue) -> bool {
        match self {
            PropertyType::String => value.is_string(),
            PropertyType::Integer => value.is_i64() || value.is_u64(),
            PropertyType::Float => value.is_number(),
            PropertyType::Boolean => value.is_boolean(),
            PropertyType::Array => value.is_array(),
            PropertyType::Object => value.is_object(),
            PropertyType::Any => true,
        }
    }
}

/// Definition of a single recognized property
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDefinition {
    /// Expected value type
    #[serde(default = "PropertyDefinition::default_type", rename = "type")]
    pub data_type: PropertyType,
}

impl PropertyDefinition {
    fn default_type() -> PropertyType {
        PropertyType::Any
    }

    pub fn new(data_type: PropertyType) -> Self {
        Self { data_type }
    }
}

/// Schema for one vertex or edge label
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelSchema {
    /// Recognized property names; unknown record keys are dropped, not rejected
    #[serde(default)]
    pub properties: HashMap<String, PropertyDefinition>,
    /// Property names that must be present and non-null on every record
    #[serde(default)]
    pub required: Vec<String>,
}

impl LabelSchema {
    /// True if the given key is a recognized property of this label
    pub fn recognizes(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }
}

/// Provider of per-label schema definitions
pub trait SchemaProvider: Send + Sync {
    /// Schema for a vertex label, or `None` if the label is not defined
    fn vertex_schema(&self, label: &str) -> Option<&LabelSchema>;

    /// Schema for an edge label, or `None` if the label is not defined
    fn edge_schema(&self, label: &str) -> Option<&LabelSchema>;
}

/// Map-backed schema provider
///
/// Deserializable from JSON of the form:
///
/// ```json
/// {
///   "vertices": {
///     "Person": {
///       "properties": {"id": {"type": "string"}, "age": {"type": "integer"}},
///       "required": ["id"]
///     }
///   },
///   "edges": {}
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticSchema {
    #[serde(default)]
    vertices: HashMap<String, LabelSchema>,
    #[serde(default)]
    edges: HashMap<String, LabelSchema>,
}

impl StaticSchema {
    /// An empty schema: every label loads permissively
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex label schema
    pub fn define_vertex(&mut self, label: impl Into<String>, schema: LabelSchema) -> &mut Self {
        self.vertices.insert(label.into(), schema);
        self
    }

    /// Register an edge label schema
    pub fn define_edge(&mut self, label: impl Into<String>, schema: LabelSchema) -> &mut Self {
        self.edges.insert(label.into(), schema);
        self
    }
}

impl SchemaProvider for StaticSchema {
    fn vertex_schema(&self, label: &str) -> Option<&LabelSchema> {
        self.vertices.get(label)
    }

    fn edge_schema(&self, label: &str) -> Option<&LabelSchema> {
        self.edges.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_type_matching() {
        assert!(PropertyType::String.matches(&json!("hello")));
        assert!(!PropertyType::String.matches(&json!(5)));
        assert!(PropertyType::Integer.matches(&json!(5)));
        assert!(!PropertyType::Integer.matches(&json!(5.5)));
        assert!(PropertyType::Float.matches(&json!(5.5)));
        assert!(PropertyType::Float.matches(&json!(5)));
        assert!(PropertyType::Any.matches(&json!(null)));
    }

    #[test]
    fn test_static_schema_lookup() {
        let mut schema = StaticSchema::new();
        let mut person = LabelSchema::default();
        person
            .properties
            .insert("id".to_string(), PropertyDefinition::new(PropertyType::String));
        person.required.push("id".to_string());
        schema.define_vertex("Person", person);

        assert!(schema.vertex_schema("Person").is_some());
        assert!(schema.vertex_schema("Company").is_none());
        assert!(schema.edge_schema("Person").is_none());

        let person = schema.vertex_schema("Person").unwrap();
        assert!(person.recognizes("id"));
        assert!(!person.recognizes("name"));
    }

    #[test]
    fn test_schema_from_json() {
        let schema: StaticSchema = serde_json::from_value(json!({
            "vertices": {
                "Person": {
                    "properties": {
                        "id": {"type": "string"},
                        "age": {"type": "integer"},
                        "tags": {}
                    },
                    "required": ["id"]
                }
            }
        }))
        .unwrap();

        let person = schema.vertex_schema("Person").unwrap();
        assert_eq!(person.required, vec!["id"]);
        assert_eq!(
            person.properties.get("tags").unwrap().data_type,
            PropertyType::Any
        );
    }
}
