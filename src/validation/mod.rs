/// Record validation against label schemas
///
/// Validation runs before any database write; a required-property violation
/// aborts the entire kind before a staging table is created. Labels absent
/// from the schema validate permissively (edges still need endpoints).

use crate::schema::{LabelSchema, SchemaProvider};
use crate::types::graph_data::{endpoint_id, Record};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Validation failures, detected before any write
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required property is missing or null
    #[error("required property '{property}' is missing on {label} record {index}")]
    MissingRequired {
        label: String,
        index: usize,
        property: String,
    },

    /// A property value has the wrong type
    #[error("property '{property}' on {label} record {index} has the wrong type (got {actual})")]
    WrongType {
        label: String,
        index: usize,
        property: String,
        actual: &'static str,
    },

    /// An edge record is missing its `from` or `to` endpoint reference
    #[error("edge {label} record {index} is missing endpoint '{endpoint}'")]
    MissingEndpoint {
        label: String,
        index: usize,
        endpoint: &'static str,
    },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate one vertex record against its label schema
pub fn validate_vertex(
    schema: &dyn SchemaProvider,
    label: &str,
    index: usize,
    record: &Record,
) -> ValidationResult<()> {
    if let Some(label_schema) = schema.vertex_schema(label) {
        check_against_schema(label_schema, label, index, record)?;
    }
    Ok(())
}

/// Validate one edge record: endpoint references first, then schema checks
pub fn validate_edge(
    schema: &dyn SchemaProvider,
    label: &str,
    index: usize,
    record: &Record,
) -> ValidationResult<()> {
    for endpoint in ["from", "to"] {
        if endpoint_id(record, endpoint).is_none() {
            return Err(ValidationError::MissingEndpoint {
                label: label.to_string(),
                index,
                endpoint: if endpoint == "from" { "from" } else { "to" },
            });
        }
    }
    if let Some(label_schema) = schema.edge_schema(label) {
        check_against_schema(label_schema, label, index, record)?;
    }
    Ok(())
}

fn check_against_schema(
    label_schema: &LabelSchema,
    label: &str,
    index: usize,
    record: &Record,
) -> ValidationResult<()> {
    for required in &label_schema.required {
        match record.get(required) {
            None | Some(JsonValue::Null) => {
                return Err(ValidationError::MissingRequired {
                    label: label.to_string(),
                    index,
                    property: required.clone(),
                });
            }
            Some(_) => {}
        }
    }

    for (key, value) in record {
        if let Some(definition) = label_schema.properties.get(key) {
            if !value.is_null() && !definition.data_type.matches(value) {
                return Err(ValidationError::WrongType {
                    label: label.to_string(),
                    index,
                    property: key.clone(),
                    actual: json_kind(value),
                });
            }
        }
    }

    Ok(())
}

/// Extract the schema-recognized properties of a record.
///
/// With a label schema, only recognized keys survive (reserved edge keys
/// `from`/`to` are always excluded from properties). Without one, every
/// non-reserved key is kept — the intentional permissive fallback.
pub fn filter_properties(
    label_schema: Option<&LabelSchema>,
    record: &Record,
    is_edge: bool,
) -> serde_json::Map<String, JsonValue> {
    record
        .iter()
        .filter(|(key, _)| !(is_edge && (key.as_str() == "from" || key.as_str() == "to")))
        .filter(|(key, _)| label_schema.map_or(true, |schema| schema.recognizes(key)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyDefinition, PropertyType, StaticSchema};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn person_schema() -> StaticSchema {
        let mut schema = StaticSchema::new();
        let mut person = LabelSchema::default();
        person
            .properties
            .insert("id".to_string(), PropertyDefinition::new(PropertyType::String));
        person
            .properties
            .insert("age".to_string(), PropertyDefinition::new(PropertyType::Integer));
        person.required.push("id".to_string());
        schema.define_vertex("Person", person);

        let mut works_at = LabelSchema::default();
        works_at
            .properties
            .insert("since".to_string(), PropertyDefinition::new(PropertyType::Integer));
        schema.define_edge("WORKS_AT", works_at);
        schema
    }

    #[test]
    fn test_valid_vertex() {
        let schema = person_schema();
        let rec = record(json!({"id": "1", "age": 30}));
        assert!(validate_vertex(&schema, "Person", 0, &rec).is_ok());
    }

    #[test]
    fn test_missing_required_property() {
        let schema = person_schema();
        let rec = record(json!({"age": 30}));
        let err = validate_vertex(&schema, "Person", 2, &rec).unwrap_err();
        assert!(matches!(err, ValidationError::MissingRequired { .. }));
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_null_required_property_rejected() {
        let schema = person_schema();
        let rec = record(json!({"id": null}));
        assert!(validate_vertex(&schema, "Person", 0, &rec).is_err());
    }

    #[test]
    fn test_wrong_property_type() {
        let schema = person_schema();
        let rec = record(json!({"id": "1", "age": "thirty"}));
        let err = validate_vertex(&schema, "Person", 0, &rec).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { .. }));
    }

    #[test]
    fn test_unknown_label_is_permissive() {
        let schema = person_schema();
        let rec = record(json!({"anything": [1, 2, 3]}));
        assert!(validate_vertex(&schema, "Robot", 0, &rec).is_ok());
    }

    #[test]
    fn test_edge_requires_endpoints() {
        let schema = person_schema();
        let rec = record(json!({"from": "1", "since": 2015}));
        let err = validate_edge(&schema, "WORKS_AT", 0, &rec).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingEndpoint { endpoint: "to", .. }
        ));

        let rec = record(json!({"from": "1", "to": "2", "since": 2015}));
        assert!(validate_edge(&schema, "WORKS_AT", 0, &rec).is_ok());
    }

    #[test]
    fn test_filter_properties_with_schema() {
        let schema = person_schema();
        let rec = record(json!({"id": "1", "age": 30, "nickname": "Al"}));
        let props = filter_properties(schema.vertex_schema("Person"), &rec, false);
        assert!(props.contains_key("id"));
        assert!(props.contains_key("age"));
        assert!(!props.contains_key("nickname"));
    }

    #[test]
    fn test_filter_properties_permissive_and_reserved_keys() {
        let rec = record(json!({"from": "1", "to": "2", "since": 2015}));
        let props = filter_properties(None, &rec, true);
        assert_eq!(props.len(), 1);
        assert!(props.contains_key("since"));
    }
}
