/// Mutation query templates
///
/// The target query engine accepts only literal scalars inline in a
/// graph-pattern statement, so these templates never interpolate data —
/// they dereference a bridge function (see `crate::bridge`) inside an
/// `UNWIND` clause and pick records out of the aggregated payload.
///
/// Labels come from the staged type discriminator. The graph language only
/// accepts literal labels, so one creation statement is generated per
/// staged type, all sharing the same bridge handle.

use crate::error::LoadError;
use crate::types::EntityKind;

/// Check that a name is safe to interpolate as an identifier or label.
///
/// Everything interpolated into statement text (labels, namespaces, graph
/// names, staging/bridge names) must pass this; record data never does.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reject a label that cannot be safely interpolated
pub fn ensure_valid_label(kind: EntityKind, label: &str) -> Result<(), LoadError> {
    if is_valid_identifier(label) {
        Ok(())
    } else {
        Err(LoadError::Validation {
            kind,
            label: label.to_string(),
            message: "label is not a valid identifier".to_string(),
        })
    }
}

/// Statement creating all staged vertices of one type.
///
/// Unwinds the bridged payload, filters on the type discriminator, and
/// creates one vertex per element with the discriminator as its label and
/// the payload as its properties.
pub fn vertex_create_statement(graph: &str, namespace: &str, bridge: &str, vtype: &str) -> String {
    format!(
        "SELECT * FROM cypher('{graph}', $$
    UNWIND {namespace}.{bridge}() AS rec
    WITH rec WHERE rec.type = '{vtype}'
    CREATE (v:{vtype})
    SET v = rec.properties
    RETURN count(v)
$$) AS (created agtype)"
    )
}

/// Statement creating all staged edges of one type.
///
/// Matches both endpoint vertices by their `id` property; only runs after
/// the endpoint check reported zero failing rows.
pub fn edge_create_statement(graph: &str, namespace: &str, bridge: &str, etype: &str) -> String {
    format!(
        "SELECT * FROM cypher('{graph}', $$
    UNWIND {namespace}.{bridge}() AS rec
    WITH rec WHERE rec.type = '{etype}'
    MATCH (a {{id: rec.from}}), (b {{id: rec.to}})
    CREATE (a)-[r:{etype}]->(b)
    SET r = rec.properties
    RETURN count(r)
$$) AS (created agtype)"
    )
}

/// Statement returning, for every staged edge row, whether its endpoints
/// currently resolve to existing vertices in the target graph.
///
/// The check runs against the store, not the current payload, so edges may
/// reference vertices committed by earlier invocations.
pub fn endpoint_check_statement(graph: &str, namespace: &str, staging_table: &str) -> String {
    format!(
        "SELECT s.seq, s.etype, s.from_id, s.to_id,
    EXISTS (
        SELECT 1 FROM \"{graph}\".\"_ag_label_vertex\" v
        WHERE v.properties ->> 'id' = s.from_id
    ) AS from_exists,
    EXISTS (
        SELECT 1 FROM \"{graph}\".\"_ag_label_vertex\" v
        WHERE v.properties ->> 'id' = s.to_id
    ) AS to_exists
FROM \"{namespace}\".\"{staging_table}\" s
ORDER BY s.seq"
    )
}
