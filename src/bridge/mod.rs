/// Value bridge
///
/// The graph-pattern language accepts only literal scalars inline; it has
/// no parameter binding for composite values. The bridge converts the
/// staged payload into a zero-argument function whose body aggregates
/// every staging row into one JSON array, so a graph statement can
/// dereference it inside an `UNWIND` clause as though it were a literal
/// subquery result.

use crate::backend::SharedTransaction;
use crate::error::LoadError;
use crate::staging::StagingTable;
use crate::types::EntityKind;
use tracing::debug;

/// Handle to one invocation's bridge function
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    namespace: String,
    name: String,
    kind: EntityKind,
}

impl BridgeHandle {
    /// Derive the bridge handle for one invocation token
    pub fn new(namespace: &str, kind: EntityKind, token: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: format!("bridge_{}_{}", kind.name(), token),
            kind,
        }
    }

    /// Unqualified function name, as referenced from graph statements
    pub fn name(&self) -> &str {
        &self.name
    }

    fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", self.namespace, self.name)
    }

    /// Define the bridge function over the staging relation.
    ///
    /// Uses `CREATE OR REPLACE`, so re-creation under the same name is
    /// safe and a retried attempt never hits a duplicate-object error.
    /// A single DDL statement: the function is never partially created.
    pub async fn create(
        &self,
        tx: &SharedTransaction,
        staging: &StagingTable,
    ) -> Result<(), LoadError> {
        let element = match self.kind {
            EntityKind::Vertex => {
                "jsonb_build_object('type', vtype, 'properties', properties)"
            }
            EntityKind::Edge => {
                "jsonb_build_object('type', etype, 'from', from_id, 'to', to_id, 'properties', properties)"
            }
        };
        let sql = format!(
            "CREATE OR REPLACE FUNCTION {}() RETURNS jsonb AS $fn$
    SELECT COALESCE(jsonb_agg({} ORDER BY seq), '[]'::jsonb)
    FROM \"{}\".\"{}\"
$fn$ LANGUAGE sql STABLE",
            self.qualified(),
            element,
            staging.namespace(),
            staging.name()
        );
        debug!(bridge = %self.name, staging = %staging.name(), "creating bridge function");
        tx.execute(&sql, Vec::new())
            .await
            .map_err(|source| LoadError::Mutation {
                context: format!("creating bridge function {}", self.name),
                source,
            })?;
        Ok(())
    }

    /// Drop the bridge function. Best effort: failures surface as
    /// `Cleanup` errors for the caller to downgrade to warnings.
    pub async fn drop(&self, tx: &SharedTransaction) -> Result<(), LoadError> {
        let sql = format!("DROP FUNCTION IF EXISTS {}()", self.qualified());
        tx.execute(&sql, Vec::new())
            .await
            .map_err(|e| LoadError::Cleanup(format!("dropping bridge function {}: {}", self.name, e)))?;
        Ok(())
    }
}
