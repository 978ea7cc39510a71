//! Read operations against the case graph.

use casegraph_core::ident::max_identifier;
use casegraph_core::ident::numeric_suffix;
use casegraph_core::{Category, EndpointLabels, Entity, QueryParams, StoreRow};
use neo4rs::{query, BoltType};

use crate::client::{GraphClient, GraphError};
use crate::convert::{id_text, store_row, with_params};

/// Whole-graph snapshot: every node, each outgoing relation as its own row.
const SNAPSHOT_QUERY: &str = "MATCH (n)
     OPTIONAL MATCH (n)-[r]->(m)
     RETURN n, r, m";

impl GraphClient {
    // ── Raw Queries ──────────────────────────────────────────────

    /// Run caller-supplied Cypher and convert every row.
    pub async fn execute_raw(
        &self,
        cypher: &str,
        params: &QueryParams,
    ) -> Result<Vec<StoreRow>, GraphError> {
        let q = with_params(query(cypher), params);
        let rows = self.query_rows(q).await?;
        rows.iter().map(store_row).collect()
    }

    /// Every node with its outgoing relations, as `n`, `r`, `m` columns.
    pub async fn snapshot(&self) -> Result<Vec<StoreRow>, GraphError> {
        let rows = self.query_rows(query(SNAPSHOT_QUERY)).await?;
        rows.iter().map(store_row).collect()
    }

    // ── Entity Lookups ───────────────────────────────────────────

    /// All identifiers in a category.
    pub async fn entity_ids(&self, category: Category) -> Result<Vec<String>, GraphError> {
        let cypher = format!(
            "MATCH (n:{label})
             WHERE n.id IS NOT NULL
             RETURN n.id AS id",
            label = category.label()
        );

        let rows = self.query_rows(query(&cypher)).await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            match row.get::<BoltType>("id").ok().and_then(id_text) {
                Some(id) => ids.push(id),
                None => tracing::debug!(%category, "Skipping node with non-scalar id"),
            }
        }
        Ok(ids)
    }

    /// Identifier with the largest numeric suffix in a category.
    pub async fn max_id(&self, category: Category) -> Result<Option<String>, GraphError> {
        let ids = self.entity_ids(category).await?;
        Ok(max_identifier(ids.iter().map(String::as_str)).map(str::to_string))
    }

    /// All entities in a category, ordered by numeric suffix.
    pub async fn entities(&self, category: Category) -> Result<Vec<Entity>, GraphError> {
        let cypher = format!(
            "MATCH (n:{label})
             WHERE n.id IS NOT NULL
             RETURN n.id AS id, n.name AS name",
            label = category.label()
        );

        let rows = self.query_rows(query(&cypher)).await?;
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row
                .get("id")
                .map_err(|e| GraphError::Serialization(format!("Failed to read entity id: {e}")))?;
            entities.push(Entity {
                id,
                name: row.get::<String>("name").unwrap_or_default(),
                category,
            });
        }
        entities.sort_by_key(|e| numeric_suffix(&e.id));
        Ok(entities)
    }

    /// Labels of two entities, or `None` when either id matches nothing.
    pub async fn labels_of(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> Result<Option<EndpointLabels>, GraphError> {
        let q = query(
            "MATCH (a {id: $source_id}), (b {id: $target_id})
             RETURN labels(a) AS source_labels, labels(b) AS target_labels
             LIMIT 1",
        )
        .param("source_id", source_id.to_string())
        .param("target_id", target_id.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(Some(EndpointLabels {
                source: row.get("source_labels").unwrap_or_default(),
                target: row.get("target_labels").unwrap_or_default(),
            })),
            None => Ok(None),
        }
    }
}
