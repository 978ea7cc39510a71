//! Write operations for the case graph.
//!
//! Entity inserts are create-only and relation writes are MERGE upserts that
//! re-match both endpoints by category. Both rely on the per-category
//! uniqueness constraints installed by [`GraphClient::ensure_schema`].

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use neo4rs::query;

use casegraph_core::{Category, Entity, MergeOutcome, RelationRule};

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    // ── Schema ───────────────────────────────────────────────────

    /// Install a uniqueness constraint on `id` for every category label.
    pub async fn ensure_schema(&self) -> Result<(), GraphError> {
        for category in Category::ALL {
            let label = category.label();
            let cypher = format!(
                "CREATE CONSTRAINT {name} IF NOT EXISTS
                 FOR (n:{label}) REQUIRE n.id IS UNIQUE",
                name = constraint_name(category)
            );
            self.run(query(&cypher)).await?;
            tracing::debug!(label, "Ensured id uniqueness constraint");
        }
        Ok(())
    }

    // ── Entities ─────────────────────────────────────────────────

    /// Create an entity node; fails with [`GraphError::Conflict`] when a node
    /// with the same label and id already exists.
    pub async fn create_entity(&self, entity: &Entity) -> Result<(), GraphError> {
        let now = Utc::now().to_rfc3339();
        let cypher = format!(
            "MERGE (n:{label} {{id: $id}})
             ON CREATE SET n.name = $name, n.created_at = $now
             RETURN n.created_at = $now AS created",
            label = entity.category.label()
        );

        let q = query(&cypher)
            .param("id", entity.id.clone())
            .param("name", entity.name.clone())
            .param("now", now);

        let created = match self.query_one(q).await? {
            Some(row) => row.get::<bool>("created").unwrap_or(false),
            None => false,
        };
        if created {
            Ok(())
        } else {
            Err(GraphError::Conflict(format!(
                "{} {} already exists",
                entity.category, entity.id
            )))
        }
    }

    /// Set an entity's name. Returns `None` when no node has `id`.
    pub async fn set_entity_name(&self, id: &str, name: &str) -> Result<Option<Entity>, GraphError> {
        let q = query(
            "MATCH (n {id: $id})
             SET n.name = $name, n.updated_at = $now
             RETURN labels(n) AS labels, n.id AS id, n.name AS name",
        )
        .param("id", id.to_string())
        .param("name", name.to_string())
        .param("now", Utc::now().to_rfc3339());

        let Some(row) = self.query_one(q).await? else {
            return Ok(None);
        };

        let labels: Vec<String> = row.get("labels").unwrap_or_default();
        let category = Category::from_labels(&labels)
            .or_else(|| Category::from_id_prefix(id))
            .ok_or_else(|| {
                GraphError::Serialization(format!(
                    "Node {id} has no case category (labels: {})",
                    labels.join(", ")
                ))
            })?;

        Ok(Some(Entity {
            id: row.get::<String>("id").unwrap_or_else(|_| id.to_string()),
            name: row.get::<String>("name").unwrap_or_else(|_| name.to_string()),
            category,
        }))
    }

    /// Delete a node and all relations touching it.
    /// Returns whether the node existed.
    pub async fn delete_entity_node(&self, id: &str) -> Result<bool, GraphError> {
        let q = query(
            "MATCH (n {id: $id})
             DETACH DELETE n
             RETURN count(n) AS cnt",
        )
        .param("id", id.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0) > 0),
            None => Ok(false),
        }
    }

    // ── Relations ────────────────────────────────────────────────

    /// Upsert `(source)-[rule.rel_type]->(target)`, matching both endpoints by
    /// their required category in the same statement.
    pub async fn upsert_relation(
        &self,
        rule: &RelationRule,
        source_id: &str,
        target_id: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<MergeOutcome, GraphError> {
        let now = Utc::now().to_rfc3339();
        let cypher = format!(
            "MATCH (a:{source} {{id: $source_id}})
             MATCH (b:{target} {{id: $target_id}})
             MERGE (a)-[r:{rel_type}]->(b)
             ON CREATE SET r.created_at = $now
             SET r += $attributes
             RETURN r.created_at = $now AS created",
            source = rule.source.label(),
            target = rule.target.label(),
            rel_type = rule.rel_type.as_str(),
        );

        let attributes: HashMap<String, String> = attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let q = query(&cypher)
            .param("source_id", source_id.to_string())
            .param("target_id", target_id.to_string())
            .param("attributes", attributes)
            .param("now", now);

        match self.query_one(q).await? {
            Some(row) if row.get::<bool>("created").unwrap_or(false) => Ok(MergeOutcome::Created),
            Some(_) => Ok(MergeOutcome::AlreadyExists),
            None => Ok(MergeOutcome::EndpointMissing),
        }
    }

    /// Delete relations of one type between two nodes.
    /// `rel_type` must come from the rule table; it is interpolated into Cypher.
    pub async fn delete_relation_edges(
        &self,
        rel_type: &str,
        source_id: &str,
        target_id: &str,
    ) -> Result<u64, GraphError> {
        let cypher = format!(
            "MATCH (a {{id: $source_id}})-[r:{rel_type}]->(b {{id: $target_id}})
             DELETE r
             RETURN count(r) AS cnt"
        );

        let q = query(&cypher)
            .param("source_id", source_id.to_string())
            .param("target_id", target_id.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0).max(0) as u64),
            None => Ok(0),
        }
    }
}

/// Constraint name for a category, e.g. `crime_scene_id_unique`.
fn constraint_name(category: Category) -> String {
    let mut name = String::new();
    for (i, c) in category.label().chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            name.push('_');
        }
        name.push(c.to_ascii_lowercase());
    }
    name.push_str("_id_unique");
    name
}
