//! Mutation and projection surface over a [`CaseStore`].
//!
//! Each call is an independent request. The only retry is identifier
//! allocation: a conflicting insert re-reads the current maximum and tries once
//! more.

use std::collections::BTreeMap;

use crate::error::{CaseError, Rejection, Result};
use crate::ident::next_identifier;
use crate::normalize::{normalize_rows, NormalizedRow};
use crate::projection::{GraphProjectionBuilder, ProjectionOptions};
use crate::rules::RelationRuleEngine;
use crate::store::{CaseStore, QueryParams};
use crate::types::{Category, Entity, LegendEntry, MergeOutcome, Relation, VisualGraph};

/// Allocation attempts per `create_entity` call: the first try plus one retry.
const ALLOCATION_ATTEMPTS: u32 = 2;

/// The case graph service.
pub struct CaseService<S> {
    store: S,
    rules: RelationRuleEngine,
    projection: ProjectionOptions,
}

impl<S: CaseStore> CaseService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            rules: RelationRuleEngine::new(),
            projection: ProjectionOptions::default(),
        }
    }

    /// Set the options used by [`graph_view`](Self::graph_view) and
    /// [`project_graph`](Self::project_graph).
    pub fn with_projection(mut self, options: ProjectionOptions) -> Self {
        self.projection = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &RelationRuleEngine {
        &self.rules
    }

    // ── Entities ─────────────────────────────────────────────────

    /// Create an entity with the next free identifier of its category.
    pub async fn create_entity(&self, category: Category, name: &str) -> Result<Entity> {
        let name = required(name, "name")?;

        let mut attempt = 1;
        loop {
            let current = self.store.max_entity_id(category).await?;
            let entity = Entity {
                id: next_identifier(category, current.as_deref()),
                name: name.to_string(),
                category,
            };

            match self.store.insert_entity(&entity).await {
                Ok(()) => {
                    tracing::info!(%category, id = %entity.id, "Created entity");
                    return Ok(entity);
                }
                Err(CaseError::Conflict(reason)) if attempt < ALLOCATION_ATTEMPTS => {
                    tracing::warn!(%category, id = %entity.id, attempt, %reason, "Identifier taken, reallocating");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Rename an entity.
    pub async fn rename_entity(&self, id: &str, name: &str) -> Result<Entity> {
        let id = required(id, "id")?;
        let name = required(name, "name")?;

        match self.store.rename_entity(id, name).await? {
            Some(entity) => {
                tracing::info!(id, name, "Renamed entity");
                Ok(entity)
            }
            None => Err(CaseError::NotFound { id: id.to_string() }),
        }
    }

    /// Delete an entity and its relations. Returns whether it existed.
    pub async fn delete_entity(&self, id: &str) -> Result<bool> {
        let id = required(id, "id")?;
        let existed = self.store.delete_entity(id).await?;
        tracing::info!(id, existed, "Deleted entity");
        Ok(existed)
    }

    /// Entities of one category ordered by identifier.
    pub async fn list_entities(&self, category: Category) -> Result<Vec<Entity>> {
        self.store.list_entities(category).await
    }

    // ── Relations ────────────────────────────────────────────────

    /// Validate and create a relation. Re-creating an existing relation
    /// succeeds without adding a second one.
    pub async fn create_relation(
        &self,
        rel_type: &str,
        source_id: &str,
        target_id: &str,
        attributes: BTreeMap<String, String>,
    ) -> Result<Relation> {
        let source_id = required(source_id, "source_id")?;
        let target_id = required(target_id, "target_id")?;
        self.rules.lookup(rel_type)?;

        let observed = self.store.endpoint_labels(source_id, target_id).await?;
        let rule = self
            .rules
            .validate(rel_type, source_id, target_id, observed.as_ref())?;

        let outcome = self
            .store
            .merge_relation(&rule, source_id, target_id, &attributes)
            .await?;

        match outcome {
            MergeOutcome::EndpointMissing => Err(Rejection::EndpointNotFound {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
            }
            .into()),
            MergeOutcome::Created | MergeOutcome::AlreadyExists => {
                tracing::info!(
                    rel_type = %rule.rel_type,
                    source_id,
                    target_id,
                    created = outcome == MergeOutcome::Created,
                    "Merged relation"
                );
                Ok(Relation {
                    rel_type: rule.rel_type,
                    source_id: source_id.to_string(),
                    target_id: target_id.to_string(),
                    attributes,
                })
            }
        }
    }

    /// Delete relations of a type between two entities. Returns the count removed.
    pub async fn delete_relation(
        &self,
        rel_type: &str,
        source_id: &str,
        target_id: &str,
    ) -> Result<u64> {
        let source_id = required(source_id, "source_id")?;
        let target_id = required(target_id, "target_id")?;
        let rule = self.rules.lookup(rel_type)?;

        let removed = self
            .store
            .delete_relation(rule.rel_type.as_str(), source_id, target_id)
            .await?;
        tracing::info!(rel_type, source_id, target_id, removed, "Deleted relation");
        Ok(removed)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Run an opaque query and normalize its rows.
    pub async fn query(&self, query: &str, params: QueryParams) -> Result<Vec<NormalizedRow>> {
        let query = required(query, "cypher")?;
        let rows = self.store.execute(query, params).await?;
        Ok(normalize_rows(rows))
    }

    /// Project already-normalized rows with this service's projection options.
    pub fn project_graph(&self, rows: &[NormalizedRow]) -> VisualGraph {
        GraphProjectionBuilder::new(self.projection.clone()).build(rows)
    }

    /// Fetch, normalize, and project the whole graph.
    pub async fn graph_view(&self) -> Result<VisualGraph> {
        let rows = normalize_rows(self.store.snapshot_rows().await?);
        Ok(self.project_graph(&rows))
    }

    pub fn relation_legend(&self) -> Vec<LegendEntry> {
        self.rules.legend()
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CaseError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}
