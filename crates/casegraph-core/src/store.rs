//! Storage seam between the case service and a graph backend.

use std::collections::BTreeMap;
use std::future::Future;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::normalize::StoreRow;
use crate::types::{Category, EndpointLabels, Entity, MergeOutcome, RelationRule};

/// Query parameters for the raw execution channel.
pub type QueryParams = Map<String, Value>;

/// Operations the case service needs from a graph backend.
///
/// Implementations must close the read-then-write races at the write itself:
/// `insert_entity` fails with [`CaseError::Conflict`](crate::CaseError::Conflict)
/// when the id is already taken, and `merge_relation` re-matches both
/// endpoints by category in the same write that creates the relation.
pub trait CaseStore: Send + Sync {
    /// Run an opaque query and return its rows unmodified.
    fn execute(
        &self,
        query: &str,
        params: QueryParams,
    ) -> impl Future<Output = Result<Vec<StoreRow>>> + Send;

    /// Identifier with the largest numeric suffix in `category`, if any.
    fn max_entity_id(&self, category: Category)
        -> impl Future<Output = Result<Option<String>>> + Send;

    /// Create-only write; conflicts when the id already exists.
    fn insert_entity(&self, entity: &Entity) -> impl Future<Output = Result<()>> + Send;

    /// Labels of both endpoints, or `None` if either id matches nothing.
    fn endpoint_labels(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> impl Future<Output = Result<Option<EndpointLabels>>> + Send;

    /// Existence-guarded upsert of `(source)-[rule.rel_type]->(target)`.
    fn merge_relation(
        &self,
        rule: &RelationRule,
        source_id: &str,
        target_id: &str,
        attributes: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<MergeOutcome>> + Send;

    /// Delete an entity and every relation touching it. Returns whether it existed.
    fn delete_entity(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Delete relations of `rel_type` from `source_id` to `target_id`. Returns the count removed.
    fn delete_relation(
        &self,
        rel_type: &str,
        source_id: &str,
        target_id: &str,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Set a new name; `None` when no entity has `id`.
    fn rename_entity(
        &self,
        id: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<Entity>>> + Send;

    /// All entities of `category`, ordered by numeric id suffix.
    fn list_entities(&self, category: Category)
        -> impl Future<Output = Result<Vec<Entity>>> + Send;

    /// Whole-graph snapshot: one row per outgoing relation (or per isolated
    /// entity), with fields `n`, `r`, `m` as store values.
    fn snapshot_rows(&self) -> impl Future<Output = Result<Vec<StoreRow>>> + Send;
}
