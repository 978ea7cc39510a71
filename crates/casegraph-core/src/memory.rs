//! In-process [`CaseStore`] backed by ordered maps.
//!
//! Used for tests and offline runs. It enforces the same write guarantees as
//! the Neo4j store: create-only entity inserts and endpoint-guarded relation
//! merges, each under a single lock acquisition.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{CaseError, Result};
use crate::ident::numeric_suffix;
use crate::normalize::{StoreRow, StoreValue};
use crate::store::{CaseStore, QueryParams};
use crate::types::{Category, EndpointLabels, Entity, MergeOutcome, RelationRule};

#[derive(Debug, Clone)]
struct StoredRelation {
    rel_type: String,
    source_id: String,
    target_id: String,
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    entities: BTreeMap<String, Entity>,
    relations: Vec<StoredRelation>,
}

/// Map-backed case store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed entities directly, bypassing allocation.
    pub fn with_entities<I: IntoIterator<Item = Entity>>(entities: I) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for e in entities {
                state.entities.insert(e.id.clone(), e);
            }
        }
        store
    }

    pub fn entity(&self, id: &str) -> Option<Entity> {
        self.lock().entities.get(id).cloned()
    }

    pub fn relation_count(&self) -> usize {
        self.lock().relations.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every write completes under one acquisition, so poisoned state is intact.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn node_value(entity: &Entity) -> StoreValue {
    let properties = BTreeMap::from([
        ("id".to_string(), StoreValue::String(entity.id.clone())),
        ("name".to_string(), StoreValue::String(entity.name.clone())),
    ]);
    StoreValue::Node {
        labels: vec![entity.category.label().to_string()],
        properties,
    }
}

fn relation_value(rel: &StoredRelation) -> StoreValue {
    StoreValue::Relation {
        rel_type: rel.rel_type.clone(),
        properties: rel
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), StoreValue::String(v.clone())))
            .collect(),
    }
}

impl CaseStore for MemoryStore {
    async fn execute(&self, _query: &str, _params: QueryParams) -> Result<Vec<StoreRow>> {
        Err(CaseError::Execution(
            "raw queries are not supported by the in-memory store".to_string(),
        ))
    }

    async fn max_entity_id(&self, category: Category) -> Result<Option<String>> {
        let state = self.lock();
        let max = state
            .entities
            .values()
            .filter(|e| e.category == category)
            .max_by_key(|e| numeric_suffix(&e.id))
            .map(|e| e.id.clone());
        Ok(max)
    }

    async fn insert_entity(&self, entity: &Entity) -> Result<()> {
        let mut state = self.lock();
        if state.entities.contains_key(&entity.id) {
            return Err(CaseError::Conflict(format!(
                "entity {} already exists",
                entity.id
            )));
        }
        state.entities.insert(entity.id.clone(), entity.clone());
        Ok(())
    }

    async fn endpoint_labels(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> Result<Option<EndpointLabels>> {
        let state = self.lock();
        let (Some(source), Some(target)) =
            (state.entities.get(source_id), state.entities.get(target_id))
        else {
            return Ok(None);
        };
        Ok(Some(EndpointLabels {
            source: vec![source.category.label().to_string()],
            target: vec![target.category.label().to_string()],
        }))
    }

    async fn merge_relation(
        &self,
        rule: &RelationRule,
        source_id: &str,
        target_id: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<MergeOutcome> {
        let mut state = self.lock();
        let source_ok = state
            .entities
            .get(source_id)
            .is_some_and(|e| e.category == rule.source);
        let target_ok = state
            .entities
            .get(target_id)
            .is_some_and(|e| e.category == rule.target);
        if !source_ok || !target_ok {
            return Ok(MergeOutcome::EndpointMissing);
        }

        let rel_type = rule.rel_type.as_str();
        if let Some(existing) = state.relations.iter_mut().find(|r| {
            r.rel_type == rel_type && r.source_id == source_id && r.target_id == target_id
        }) {
            existing
                .attributes
                .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
            return Ok(MergeOutcome::AlreadyExists);
        }

        state.relations.push(StoredRelation {
            rel_type: rel_type.to_string(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            attributes: attributes.clone(),
        });
        Ok(MergeOutcome::Created)
    }

    async fn delete_entity(&self, id: &str) -> Result<bool> {
        let mut state = self.lock();
        let existed = state.entities.remove(id).is_some();
        state
            .relations
            .retain(|r| r.source_id != id && r.target_id != id);
        Ok(existed)
    }

    async fn delete_relation(&self, rel_type: &str, source_id: &str, target_id: &str) -> Result<u64> {
        let mut state = self.lock();
        let before = state.relations.len();
        state.relations.retain(|r| {
            !(r.rel_type == rel_type && r.source_id == source_id && r.target_id == target_id)
        });
        Ok((before - state.relations.len()) as u64)
    }

    async fn rename_entity(&self, id: &str, name: &str) -> Result<Option<Entity>> {
        let mut state = self.lock();
        Ok(state.entities.get_mut(id).map(|e| {
            e.name = name.to_string();
            e.clone()
        }))
    }

    async fn list_entities(&self, category: Category) -> Result<Vec<Entity>> {
        let state = self.lock();
        let mut entities: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| e.category == category)
            .cloned()
            .collect();
        entities.sort_by_key(|e| numeric_suffix(&e.id));
        Ok(entities)
    }

    async fn snapshot_rows(&self) -> Result<Vec<StoreRow>> {
        let state = self.lock();
        let mut rows = Vec::new();
        for entity in state.entities.values() {
            let outgoing: Vec<&StoredRelation> = state
                .relations
                .iter()
                .filter(|r| r.source_id == entity.id)
                .collect();

            if outgoing.is_empty() {
                rows.push(vec![
                    ("n".to_string(), node_value(entity)),
                    ("r".to_string(), StoreValue::Null),
                    ("m".to_string(), StoreValue::Null),
                ]);
                continue;
            }
            for rel in outgoing {
                let target = state
                    .entities
                    .get(&rel.target_id)
                    .map_or(StoreValue::Null, node_value);
                rows.push(vec![
                    ("n".to_string(), node_value(entity)),
                    ("r".to_string(), relation_value(rel)),
                    ("m".to_string(), target),
                ]);
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationType;

    fn entity(id: &str, name: &str, category: Category) -> Entity {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
            category,
        }
    }

    fn rule(rel_type: RelationType, source: Category, target: Category) -> RelationRule {
        RelationRule {
            rel_type,
            source,
            target,
        }
    }

    #[tokio::test]
    async fn test_max_entity_id_uses_numeric_order() {
        let store = MemoryStore::with_entities([
            entity("S9", "a", Category::Suspect),
            entity("S10", "b", Category::Suspect),
            entity("W50", "c", Category::Witness),
        ]);
        assert_eq!(
            store.max_entity_id(Category::Suspect).await.unwrap(),
            Some("S10".to_string())
        );
        assert_eq!(store.max_entity_id(Category::Victim).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_conflicts_on_existing_id() {
        let store = MemoryStore::with_entities([entity("S1", "a", Category::Suspect)]);
        let err = store
            .insert_entity(&entity("S1", "b", Category::Suspect))
            .await
            .unwrap_err();
        assert!(matches!(err, CaseError::Conflict(_)));
        assert_eq!(store.entity("S1").unwrap().name, "a");
    }

    #[tokio::test]
    async fn test_merge_is_idempotent_and_guarded() {
        let store = MemoryStore::with_entities([
            entity("E1", "knife", Category::Evidence),
            entity("C1", "kitchen", Category::CrimeScene),
        ]);
        let found_at = rule(RelationType::FoundAt, Category::Evidence, Category::CrimeScene);
        let attrs = BTreeMap::new();

        assert_eq!(
            store.merge_relation(&found_at, "E1", "C1", &attrs).await.unwrap(),
            MergeOutcome::Created
        );
        assert_eq!(
            store.merge_relation(&found_at, "E1", "C1", &attrs).await.unwrap(),
            MergeOutcome::AlreadyExists
        );
        assert_eq!(store.relation_count(), 1);

        assert_eq!(
            store.merge_relation(&found_at, "E1", "C2", &attrs).await.unwrap(),
            MergeOutcome::EndpointMissing
        );
    }

    #[tokio::test]
    async fn test_delete_entity_cascades() {
        let store = MemoryStore::with_entities([
            entity("W1", "anna", Category::Witness),
            entity("S1", "john", Category::Suspect),
        ]);
        let witnessed = rule(RelationType::Witnessed, Category::Witness, Category::Suspect);
        store
            .merge_relation(&witnessed, "W1", "S1", &BTreeMap::new())
            .await
            .unwrap();

        assert!(store.delete_entity("S1").await.unwrap());
        assert_eq!(store.relation_count(), 0);
        assert!(!store.delete_entity("S1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_entities_sorted_by_suffix() {
        let store = MemoryStore::with_entities([
            entity("S10", "b", Category::Suspect),
            entity("S2", "a", Category::Suspect),
            entity("W1", "c", Category::Witness),
        ]);
        let ids: Vec<String> = store
            .list_entities(Category::Suspect)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["S2", "S10"]);
        assert!(store.list_entities(Category::Victim).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_rows_cover_isolated_entities() {
        let store = MemoryStore::with_entities([
            entity("V1", "eve", Category::Victim),
            entity("C1", "park", Category::CrimeScene),
        ]);
        let killed_at = rule(RelationType::KilledAt, Category::Victim, Category::CrimeScene);
        store
            .merge_relation(&killed_at, "V1", "C1", &BTreeMap::new())
            .await
            .unwrap();

        let rows = store.snapshot_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        let with_relation = rows
            .iter()
            .find(|row| matches!(row[1].1, StoreValue::Relation { .. }))
            .unwrap();
        assert!(matches!(&with_relation[2].1, StoreValue::Node { labels, .. } if labels == &["CrimeScene"]));
    }
}
