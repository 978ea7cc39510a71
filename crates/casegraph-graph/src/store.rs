//! [`CaseStore`] implementation over the Neo4j client.

use std::collections::BTreeMap;

use casegraph_core::error::Result;
use casegraph_core::{
    CaseStore, Category, EndpointLabels, Entity, MergeOutcome, QueryParams, RelationRule, StoreRow,
};

use crate::client::GraphClient;

impl CaseStore for GraphClient {
    async fn execute(&self, query: &str, params: QueryParams) -> Result<Vec<StoreRow>> {
        Ok(self.execute_raw(query, &params).await?)
    }

    async fn max_entity_id(&self, category: Category) -> Result<Option<String>> {
        Ok(self.max_id(category).await?)
    }

    async fn insert_entity(&self, entity: &Entity) -> Result<()> {
        Ok(self.create_entity(entity).await?)
    }

    async fn endpoint_labels(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> Result<Option<EndpointLabels>> {
        Ok(self.labels_of(source_id, target_id).await?)
    }

    async fn merge_relation(
        &self,
        rule: &RelationRule,
        source_id: &str,
        target_id: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<MergeOutcome> {
        Ok(self
            .upsert_relation(rule, source_id, target_id, attributes)
            .await?)
    }

    async fn delete_entity(&self, id: &str) -> Result<bool> {
        Ok(self.delete_entity_node(id).await?)
    }

    async fn delete_relation(&self, rel_type: &str, source_id: &str, target_id: &str) -> Result<u64> {
        Ok(self
            .delete_relation_edges(rel_type, source_id, target_id)
            .await?)
    }

    async fn rename_entity(&self, id: &str, name: &str) -> Result<Option<Entity>> {
        Ok(self.set_entity_name(id, name).await?)
    }

    async fn list_entities(&self, category: Category) -> Result<Vec<Entity>> {
        Ok(self.entities(category).await?)
    }

    async fn snapshot_rows(&self) -> Result<Vec<StoreRow>> {
        Ok(self.snapshot().await?)
    }
}
