//! Conversion between Bolt values and the core's store-neutral values.

use std::collections::{BTreeMap, HashMap};

use casegraph_core::{QueryParams, StoreRow, StoreValue};
use neo4rs::{BoltMap, BoltType};
use serde_json::Value;

use crate::client::GraphError;

/// Convert a driver row into a core row.
///
/// Driver rows do not keep column order, so columns are sorted by name.
pub fn store_row(row: &neo4rs::Row) -> Result<StoreRow, GraphError> {
    let map: BoltMap = row
        .to()
        .map_err(|e| GraphError::Serialization(format!("Failed to read row: {e}")))?;
    Ok(bolt_columns(map))
}

fn bolt_columns(map: BoltMap) -> StoreRow {
    let mut columns: StoreRow = map
        .value
        .into_iter()
        .map(|(k, v)| (k.value, store_value(v)))
        .collect();
    columns.sort_by(|a, b| a.0.cmp(&b.0));
    columns
}

/// Text form of an `id` property. Integer ids are accepted as their digits.
pub fn id_text(value: BoltType) -> Option<String> {
    match value {
        BoltType::String(s) => Some(s.value),
        BoltType::Integer(i) => Some(i.value.to_string()),
        _ => None,
    }
}

/// Convert a Bolt value into a store value.
///
/// Temporal, spatial, path, and byte values have no plain counterpart and
/// are carried as their debug text.
pub fn store_value(value: BoltType) -> StoreValue {
    match value {
        BoltType::Null(_) => StoreValue::Null,
        BoltType::Boolean(b) => StoreValue::Boolean(b.value),
        BoltType::Integer(i) => StoreValue::Integer(i.value),
        BoltType::Float(f) => StoreValue::Float(f.value),
        BoltType::String(s) => StoreValue::String(s.value),
        BoltType::List(list) => StoreValue::List(list.value.into_iter().map(store_value).collect()),
        BoltType::Map(map) => StoreValue::Map(properties(map)),
        BoltType::Node(node) => StoreValue::Node {
            labels: node
                .labels
                .value
                .into_iter()
                .filter_map(|l| match l {
                    BoltType::String(s) => Some(s.value),
                    _ => None,
                })
                .collect(),
            properties: properties(node.properties),
        },
        BoltType::Relation(rel) => StoreValue::Relation {
            rel_type: rel.typ.value,
            properties: properties(rel.properties),
        },
        BoltType::UnboundedRelation(rel) => StoreValue::Relation {
            rel_type: rel.typ.value,
            properties: properties(rel.properties),
        },
        other => {
            tracing::debug!(value = ?other, "Carrying Bolt value as text");
            StoreValue::String(format!("{other:?}"))
        }
    }
}

fn properties(map: BoltMap) -> BTreeMap<String, StoreValue> {
    map.value
        .into_iter()
        .map(|(k, v)| (k.value, store_value(v)))
        .collect()
}

/// Convert a JSON parameter value into a Bolt value.
pub fn bolt_param(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(neo4rs::BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::from(i),
            None => BoltType::from(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => BoltType::from(s.clone()),
        Value::Array(items) => BoltType::from(items.iter().map(bolt_param).collect::<Vec<_>>()),
        Value::Object(entries) => BoltType::from(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), bolt_param(v)))
                .collect::<HashMap<String, BoltType>>(),
        ),
    }
}

/// Attach every entry of `params` to `query`.
pub fn with_params(mut query: neo4rs::Query, params: &QueryParams) -> neo4rs::Query {
    for (key, value) in params {
        query = query.param(key, bolt_param(value));
    }
    query
}
