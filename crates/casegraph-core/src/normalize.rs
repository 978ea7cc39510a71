//! Flattening of store-native result rows into plain JSON records.
//!
//! The graph driver hands back wrapped values (nodes with label sets,
//! relationships with a type, typed integers). Everything downstream, the
//! projection builder and the CLI output, works on plain `serde_json` maps.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// A value as returned by the query execution channel.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<StoreValue>),
    Map(BTreeMap<String, StoreValue>),
    Node {
        labels: Vec<String>,
        properties: BTreeMap<String, StoreValue>,
    },
    Relation {
        rel_type: String,
        properties: BTreeMap<String, StoreValue>,
    },
}

impl From<&str> for StoreValue {
    fn from(s: &str) -> Self {
        StoreValue::String(s.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(s: String) -> Self {
        StoreValue::String(s)
    }
}

impl From<i64> for StoreValue {
    fn from(i: i64) -> Self {
        StoreValue::Integer(i)
    }
}

/// One result row, in column order.
pub type StoreRow = Vec<(String, StoreValue)>;

/// One normalized row. Field order follows the source row.
pub type NormalizedRow = Map<String, Value>;

/// Suffix of the sibling field carrying a node's labels.
pub const LABELS_SUFFIX: &str = "_labels";

/// Suffix of the sibling field carrying a relationship's type.
pub const TYPE_SUFFIX: &str = "_type";

/// Normalize every row, preserving row order.
pub fn normalize_rows(rows: Vec<StoreRow>) -> Vec<NormalizedRow> {
    rows.into_iter().map(normalize_row).collect()
}

/// Normalize one row.
///
/// Nodes become their property map plus a `<field>_labels` sibling;
/// relationships become their property map plus a `<field>_type` sibling.
/// Any other value is converted in place.
pub fn normalize_row(row: StoreRow) -> NormalizedRow {
    let mut out = Map::with_capacity(row.len());
    for (field, value) in row {
        match value {
            StoreValue::Node { labels, properties } => {
                out.insert(field.clone(), flatten_properties(properties));
                let labels = labels.into_iter().map(Value::String).collect();
                out.insert(format!("{field}{LABELS_SUFFIX}"), Value::Array(labels));
            }
            StoreValue::Relation {
                rel_type,
                properties,
            } => {
                out.insert(field.clone(), flatten_properties(properties));
                out.insert(format!("{field}{TYPE_SUFFIX}"), Value::String(rel_type));
            }
            other => {
                out.insert(field, normalize_value(other));
            }
        }
    }
    out
}

/// Convert a single store value to plain JSON.
///
/// Nested nodes and relationships (inside lists or maps) lose their label and
/// type metadata; only top-level fields get sibling columns.
pub fn normalize_value(value: StoreValue) -> Value {
    match value {
        StoreValue::Null => Value::Null,
        StoreValue::Boolean(b) => Value::Bool(b),
        StoreValue::Integer(i) => Value::Number(i.into()),
        StoreValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        StoreValue::String(s) => Value::String(s),
        StoreValue::List(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        StoreValue::Map(entries) | StoreValue::Node {
            properties: entries,
            ..
        }
        | StoreValue::Relation {
            properties: entries,
            ..
        } => flatten_properties(entries),
    }
}

fn flatten_properties(properties: BTreeMap<String, StoreValue>) -> Value {
    Value::Object(
        properties
            .into_iter()
            .map(|(k, v)| (k, normalize_value(v)))
            .collect(),
    )
}
