//! Projection of normalized result rows into a renderable node/edge graph.
//!
//! Each row may carry a source entity, a target entity, a relation between
//! them, and the label arrays of both entities. Nodes are emitted once per
//! entity id; edges once per row that carries a relation with two resolved
//! endpoints.

use std::collections::HashSet;

use serde_json::Value;

use crate::normalize::{NormalizedRow, LABELS_SUFFIX, TYPE_SUFFIX};
use crate::types::{Category, VisualEdge, VisualGraph, VisualGroup, VisualNode};

/// Grouping precedence: the first category present in a node's labels wins.
const GROUP_PRECEDENCE: [Category; 5] = [
    Category::Witness,
    Category::Suspect,
    Category::Victim,
    Category::CrimeScene,
    Category::Evidence,
];

/// Relation attributes consulted for the edge label, in order.
const EDGE_LABEL_KEYS: [&str; 3] = ["roleInEvidence", "note", "datetime"];

/// Row field names the builder reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionFields {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub source_labels: String,
    pub target_labels: String,
}

impl Default for ProjectionFields {
    fn default() -> Self {
        Self::new("n", "m", "r")
    }
}

impl ProjectionFields {
    /// Field names with label columns derived as `<field>_labels`.
    pub fn new(source: &str, target: &str, relation: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            relation: relation.to_string(),
            source_labels: format!("{source}{LABELS_SUFFIX}"),
            target_labels: format!("{target}{LABELS_SUFFIX}"),
        }
    }
}

/// Builder options.
#[derive(Debug, Clone, Default)]
pub struct ProjectionOptions {
    pub fields: ProjectionFields,
    /// Emit at most one edge per (from, to, relation type). Off by default:
    /// every row carrying a relation yields an edge.
    pub dedupe_edges: bool,
}

/// Project rows with default field names and no edge deduplication.
pub fn project_graph(rows: &[NormalizedRow]) -> VisualGraph {
    GraphProjectionBuilder::new(ProjectionOptions::default()).build(rows)
}

/// Stateful builder; one instance per projection.
#[derive(Debug)]
pub struct GraphProjectionBuilder {
    options: ProjectionOptions,
    seen_nodes: HashSet<String>,
    seen_edges: HashSet<(String, String, String)>,
    graph: VisualGraph,
}

impl GraphProjectionBuilder {
    pub fn new(options: ProjectionOptions) -> Self {
        Self {
            options,
            seen_nodes: HashSet::new(),
            seen_edges: HashSet::new(),
            graph: VisualGraph::default(),
        }
    }

    /// Consume all rows and return the projection.
    pub fn build(mut self, rows: &[NormalizedRow]) -> VisualGraph {
        for row in rows {
            self.push_row(row);
        }
        tracing::debug!(
            rows = rows.len(),
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            "Projected graph"
        );
        self.graph
    }

    /// Add one row's nodes and edge.
    pub fn push_row(&mut self, row: &NormalizedRow) {
        let fields = &self.options.fields;
        let source = entity(row, &fields.source);
        let target = entity(row, &fields.target);
        let source_labels = labels(row, &fields.source_labels);
        let target_labels = labels(row, &fields.target_labels);
        let relation = row.get(&fields.relation).and_then(Value::as_object);
        let rel_type = row
            .get(&format!("{}{TYPE_SUFFIX}", fields.relation))
            .and_then(Value::as_str)
            .map(str::to_string);

        let source_id = source.and_then(entity_id);
        let target_id = target.and_then(entity_id);

        if let (Some(obj), Some(id)) = (source, source_id.as_deref()) {
            self.add_node(obj, id, &source_labels);
        }
        if let (Some(obj), Some(id)) = (target, target_id.as_deref()) {
            self.add_node(obj, id, &target_labels);
        }

        let (Some(relation), Some(from), Some(to)) = (relation, source_id, target_id) else {
            return;
        };

        let label = edge_label(relation);
        if self.options.dedupe_edges {
            let key = (from.clone(), to.clone(), rel_type.unwrap_or_else(|| label.clone()));
            if !self.seen_edges.insert(key) {
                return;
            }
        }
        self.graph.edges.push(VisualEdge { from, to, label });
    }

    fn add_node(&mut self, obj: &serde_json::Map<String, Value>, id: &str, labels: &[String]) {
        if !self.seen_nodes.insert(id.to_string()) {
            return;
        }
        let label = obj
            .get("name")
            .and_then(scalar_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| id.to_string());

        self.graph.nodes.push(VisualNode {
            id: id.to_string(),
            label,
            group: group_for(labels),
            tooltip: format!("ID: {id}\nLabels: {}", labels.join(", ")),
        });
    }
}

/// Display group for a label set, following `GROUP_PRECEDENCE`.
pub fn group_for<S: AsRef<str>>(labels: &[S]) -> VisualGroup {
    GROUP_PRECEDENCE
        .iter()
        .find(|c| labels.iter().any(|l| l.as_ref() == c.label()))
        .map_or(VisualGroup::Other, |c| VisualGroup::Category(*c))
}

fn entity<'a>(row: &'a NormalizedRow, field: &str) -> Option<&'a serde_json::Map<String, Value>> {
    row.get(field).and_then(Value::as_object)
}

fn entity_id(obj: &serde_json::Map<String, Value>) -> Option<String> {
    obj.get("id").and_then(scalar_text).filter(|s| !s.is_empty())
}

/// Label array of an entity; a bare string counts as a single label.
fn labels(row: &NormalizedRow, field: &str) -> Vec<String> {
    match row.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn edge_label(relation: &serde_json::Map<String, Value>) -> String {
    EDGE_LABEL_KEYS
        .iter()
        .filter_map(|k| relation.get(*k).and_then(scalar_text))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> NormalizedRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_found_at_row_projects_nodes_and_edge() {
        let rows = vec![row(json!({
            "n": {"id": "S1", "name": "Knife owner"},
            "n_labels": ["Suspect"],
            "r": {"note": "blood"},
            "r_type": "FOUND_AT",
            "m": {"id": "C1", "name": "Kitchen"},
            "m_labels": ["CrimeScene"],
        }))];

        let graph = project_graph(&rows);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "C1"]);
        assert_eq!(
            graph.edges,
            vec![VisualEdge {
                from: "S1".to_string(),
                to: "C1".to_string(),
                label: "blood".to_string(),
            }]
        );
    }

    #[test]
    fn test_nodes_are_unique_by_id() {
        let rows: Vec<NormalizedRow> = (0..5)
            .map(|_| {
                row(json!({
                    "n": {"id": "W1", "name": "Anna"},
                    "n_labels": ["Witness"],
                    "r": {},
                    "m": {"id": "S1", "name": "John"},
                    "m_labels": ["Suspect"],
                }))
            })
            .collect();

        let graph = project_graph(&rows);
        assert_eq!(graph.nodes.len(), 2);
        let mut ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), graph.nodes.len());
        // Edges are not deduplicated by default.
        assert_eq!(graph.edges.len(), 5);
    }

    #[test]
    fn test_dedupe_edges_option() {
        let template = json!({
            "n": {"id": "W1"},
            "r": {"datetime": "2024-01-01T22:00"},
            "r_type": "WITNESSED",
            "m": {"id": "S1"},
        });
        let rows = vec![row(template.clone()), row(template)];
        let options = ProjectionOptions {
            dedupe_edges: true,
            ..Default::default()
        };

        let graph = GraphProjectionBuilder::new(options).build(&rows);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].label, "2024-01-01T22:00");
    }

    #[test]
    fn test_group_precedence() {
        assert_eq!(
            group_for(&["Evidence", "Witness"]),
            VisualGroup::Category(Category::Witness)
        );
        assert_eq!(
            group_for(&["CrimeScene", "Victim"]),
            VisualGroup::Category(Category::Victim)
        );
        assert_eq!(group_for(&["Detective"]), VisualGroup::Other);
        assert_eq!(group_for::<&str>(&[]), VisualGroup::Other);
    }

    #[test]
    fn test_witness_and_evidence_labels_group_as_witness() {
        let rows = vec![row(json!({
            "n": {"id": "W3", "name": "Dog"},
            "n_labels": ["Witness", "Evidence"],
        }))];
        let graph = project_graph(&rows);
        assert_eq!(graph.nodes[0].group, VisualGroup::Category(Category::Witness));
    }

    #[test]
    fn test_label_falls_back_to_id_and_tooltip_format() {
        let rows = vec![row(json!({
            "n": {"id": "E4"},
            "n_labels": ["Evidence", "Weapon"],
        }))];
        let graph = project_graph(&rows);
        let node = &graph.nodes[0];
        assert_eq!(node.label, "E4");
        assert_eq!(node.tooltip, "ID: E4\nLabels: Evidence, Weapon");
    }

    #[test]
    fn test_edge_label_precedence() {
        let rows = vec![
            row(json!({
                "n": {"id": "E1"}, "m": {"id": "S1"},
                "r": {"note": "print", "roleInEvidence": "weapon"},
            })),
            row(json!({
                "n": {"id": "E1"}, "m": {"id": "C1"},
                "r": {"roleInEvidence": "", "note": "", "datetime": "noon"},
            })),
            row(json!({
                "n": {"id": "W1"}, "m": {"id": "C1"},
                "r": {"other": "ignored"},
            })),
        ];
        let labels: Vec<String> = project_graph(&rows)
            .edges
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["weapon", "noon", ""]);
    }

    #[test]
    fn test_rows_missing_endpoint_still_contribute_nodes() {
        let rows = vec![
            row(json!({"n": {"id": "V1", "name": "Eve"}, "n_labels": ["Victim"], "r": null, "m": null})),
            row(json!({"n": {"id": "V2"}, "r": {"note": "x"}, "m": null})),
            row(json!({"n": {"name": "no id"}, "r": {"note": "x"}, "m": {"id": "C1"}})),
        ];

        let graph = project_graph(&rows);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["V1", "V2", "C1"]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_numeric_ids_and_bare_string_labels() {
        let rows = vec![row(json!({
            "n": {"id": 7, "name": "Seven"},
            "n_labels": "Suspect",
        }))];
        let graph = project_graph(&rows);
        assert_eq!(graph.nodes[0].id, "7");
        assert_eq!(graph.nodes[0].group, VisualGroup::Category(Category::Suspect));
    }

    #[test]
    fn test_custom_fields() {
        let rows = vec![row(json!({
            "a": {"id": "W1"}, "a_labels": ["Witness"],
            "rel": {"note": "saw"},
            "b": {"id": "S1"}, "b_labels": ["Suspect"],
        }))];
        let options = ProjectionOptions {
            fields: ProjectionFields::new("a", "b", "rel"),
            dedupe_edges: false,
        };
        let graph = GraphProjectionBuilder::new(options).build(&rows);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges[0].label, "saw");
    }

    #[test]
    fn test_projection_is_deterministic() {
        let rows = vec![
            row(json!({"n": {"id": "S1"}, "r": {"note": "a"}, "m": {"id": "C1"}})),
            row(json!({"n": {"id": "E1"}, "r": {"note": "b"}, "m": {"id": "S1"}})),
        ];
        assert_eq!(project_graph(&rows), project_graph(&rows));
    }
}
