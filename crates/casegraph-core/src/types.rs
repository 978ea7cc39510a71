//! Core domain types for the case graph.
//!
//! Entities (people, places, evidence) are nodes in the graph store; relations
//! are typed, directed edges between them. Visual nodes and edges are the
//! display projection of both and are never persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CaseError;

// ── Categories ────────────────────────────────────────────────────

/// The fixed set of entity kinds. The category name doubles as the node label
/// in the graph store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Suspect,
    Witness,
    Victim,
    CrimeScene,
    Evidence,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Suspect,
        Category::Witness,
        Category::Victim,
        Category::CrimeScene,
        Category::Evidence,
    ];

    /// Node label used in the graph store.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Suspect => "Suspect",
            Category::Witness => "Witness",
            Category::Victim => "Victim",
            Category::CrimeScene => "CrimeScene",
            Category::Evidence => "Evidence",
        }
    }

    /// Single-letter identifier prefix.
    pub fn prefix(&self) -> char {
        match self {
            Category::Suspect => 'S',
            Category::Witness => 'W',
            Category::Victim => 'V',
            Category::CrimeScene => 'C',
            Category::Evidence => 'E',
        }
    }

    /// Display colour used by the visualization and the relation legend.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Witness => "#5dade2",
            Category::Victim => "#9b59b6",
            Category::Suspect => "#e74c3c",
            Category::CrimeScene => "#58d68d",
            Category::Evidence => "#f39c12",
        }
    }

    /// Resolve a category from the first character of an identifier.
    pub fn from_id_prefix(id: &str) -> Option<Category> {
        let first = id.chars().next()?;
        Category::ALL.into_iter().find(|c| c.prefix() == first)
    }

    /// First label in `labels` that names a category.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Option<Category> {
        labels.iter().find_map(|l| l.as_ref().parse().ok())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| CaseError::InvalidCategory(s.to_string()))
    }
}

// ── Entities ──────────────────────────────────────────────────────

/// A person, place, or piece of evidence in the case graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub category: Category,
}

// ── Relations ─────────────────────────────────────────────────────

/// The directed relationship kinds allowed between entities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    KilledAt,
    Witnessed,
    WasAt,
    FoundAt,
    EvidenceOf,
}

impl RelationType {
    pub const ALL: [RelationType; 5] = [
        RelationType::KilledAt,
        RelationType::Witnessed,
        RelationType::WasAt,
        RelationType::FoundAt,
        RelationType::EvidenceOf,
    ];

    /// Relationship type string as stored in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::KilledAt => "KILLED_AT",
            RelationType::Witnessed => "WITNESSED",
            RelationType::WasAt => "WAS_AT",
            RelationType::FoundAt => "FOUND_AT",
            RelationType::EvidenceOf => "EVIDENCE_OF",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing is exact; unknown strings are handed back unchanged so the rule
/// engine can report them.
impl FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A typed, directed edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// The category contract for one relation type.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RelationRule {
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub source: Category,
    pub target: Category,
}

/// Labels observed on the two endpoints of a candidate relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointLabels {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

/// Result of an existence-guarded relation write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    AlreadyExists,
    EndpointMissing,
}

// ── Visualization ─────────────────────────────────────────────────

/// Display group of a visual node: a category, or `Other` when no category
/// label is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualGroup {
    Category(Category),
    Other,
}

impl VisualGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualGroup::Category(c) => c.label(),
            VisualGroup::Other => "Other",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            VisualGroup::Category(c) => c.color(),
            VisualGroup::Other => "#95a5a6",
        }
    }
}

impl fmt::Display for VisualGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VisualGroup {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A node as handed to the renderer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    pub group: VisualGroup,
    /// Hover text; serialized as `title`, the key force-graph renderers read.
    #[serde(rename = "title")]
    pub tooltip: String,
}

/// An edge as handed to the renderer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VisualEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Projection of a result set into the renderer's node/edge model.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

/// One row of the relation legend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LegendEntry {
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub source: Category,
    pub target: Category,
    pub source_color: &'static str,
    pub target_color: &'static str,
}
