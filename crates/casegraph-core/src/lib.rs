//! casegraph-core: typed case graph mutation and projection layer.
//!
//! This crate holds everything that does not talk to a database:
//! - Domain types (entities, relations, categories, visual nodes and edges)
//! - Normalization of store-native result rows into plain JSON records
//! - Sequential per-category identifier allocation
//! - The relation rule table and its validator
//! - Projection of result rows into a renderable node/edge graph
//! - The `CaseStore` seam, an in-memory store, and the `CaseService` on top

pub mod error;
pub mod ident;
pub mod memory;
pub mod normalize;
pub mod projection;
pub mod rules;
pub mod service;
pub mod store;
pub mod types;

pub use error::{CaseError, ErrorKind, Rejection};
pub use memory::MemoryStore;
pub use normalize::{NormalizedRow, StoreRow, StoreValue};
pub use projection::{project_graph, GraphProjectionBuilder, ProjectionFields, ProjectionOptions};
pub use rules::RelationRuleEngine;
pub use service::CaseService;
pub use store::{CaseStore, QueryParams};
pub use types::{
    Category, EndpointLabels, Entity, MergeOutcome, Relation, RelationRule, RelationType,
    VisualEdge, VisualGraph, VisualGroup, VisualNode,
};
