//! casegraph-graph: Neo4j store for the case graph.
//!
//! This crate is the only place that speaks Cypher. It implements the core's
//! `CaseStore` seam on top of a pooled `neo4rs` client, converts Bolt values
//! into store-neutral values, and installs the uniqueness constraints the
//! create-only writes depend on.

pub mod client;
pub mod convert;
pub mod mutations;
pub mod queries;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
