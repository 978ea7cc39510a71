//! casegraph-cli: configuration and request handling for the `casegraph` binary.

pub mod config;
pub mod request;
