//! Configuration for the casegraph binary.
//!
//! Loaded from (later sources win):
//! 1. Config file (`casegraph.toml` by default, optional)
//! 2. Environment variables (`CASEGRAPH_` prefix, `__` between keys,
//!    e.g. `CASEGRAPH_NEO4J__URI`)
//! 3. The deployment variables `NEO_URI`, `NEO_USER`, `NEO_PASSWORD`

use casegraph_core::ProjectionOptions;
use casegraph_graph::GraphConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub neo4j: GraphConfig,

    #[serde(default)]
    pub projection: ProjectionConfig,
}

/// `[projection]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectionConfig {
    /// Collapse repeated (from, to, type) edges in graph output.
    #[serde(default)]
    pub dedupe_edges: bool,
}

impl ProjectionConfig {
    pub fn options(&self) -> ProjectionOptions {
        ProjectionOptions {
            dedupe_edges: self.dedupe_edges,
            ..Default::default()
        }
    }
}

/// Connection settings taken from the `NEO_*` deployment variables.
#[derive(Debug, Clone, Default)]
pub struct LegacyEnv {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl LegacyEnv {
    pub fn from_env() -> Self {
        Self {
            uri: std::env::var("NEO_URI").ok(),
            user: std::env::var("NEO_USER").ok(),
            password: std::env::var("NEO_PASSWORD").ok(),
        }
    }
}

/// Load configuration from the file named by `file_prefix` and the process
/// environment.
pub fn load_config(file_prefix: &str) -> anyhow::Result<AppConfig> {
    build_config(file_prefix, LegacyEnv::from_env())
}

/// Load configuration with explicit `NEO_*` overrides.
pub fn build_config(file_prefix: &str, legacy: LegacyEnv) -> anyhow::Result<AppConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("CASEGRAPH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("neo4j.uri", legacy.uri)?
        .set_override_option("neo4j.user", legacy.user)?
        .set_override_option("neo4j.password", legacy.password)?
        .build()?;

    Ok(cfg.try_deserialize()?)
}
