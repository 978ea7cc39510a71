//! CLI entry point for the casegraph tool.
//!
//! Every command prints one JSON document to stdout; logs go to stderr.

use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

use casegraph_cli::config::load_config;
use casegraph_cli::request::{error_body, exit_code, parse_attr, QueryRequest};
use casegraph_core::{CaseError, CaseService, Category, RelationRuleEngine};
use casegraph_graph::GraphClient;

#[derive(Parser)]
#[command(name = "casegraph")]
#[command(about = "Browse, visualize, and edit the case graph stored in Neo4j")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: casegraph).
    #[arg(short, long, default_value = "casegraph", global = true)]
    config: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the relation legend.
    Rules,
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that need a Neo4j connection.
#[derive(Subcommand)]
enum StoreCommand {
    /// Install the per-category id uniqueness constraints.
    Schema,
    /// Create an entity with the next free identifier of its category.
    CreateEntity {
        /// Suspect, Witness, Victim, CrimeScene, or Evidence.
        #[arg(long)]
        category: String,
        #[arg(long)]
        name: String,
    },
    /// Create a relation between two entities.
    CreateRelation {
        /// KILLED_AT, WITNESSED, WAS_AT, FOUND_AT, or EVIDENCE_OF.
        #[arg(long = "type")]
        rel_type: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Relation attribute as key=value (repeatable).
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
    },
    /// Delete an entity together with its relations.
    DeleteEntity {
        #[arg(long)]
        id: String,
    },
    /// Delete a relation between two entities.
    DeleteRelation {
        #[arg(long = "type")]
        rel_type: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Rename an entity.
    Rename {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
    },
    /// List the entities of one category.
    List {
        #[arg(long)]
        category: String,
    },
    /// Run Cypher read from stdin as {"cypher": ..., "params": {...}}.
    Query,
    /// Print the whole graph as visualization nodes and edges.
    Graph {
        /// Collapse repeated (from, to, type) edges.
        #[arg(long)]
        dedupe_edges: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.log_json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let command = match cli.command {
        Command::Rules => {
            let legend = RelationRuleEngine::new().legend();
            println!("{}", serde_json::to_string(&legend)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Store(command) => command,
    };

    let app_config = load_config(&cli.config)?;
    let graph = GraphClient::connect(&app_config.neo4j).await?;

    let mut projection = app_config.projection.options();
    if let StoreCommand::Graph { dedupe_edges: true } = command {
        projection.dedupe_edges = true;
    }
    let service = CaseService::new(graph).with_projection(projection);

    match run(&service, command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(error = %err, kind = ?err.kind(), "Request failed");
            println!("{}", error_body(&err));
            Ok(ExitCode::from(exit_code(&err)))
        }
    }
}

async fn run(service: &CaseService<GraphClient>, command: StoreCommand) -> Result<Value, CaseError> {
    let output = match command {
        StoreCommand::Schema => {
            service
                .store()
                .ensure_schema()
                .await
                .map_err(CaseError::from)?;
            json!({ "ok": true })
        }
        StoreCommand::CreateEntity { category, name } => {
            let category: Category = category.parse()?;
            to_json(&service.create_entity(category, &name).await?)?
        }
        StoreCommand::CreateRelation {
            rel_type,
            from,
            to,
            attrs,
        } => {
            let attributes: BTreeMap<String, String> = attrs.into_iter().collect();
            to_json(
                &service
                    .create_relation(&rel_type, &from, &to, attributes)
                    .await?,
            )?
        }
        StoreCommand::DeleteEntity { id } => {
            let existed = service.delete_entity(&id).await?;
            json!({ "id": id.trim(), "deleted": existed })
        }
        StoreCommand::DeleteRelation { rel_type, from, to } => {
            let removed = service.delete_relation(&rel_type, &from, &to).await?;
            json!({ "removed": removed })
        }
        StoreCommand::Rename { id, name } => to_json(&service.rename_entity(&id, &name).await?)?,
        StoreCommand::List { category } => {
            let category: Category = category.parse()?;
            to_json(&service.list_entities(category).await?)?
        }
        StoreCommand::Query => {
            let input = std::io::read_to_string(std::io::stdin())
                .map_err(|e| CaseError::Execution(format!("Failed to read stdin: {e}")))?;
            let request = QueryRequest::parse(&input)?;
            to_json(&service.query(&request.cypher, request.params).await?)?
        }
        StoreCommand::Graph { .. } => to_json(&service.graph_view().await?)?,
    };
    Ok(output)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CaseError> {
    serde_json::to_value(value).map_err(|e| CaseError::Execution(format!("Serialization error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rules_is_handled_without_store() {
        let cli = Cli::try_parse_from(["casegraph", "rules"]).unwrap();
        assert!(matches!(cli.command, Command::Rules));
    }

    #[test]
    fn test_store_commands_parse_flat() {
        let cli = Cli::try_parse_from([
            "casegraph",
            "create-relation",
            "--type",
            "FOUND_AT",
            "--from",
            "E1",
            "--to",
            "C1",
            "--attr",
            "note=blood",
        ])
        .unwrap();
        match cli.command {
            Command::Store(StoreCommand::CreateRelation { rel_type, attrs, .. }) => {
                assert_eq!(rel_type, "FOUND_AT");
                assert_eq!(attrs, vec![("note".to_string(), "blood".to_string())]);
            }
            _ => panic!("expected create-relation"),
        }

        let cli = Cli::try_parse_from(["casegraph", "graph", "--dedupe-edges"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Store(StoreCommand::Graph { dedupe_edges: true })
        ));
    }
}
