//! api-ordering: order the operations of an API specification
//!
//! Reads a specification catalog, infers operation dependencies and prints
//! the ordering (or just the discovered edges) as JSON.

mod catalog;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use api_ordering::{
    DependencyOrderingService, OrderOperationsRequest, OrderSpecificationRequest,
    OrderingConfig, OrderingHandler, SpecificationId,
};
use catalog::Catalog;

/// Environment variable holding the log filter, checked before `RUST_LOG`.
const LOG_ENV: &str = "API_ORDERING_LOG";

/// api-ordering: dependency-aware ordering of API operations
#[derive(Parser, Debug)]
#[command(name = "api-ordering", version)]
#[command(about = "Infer dependencies between API operations and order them")]
struct Args {
    /// Log filter (overrides API_ORDERING_LOG and RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Order the operations of one specification
    Order {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Specification id
        #[arg(short, long)]
        spec: String,

        /// Restrict ordering to these operation ids (repeatable)
        #[arg(long = "select")]
        select: Vec<String>,

        /// Write the response here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print discovered dependency edges and auth operations without ordering
    Analyze {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Specification id
        #[arg(short, long)]
        spec: String,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn emit(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{}\n", json))
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

/// Run one command. Returns whether the response was successful.
async fn run(args: Args) -> Result<bool> {
    let config = OrderingConfig::from_env();
    debug!(?config, "Loaded ordering configuration");

    match args.command {
        Command::Order {
            catalog,
            spec,
            select,
            output,
            pretty,
        } => {
            let catalog = Catalog::load(&catalog)?;
            let service = DependencyOrderingService::with_config(config)
                .with_source(Arc::new(catalog.to_source()?));
            let handler = OrderingHandler::with_service(service);

            let request = OrderSpecificationRequest {
                correlation_id: "cli".to_string(),
                specification_id: spec,
                selected_operation_ids: (!select.is_empty()).then_some(select),
            };
            let response = handler.handle_order_specification(request).await;
            info!(
                success = response.success,
                results = response.results.len(),
                "Ordering finished"
            );

            emit(&to_json(&response, pretty)?, output.as_deref())?;
            Ok(response.success)
        }
        Command::Analyze {
            catalog,
            spec,
            pretty,
        } => {
            let catalog = Catalog::load(&catalog)?;
            let id: SpecificationId = spec
                .parse()
                .with_context(|| format!("specification id {:?}", spec))?;
            let entry = catalog
                .find(id)
                .with_context(|| format!("specification {} not in catalog", id))?;

            let handler = OrderingHandler::with_config(config);
            let response = handler.handle_discover_dependencies(OrderOperationsRequest {
                correlation_id: "cli".to_string(),
                operations: entry.operations.clone(),
                selected_operation_ids: None,
            });

            emit(&to_json(&response, pretty)?, None)?;
            Ok(response.success)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());
    if run(args).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_catalog(dir: &Path) -> PathBuf {
        let path = dir.join("catalog.json");
        std::fs::write(
            &path,
            r#"{"specifications": [{
                "id": "00000000-0000-0000-0000-0000000000aa",
                "operations": [
                    {"id": "00000000-0000-0000-0000-000000000002", "method": "GET", "path": "/users/{id}"},
                    {"id": "00000000-0000-0000-0000-000000000001", "method": "POST", "path": "/users"}
                ]
            }]}"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_parse_order_args() {
        let args = Args::try_parse_from([
            "api-ordering",
            "order",
            "--catalog",
            "c.json",
            "--spec",
            "s",
            "--select",
            "a",
            "--select",
            "b",
            "--pretty",
        ])
        .unwrap();

        match args.command {
            Command::Order { select, pretty, .. } => {
                assert_eq!(select, vec!["a".to_string(), "b".to_string()]);
                assert!(pretty);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_order_writes_response() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_catalog(dir.path());
        let output = dir.path().join("out.json");

        let args = Args {
            log_level: None,
            command: Command::Order {
                catalog,
                spec: "00000000-0000-0000-0000-0000000000aa".into(),
                select: vec![],
                output: Some(output.clone()),
                pretty: false,
            },
        };

        let success = run(args).await.unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();

        assert!(success);
        assert_eq!(written["success"], true);
        assert_eq!(
            written["results"][0]["operationId"],
            "00000000-0000-0000-0000-000000000001"
        );
    }

    #[tokio::test]
    async fn test_unknown_spec_fails() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_catalog(dir.path());
        let output = dir.path().join("out.json");

        let args = Args {
            log_level: None,
            command: Command::Order {
                catalog,
                spec: "00000000-0000-0000-0000-0000000000bb".into(),
                select: vec![],
                output: Some(output.clone()),
                pretty: true,
            },
        };

        let success = run(args).await.unwrap();
        let written = std::fs::read_to_string(&output).unwrap();

        assert!(!success);
        assert!(written.contains("not_found"));
    }
}
