//! devgraph - command-line entry point
//!
//! Syncs a repository into the knowledge graph and answers structured or
//! natural-language questions about it.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use devgraph::orchestrator::Orchestrator;
use devgraph::query::{QueryRequest, QueryType};
use devgraph::{AppState, Config};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "devgraph")]
#[command(about = "Repository knowledge graph for developer questions")]
struct Cli {
    /// Path to config.yaml
    #[arg(long, global = true, env = "DEVGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a repository and import it into the graph
    Sync {
        /// Repository root (defaults to the configured root)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Run a structured query against the graph
    #[command(group(
        ArgGroup::new("kind")
            .required(true)
            .args(["find_entity", "find_symbol", "find_pattern"])
    ))]
    Query {
        /// Find an entity by name
        #[arg(long)]
        find_entity: Option<String>,

        /// Find a symbol (function, field, route, ...)
        #[arg(long)]
        find_symbol: Option<String>,

        /// Find files and nodes following a naming or path pattern
        #[arg(long)]
        find_pattern: Option<String>,

        /// Restrict matches to one entity
        #[arg(long)]
        for_entity: Option<String>,

        /// Include one hop of related nodes
        #[arg(long)]
        include_related: bool,

        /// Return relationships, with a larger limit and timeout
        #[arg(long)]
        debug: bool,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Ask a development question in plain language
    Ask {
        /// The question, e.g. "add a birthday field to User"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Show node and relationship counts
    Stats,

    /// Remove everything from the graph
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,devgraph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run a command. `Ok(false)` means it completed but reported a failure.
async fn run(cli: Cli) -> Result<bool> {
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let orchestrator = Orchestrator::new(AppState::new(config));

    match cli.command {
        Commands::Sync { path } => {
            let report = orchestrator.sync_repository(path.as_deref()).await?;
            print_json(&report)?;
            Ok(true)
        }
        Commands::Query {
            find_entity,
            find_symbol,
            find_pattern,
            for_entity,
            include_related,
            debug,
            format,
        } => {
            let (query_type, target) = [
                (QueryType::FindEntity, find_entity),
                (QueryType::FindSymbol, find_symbol),
                (QueryType::FindPattern, find_pattern),
            ]
            .into_iter()
            .find_map(|(kind, target)| target.map(|t| (kind, t)))
            .context("one of --find-entity, --find-symbol or --find-pattern is required")?;
            let mut request = QueryRequest::new(query_type, target)
                .include_related(include_related)
                .debug(debug);
            if let Some(entity) = for_entity {
                request = request.for_entity(entity);
            }

            let response = orchestrator.resolve(&request).await;
            match format {
                OutputFormat::Json => print_json(&response)?,
                OutputFormat::Text => println!("{}", response.to_text()),
            }
            Ok(response.success)
        }
        Commands::Ask { text, format } => {
            let context = orchestrator.ask(&text.join(" ")).await;
            match format {
                OutputFormat::Json => print_json(&context)?,
                OutputFormat::Text => println!("{}", context.to_text()),
            }
            Ok(true)
        }
        Commands::Stats => {
            let stats = orchestrator.stats().await?;
            print_json(&stats)?;
            Ok(true)
        }
        Commands::Clear => {
            orchestrator.clear().await?;
            Ok(true)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
