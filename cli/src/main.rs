//! Operator command line for the example store.
//!
//! Run with: cargo run -p exemplar-cli -- --help
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr and are
//! filtered with `RUST_LOG` (default `exemplar=info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exemplar_retrieval::{
    Curator, DatabaseId, ExampleId, ExemplarConfig, NewExample, default_data_dir,
};

#[derive(Parser, Debug)]
#[command(name = "exemplar", version, about = "Manage and search curated answer examples")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the example files (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every example in a database, newest first
    List {
        #[arg(long)]
        db: String,
    },

    /// Show one example
    Get { id: ExampleId },

    /// Add an example
    Add {
        #[arg(long)]
        db: String,

        #[arg(long)]
        question: String,

        #[arg(long)]
        chosen: String,

        #[arg(long)]
        rejected: Option<String>,

        /// The chosen answer was written by hand
        #[arg(long)]
        custom: bool,
    },

    /// Delete an example (succeeds if it is already gone)
    Delete { id: ExampleId },

    /// Find examples relevant to a query
    Search {
        #[arg(long)]
        db: String,

        query: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the newest examples in a database
    Recent {
        #[arg(long)]
        db: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count one retrieval for each example
    Bump {
        #[arg(required = true)]
        ids: Vec<ExampleId>,
    },

    /// Import a JSON array of examples
    Seed { file: PathBuf },

    /// Show store statistics
    Stats,
}

/// Build the configuration from the optional file and flag overrides.
///
/// The command line always works against a directory; without one in the
/// config or on the command line the platform data directory is used.
fn resolve_config(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<ExemplarConfig> {
    let mut config = match config_path {
        Some(path) => ExemplarConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ExemplarConfig::default(),
    };

    if let Some(dir) = data_dir {
        config = config.with_data_dir(dir);
    }
    if config.store.data_dir.is_none() {
        config = config.with_data_dir(default_data_dir());
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(curator: &Curator, command: Command) -> Result<()> {
    match command {
        Command::List { db } => {
            print_json(&curator.list_examples(&DatabaseId::new(db)).await)?;
        }
        Command::Get { id } => match curator.get_example(&id).await {
            Some(example) => print_json(&example)?,
            None => bail!("example {id} not found"),
        },
        Command::Add {
            db,
            question,
            chosen,
            rejected,
            custom,
        } => {
            let mut new = NewExample::new(db, question, chosen);
            if let Some(rejected) = rejected {
                new = new.with_rejected(rejected);
            }
            if custom {
                new = new.custom();
            }
            let id = curator.create_example(new).await?;
            print_json(&id)?;
        }
        Command::Delete { id } => {
            print_json(&curator.delete_example(&id).await?)?;
        }
        Command::Search { db, query, limit } => {
            let results = curator
                .retrieve(&DatabaseId::new(db), &query, limit)
                .await?;
            print_json(&results)?;
        }
        Command::Recent { db, limit } => {
            print_json(&curator.get_recent(&DatabaseId::new(db), limit).await)?;
        }
        Command::Bump { ids } => {
            let report = curator.increment_usage_report(&ids).await;
            print_json(&report)?;
            report.into_result()?;
        }
        Command::Seed { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let batch: Vec<NewExample> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON array of examples", file.display()))?;
            let ids = curator.seed(batch).await?;
            info!("Seeded {} examples from {}", ids.len(), file.display());
            print_json(&ids)?;
        }
        Command::Stats => {
            print_json(&curator.stats().await)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "exemplar=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), cli.data_dir)?;
    let curator = Curator::new(config)
        .await
        .context("failed to open example store")?;

    run(&curator, cli.command).await
}
