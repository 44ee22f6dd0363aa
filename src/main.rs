//! Command-line interface for movies-sync
//!
//! # Usage Examples
//!
//! ## Continuous sync
//! ```bash
//! # Redis-backed cursor, one cycle per minute
//! movies-sync run \
//!   --postgres-uri postgres://app:123qwe@db:5432/movies_database \
//!   --es-host elasticsearch --redis-host redis
//!
//! # Local state file, replay everything from the start timestamp
//! movies-sync run --state-backend file --reset-cursor
//! ```
//!
//! ## One-off operations
//! ```bash
//! movies-sync once --interval 0
//! movies-sync create-index --es-host elasticsearch
//! movies-sync cursor show --redis-host redis
//! movies-sync cursor set "2023-05-01 10:00:00+00:00" --state-backend file
//! ```
//!
//! ## Cursor Formats
//! - RFC 3339: `2023-05-01T10:00:00Z`, `2023-05-01T13:00:00+03:00`
//! - Space separated: `2023-05-01 10:00:00`, `2023-05-01 10:00:00.123456+00:00`
//! - Values without an offset are UTC

use anyhow::Context;
use checkpoint::{Checkpoint, State, Watermark};
use clap::{Args, Parser, Subcommand};
use elasticsearch_sink::{ElasticsearchSink, IndexSink};
use movies_sync::store::ConfiguredStore;
use movies_sync::sync::{MovieSync, SyncSettings};
use movies_sync::{BackoffOpts, ElasticOpts, SourceOpts, StateOpts, SyncOpts};
use postgresql_source::PostgresChangeSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "movies-sync")]
#[command(about = "Keep an Elasticsearch movies index in sync with the PostgreSQL catalog")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Everything a sync cycle needs
#[derive(Args, Clone, Debug)]
struct PipelineArgs {
    #[command(flatten)]
    source: SourceOpts,

    #[command(flatten)]
    elastic: ElasticOpts,

    #[command(flatten)]
    state: StateOpts,

    #[command(flatten)]
    sync: SyncOpts,

    #[command(flatten)]
    backoff: BackoffOpts,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the catalog forever, sleeping between cycles
    Run {
        #[command(flatten)]
        args: PipelineArgs,
    },

    /// Run a single film/person/genre cycle and print a summary
    Once {
        #[command(flatten)]
        args: PipelineArgs,
    },

    /// Create the search index with its mapping if it does not exist
    CreateIndex {
        #[command(flatten)]
        elastic: ElasticOpts,

        #[command(flatten)]
        backoff: BackoffOpts,
    },

    /// Inspect or move the stored cursor
    Cursor {
        #[command(subcommand)]
        action: CursorCommand,
    },
}

#[derive(Subcommand)]
enum CursorCommand {
    /// Print the stored cursor
    Show {
        #[command(flatten)]
        state: StateOpts,
    },

    /// Validate and store a new cursor
    Set {
        /// New cursor value
        timestamp: String,

        #[command(flatten)]
        state: StateOpts,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Forever,
    Once,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => run_pipeline(args, Mode::Forever).await,
        Commands::Once { args } => run_pipeline(args, Mode::Once).await,
        Commands::CreateIndex { elastic, backoff } => {
            let sink = ElasticsearchSink::from_opts(&(&elastic).into(), backoff.policy("Elasticsearch"))?;
            let status = sink.ensure_index().await?;
            println!("{}: {status:?}", sink.index());
            Ok(())
        }
        Commands::Cursor { action } => match action {
            CursorCommand::Show { state } => {
                let store = ConfiguredStore::open(&state).await?;
                let loaded = State::load(store).await?;
                match loaded.get_checkpoint::<Watermark>(&state.state_key)? {
                    Some(cursor) => println!("{}", cursor.to_cli_string()),
                    None => println!("not set"),
                }
                Ok(())
            }
            CursorCommand::Set { timestamp, state } => {
                let cursor = Watermark::from_cli_string(&timestamp)?;
                let store = ConfiguredStore::open(&state).await?;
                let mut loaded = State::load(store).await?;
                loaded
                    .set_checkpoint(&state.state_key, &cursor)
                    .await
                    .context("Failed to store cursor")?;
                info!(cursor = %cursor, key = %state.state_key, "Cursor stored");
                println!("{}", cursor.to_cli_string());
                Ok(())
            }
        },
    }
}

async fn run_pipeline(args: PipelineArgs, mode: Mode) -> anyhow::Result<()> {
    let settings = SyncSettings {
        state_key: args.state.state_key.clone(),
        page_size: args.sync.page_size.max(1),
        interval: args.sync.interval()?,
        start_from: args.sync.start_from().context("Invalid --start-from")?,
        reset_cursor: args.sync.reset_cursor,
    };

    let store = ConfiguredStore::open(&args.state).await?;
    let state = State::load(store).await?;
    let source = PostgresChangeSource::new((&args.source).into(), args.backoff.policy("PostgreSQL"));
    let sink = ElasticsearchSink::from_opts(&(&args.elastic).into(), args.backoff.policy("Elasticsearch"))?;

    let mut sync = MovieSync::new(source, sink, state, settings);

    match mode {
        Mode::Forever => {
            tokio::select! {
                result = sync.run_forever() => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    Ok(())
                }
            }
        }
        Mode::Once => {
            sync.seed_cursor().await?;
            let summary = sync.run_cycle().await?;
            println!("{summary}");
            Ok(())
        }
    }
}
