//! Shiori main entry point
//!
//! This is the command-line interface for the Shiori bookmark enricher.

use clap::{Parser, Subcommand};
use shiori::config::{load_config_with_hash, Config};
use shiori::enrich::{self, Executor, HttpFetcher, RetryPolicy, RetryScheduler};
use shiori::storage::{Bookmark, SqliteStorage, StatusStore};
use shiori::BookmarkStatus;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Shiori: bookmarks that fill in their own titles
///
/// Shiori stores URLs and enriches each one in the background with the
/// title and description of the page it points to, retrying failed
/// fetches on a fixed schedule.
#[derive(Parser, Debug)]
#[command(name = "shiori")]
#[command(version)]
#[command(about = "Asynchronous bookmark metadata enrichment", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bookmark a URL and wait for its metadata
    Add {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Show a single bookmark
    Show {
        #[arg(value_name = "ID")]
        id: Uuid,
    },

    /// List bookmarks, newest first
    List {
        /// Only show bookmarks in this state (pending, failed, completed)
        #[arg(long)]
        status: Option<BookmarkStatus>,
    },

    /// Delete a bookmark
    Delete {
        #[arg(value_name = "ID")]
        id: Uuid,
    },

    /// Clear a failure and run a fresh enrichment cycle
    Retry {
        #[arg(value_name = "ID")]
        id: Uuid,
    },

    /// Re-enqueue every pending bookmark left by an interrupted run
    Resume,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let storage = Arc::new(SqliteStorage::new(Path::new(
        &config.storage.database_path,
    ))?);

    match cli.command {
        Command::Add { url } => handle_add(&config, storage, &url).await?,
        Command::Show { id } => print_bookmark(&storage.get(id)?),
        Command::List { status } => handle_list(storage.as_ref(), status)?,
        Command::Delete { id } => {
            storage.delete(id)?;
            println!("✓ Deleted {}", id);
        }
        Command::Retry { id } => handle_retry(&config, storage, id).await?,
        Command::Resume => handle_resume(&config, storage).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shiori=info,warn"),
            1 => EnvFilter::new("shiori=debug,info"),
            2 => EnvFilter::new("shiori=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Wires the fetcher, scheduler and store together
fn build_scheduler(
    config: &Config,
    storage: Arc<SqliteStorage>,
) -> Result<RetryScheduler, Box<dyn std::error::Error>> {
    let fetcher = HttpFetcher::new(&config.fetcher)?;
    let policy = RetryPolicy::from(&config.retry);

    tracing::debug!(
        max_attempts = policy.max_attempts,
        backoff_secs = policy.backoff.as_secs(),
        worst_case_secs = policy.worst_case_duration(config.fetcher.timeout()).as_secs(),
        "Retry policy"
    );

    Ok(RetryScheduler::new(
        Executor::new(Arc::new(fetcher)),
        storage,
        policy,
    ))
}

/// Enqueues the given bookmarks and waits for every cycle to finish
async fn enrich_all(
    config: &Config,
    storage: Arc<SqliteStorage>,
    bookmarks: &[Bookmark],
) -> Result<(), Box<dyn std::error::Error>> {
    let (queue, worker) = enrich::start(build_scheduler(config, storage)?);

    for bookmark in bookmarks {
        queue.enqueue(bookmark.id, &bookmark.url)?;
    }

    let stats = worker.wait().await?;
    tracing::info!(
        "Enrichment finished: {} succeeded, {} failed, {} errored",
        stats.succeeded,
        stats.exhausted,
        stats.errored
    );

    Ok(())
}

/// Handles `add`: create, enrich, then print the result
async fn handle_add(
    config: &Config,
    storage: Arc<SqliteStorage>,
    url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let bookmark = storage.create(url)?;
    tracing::info!(bookmark_id = %bookmark.id, "Bookmark created");

    enrich_all(config, storage.clone(), std::slice::from_ref(&bookmark)).await?;

    print_bookmark(&storage.get(bookmark.id)?);
    Ok(())
}

/// Handles `retry`: reset the failure and run a fresh cycle
async fn handle_retry(
    config: &Config,
    storage: Arc<SqliteStorage>,
    id: Uuid,
) -> Result<(), Box<dyn std::error::Error>> {
    let bookmark = storage.reset_for_retry(id)?;
    tracing::info!(bookmark_id = %bookmark.id, "Bookmark reset for retry");

    enrich_all(config, storage.clone(), std::slice::from_ref(&bookmark)).await?;

    print_bookmark(&storage.get(id)?);
    Ok(())
}

/// Handles `resume`: pick up bookmarks an interrupted run left pending
async fn handle_resume(
    config: &Config,
    storage: Arc<SqliteStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pending = storage.list(Some(BookmarkStatus::Pending))?;

    if pending.is_empty() {
        println!("No pending bookmarks");
        return Ok(());
    }

    tracing::info!("Resuming enrichment for {} pending bookmarks", pending.len());
    enrich_all(config, storage.clone(), &pending).await?;

    handle_list(storage.as_ref(), None)
}

fn handle_list(
    storage: &dyn StatusStore,
    status: Option<BookmarkStatus>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bookmarks = storage.list(status)?;

    for bookmark in &bookmarks {
        println!(
            "{}  {:<9}  {}  {}",
            bookmark.id,
            bookmark.status(),
            bookmark.url,
            bookmark.title.as_deref().unwrap_or("-")
        );
    }
    println!("\n{} bookmark(s)", bookmarks.len());

    Ok(())
}

fn print_bookmark(bookmark: &Bookmark) {
    println!("ID:          {}", bookmark.id);
    println!("URL:         {}", bookmark.url);
    println!("Status:      {}", bookmark.status());
    println!(
        "Title:       {}",
        bookmark.title.as_deref().unwrap_or("-")
    );
    println!(
        "Description: {}",
        bookmark.description.as_deref().unwrap_or("-")
    );
    if let Some(enriched_at) = bookmark.enriched_at {
        println!("Enriched at: {}", enriched_at.to_rfc3339());
    }
    if let Some(error) = &bookmark.last_error {
        println!("Last error:  {}", error);
    }
    println!("Created at:  {}", bookmark.created_at.to_rfc3339());
}
