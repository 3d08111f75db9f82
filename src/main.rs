//! Sumi-Search main entry point
//!
//! This is the command-line interface for crawling pages into an index and
//! searching it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use sumi_search::config::{load_config, Config, OsPathResolver};
use sumi_search::index::IndexReader;
use sumi_search::output::{format_index_report, format_search_page, load_statistics, print_statistics};
use sumi_search::{IndexOrchestrator, SearchOrchestrator, SumiError};
use tracing_subscriber::EnvFilter;

/// Sumi-Search: crawl, index and search web content
///
/// Crawls pages from a seed URL or local directory into a full-text index,
/// then answers ranked queries with highlighted fragments.
#[derive(Parser, Debug)]
#[command(name = "sumi-search")]
#[command(version = "1.0.0")]
#[command(about = "Crawl, index and search web content", long_about = None)]
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
    /// Crawl from a seed URL or path and add the pages to the index
    Index {
        /// Seed URL (http, https, file) or local path
        seed: String,

        /// Maximum hops from the seed (defaults to the config value)
        #[arg(long)]
        max_depth: Option<u32>,

        /// Maximum concurrent fetches (defaults to the config value)
        #[arg(long)]
        max_workers: Option<u32>,
    },

    /// Run a query against the index
    Search {
        /// Query: words are AND-ed, "quoted text" is a phrase
        query: String,

        /// Zero-based result page
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show statistics about the index
    Stats {
        /// Number of most frequent terms to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SumiError>() {
                Some(err) => {
                    tracing::error!("{:#}", e);
                    eprintln!("{}", err.user_message());
                }
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .map_err(SumiError::from)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Command::Index {
            seed,
            max_depth,
            max_workers,
        } => handle_index(&config, &seed, max_depth, max_workers).await,
        Command::Search { query, page, json } => handle_search(&config, &query, page, json).await,
        Command::Stats { top } => handle_stats(&config, top),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_search=info,warn"),
            1 => EnvFilter::new("sumi_search=debug,info"),
            2 => EnvFilter::new("sumi_search=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_index(
    config: &Config,
    seed: &str,
    max_depth: Option<u32>,
    max_workers: Option<u32>,
) -> anyhow::Result<()> {
    let orchestrator = IndexOrchestrator::new(config, &OsPathResolver::default())?;
    let depth = max_depth.unwrap_or(config.crawl.max_depth);
    let workers = max_workers.unwrap_or(config.crawl.max_workers).max(1) as usize;

    let report = orchestrator
        .index_with(seed, depth, workers)
        .await
        .with_context(|| {
            format!(
                "Indexing {} into {}",
                seed,
                orchestrator.index_directory().display()
            )
        })?;

    println!("{}", format_index_report(&report));
    Ok(())
}

async fn handle_search(config: &Config, query: &str, page: usize, json: bool) -> anyhow::Result<()> {
    let orchestrator = SearchOrchestrator::new(config, &OsPathResolver::default());
    let query = query.to_string();

    // Loading the index reads SQLite synchronously
    let results = tokio::task::spawn_blocking(move || orchestrator.search(&query, page))
        .await
        .context("Search task failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_search_page(&results));
    }
    Ok(())
}

fn handle_stats(config: &Config, top: usize) -> anyhow::Result<()> {
    use sumi_search::config::PathResolver;

    let dir = OsPathResolver::default().index_directory(&config.index);
    let reader = IndexReader::open(&dir).map_err(SumiError::from)?;

    print_statistics(&load_statistics(&reader, top));
    Ok(())
}
