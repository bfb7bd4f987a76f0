//! Blogscout main entry point
//!
//! This is the command-line interface for the Blogscout blog indexer.

use anyhow::Context;
use blogscout::config::{load_config_with_hash, require_persistence, validate, Config};
use blogscout::crawler::{user_agent_string, Coordinator, RunOptions};
use blogscout::index::{Embedder, HttpEmbedder, IndexingPipeline, SqliteVectorStore};
use blogscout::output::{print_query_results, print_summary};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Blogscout: crawl a blog into a vector index
///
/// Blogscout starts from a sitemap or a single article, extracts the title,
/// publication date and paragraphs of every article it reaches, and can
/// embed and store those paragraphs for semantic search.
#[derive(Parser, Debug)]
#[command(name = "blogscout")]
#[command(version)]
#[command(about = "Crawl a blog into a vector index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Embed and persist paragraphs into the vector store
    #[arg(long)]
    store: bool,

    /// Keep crawling discovered links after the seed page
    #[arg(long)]
    continue_crawl: bool,

    /// Crawl from this URL instead of the configured seed
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "query")]
    dry_run: bool,

    /// Search the vector store for TEXT and exit
    #[arg(long, value_name = "TEXT", conflicts_with_all = ["store", "continue_crawl"])]
    query: Option<String>,

    /// Number of results for --query
    #[arg(long, default_value_t = 5)]
    top_k: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Credentials may come from a local .env file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
        }
    }

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = seed.clone();
        validate(&config).context("Invalid --seed")?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli);
    } else if let Some(text) = &cli.query {
        handle_query(&config, text, cli.top_k).await?;
    } else {
        handle_crawl(config, &cli).await?;
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
            0 => EnvFilter::new("blogscout=info,warn"),
            1 => EnvFilter::new("blogscout=debug,info"),
            2 => EnvFilter::new("blogscout=trace,debug"),
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

/// Builds the embedder, opens the store and wires them into a pipeline
///
/// Fails before any crawling if a section or the API key is missing.
fn build_pipeline(config: &Config) -> anyhow::Result<IndexingPipeline> {
    let (embedding, store_config, api_key) = require_persistence(config)?;

    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(embedding, &api_key)?);
    let mut store = SqliteVectorStore::open(
        Path::new(&store_config.database_path),
        &store_config.collection,
    )
    .with_context(|| format!("Failed to open store {}", store_config.database_path))?;
    if store_config.store_side_embeddings {
        store = store.with_embedder(Arc::clone(&embedder));
    }

    tracing::info!(
        "Indexing into collection '{}' of {} with model {}",
        store_config.collection,
        store_config.database_path,
        embedding.model
    );
    Ok(IndexingPipeline::new(embedder, Arc::new(store)))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, cli: &Cli) {
    println!("=== Blogscout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed_url);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    if config.crawler.max_pages > 0 {
        println!("  Max pages: {}", config.crawler.max_pages);
    } else {
        println!("  Max pages: unlimited");
    }
    println!(
        "  Mode: {}",
        if cli.continue_crawl {
            "continue crawl"
        } else {
            "single page"
        }
    );

    println!("\nUser Agent:");
    println!("  {}", user_agent_string(&config.user_agent));

    println!("\nSite:");
    println!("  Blog prefix: {}", config.site.blog_prefix);
    println!("  Date marker class: {}", config.site.date_marker_class);
    println!(
        "  Blocked fragments ({}): {}",
        config.site.blocked_fragments.len(),
        config.site.blocked_fragments.join(", ")
    );
    println!("  Excluded pages ({}):", config.site.excluded_pages.len());
    for page in &config.site.excluded_pages {
        println!("    - {}", page);
    }

    println!("\nSegmenter:");
    println!(
        "  Chunks of up to {} elements, longer than {} characters",
        config.segmenter.siblings_per_chunk, config.segmenter.min_chunk_chars
    );

    println!("\nIndex:");
    match (&config.embedding, &config.store) {
        (Some(embedding), Some(store)) => {
            println!("  Model: {} at {}", embedding.model, embedding.endpoint);
            println!(
                "  Store: {} (collection '{}')",
                store.database_path, store.collection
            );
        }
        _ => println!("  Not configured"),
    }

    println!("\n✓ Configuration is valid");
    if cli.store {
        match require_persistence(config) {
            Ok(_) => println!("✓ Would persist records to the vector store"),
            Err(e) => println!("✗ Cannot persist: {}", e),
        }
    }
}

/// Handles the --query mode: embeds the text and prints the closest records
async fn handle_query(config: &Config, text: &str, top_k: usize) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let matches = pipeline
        .query(text, top_k)
        .await
        .context("Query failed")?;
    print_query_results(text, &matches);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, cli: &Cli) -> anyhow::Result<()> {
    let pipeline = if cli.store {
        Some(build_pipeline(&config)?)
    } else {
        tracing::info!("Persistence disabled, records will not be stored");
        None
    };

    let options = RunOptions {
        continue_crawl: cli.continue_crawl,
    };
    let mut coordinator = Coordinator::new(config, options, pipeline)?;
    coordinator.init_record_ids().await?;

    // Stop before the next fetch on Ctrl-C
    let stop = coordinator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current page");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let summary = coordinator.run().await;
    print_summary(&summary);

    Ok(())
}
