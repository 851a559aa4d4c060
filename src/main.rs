//! Wiki-Mirror main entry point
//!
//! This is the command-line interface for the Wiki-Mirror static exporter.

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wiki_mirror::config::{compute_config_hash, resolve_config, Config, Overrides};
use wiki_mirror::crawler::crawl;
use wiki_mirror::output::print_statistics;
use wiki_mirror::ConfigError;

/// Wiki-Mirror: a static snapshot exporter for MediaWiki sites
///
/// Wiki-Mirror crawls every page reachable from the wiki's main page,
/// rewrites links to local files and downloads the stylesheets, scripts,
/// images and audio the pages use.
#[derive(Parser, Debug)]
#[command(name = "wiki-mirror")]
#[command(version)]
#[command(about = "A static snapshot exporter for MediaWiki sites", long_about = None)]
struct Cli {
    /// Base URL of the wiki (falls back to BASE_URL from the environment or .env)
    #[arg(value_name = "BASE_URL")]
    base_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the snapshot is written to
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of items processed at the same time
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let overrides = Overrides {
        base_url: cli.base_url.clone(),
        export_dir: cli.output.clone(),
        concurrency: cli.concurrency,
    };

    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }

    let config = match resolve_config(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(ConfigError::MissingBaseUrl) => {
            eprintln!("error: no base URL given and BASE_URL is not set\n");
            eprintln!("{}", Cli::command().render_usage());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let config_hash = compute_config_hash(&config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(config).await?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_mirror=info,warn"),
            1 => EnvFilter::new("wiki_mirror=debug,info"),
            2 => EnvFilter::new("wiki_mirror=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Wiki-Mirror Dry Run ===\n");

    println!("Site:");
    println!(
        "  Base URL: {}",
        config.site.base_url.as_deref().unwrap_or_default()
    );
    println!("  Main page message: {}", config.site.main_page_message);
    println!("  Fallback main page: {}", config.site.fallback_main_page);

    println!("\nCrawler:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!(
        "  Excluded namespaces: {}",
        config.crawler.excluded_namespaces.join(", ")
    );
    println!(
        "  Audio extensions: {}",
        config.crawler.audio_extensions.join(", ")
    );

    println!("\nFetcher:");
    println!("  Max retries: {}", config.fetcher.max_retries);
    println!("  Retry base delay: {}ms", config.fetcher.retry_base_delay_ms);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nOutput:");
    println!("  Export directory: {}", config.output.export_dir.display());
    match &config.output.module_cache_source {
        Some(path) => println!("  Module cache source: {}", path.display()),
        None => println!("  Module cache source: (none)"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match crawl(config).await {
        Ok(report) => {
            print_statistics(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
