//! webcrawler main entry point
//!
//! This is the command-line interface for the webcrawler site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use webcrawler::config::{read_config_with_hash, validate, Config};
use webcrawler::output::{emit_report, file_sinks, ConsoleSink, ResultSink};
use webcrawler::Coordinator;

/// webcrawler: a bounded, polite, concurrent site crawler
///
/// Crawls every page under a seed URL while respecting robots.txt, a global
/// politeness delay and an optional page budget, then writes the link graph
/// it found as a JSON report.
#[derive(Parser, Debug)]
#[command(name = "webcrawler")]
#[command(version)]
#[command(about = "A polite single-site web crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from; overrides `seed-url` in the config file
    #[arg(value_name = "SEED")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Stop after this many pages have been crawled successfully
    #[arg(short, long)]
    max_pages: Option<usize>,

    /// Minimum time between requests, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Path of the JSON report
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Also write a markdown summary to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line values on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(seed) = &self.seed {
            config.crawler.seed_url = seed.clone();
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = Some(max_pages);
        }
        if let Some(delay_ms) = self.delay_ms {
            config.crawler.politeness_delay_ms = delay_ms;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.crawler.request_timeout_secs = timeout_secs;
        }
        if let Some(output) = &self.output {
            config.output.report_path = output.clone();
        }
        if let Some(summary) = &self.summary {
            config.output.summary_path = Some(summary.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = read_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, config_hash, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webcrawler=info,warn"),
            1 => EnvFilter::new("webcrawler=debug,info"),
            2 => EnvFilter::new("webcrawler=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== webcrawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Workers: {}", config.crawler.workers);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unbounded"),
    }
    println!(
        "  Politeness delay: {}ms",
        config.crawler.politeness_delay_ms
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!(
        "  Attempts per URL: {} (backoff from {}ms)",
        config.crawler.max_attempts, config.crawler.retry_backoff_ms
    );

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());
    println!("  Robots token: {}", config.user_agent.product_token());

    println!("\nOutput:");
    println!("  Report: {}", config.output.report_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl everything under {}",
        config.crawler.seed_url
    );
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: Option<String>,
    quiet: bool,
) -> anyhow::Result<()> {
    let sinks = file_sinks(&config.output);

    let mut coordinator = Coordinator::new(config).context("Failed to start crawl")?;
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    let report = coordinator.run().await.context("Crawl failed")?;

    if !quiet {
        ConsoleSink.write_report(&report)?;
    }
    emit_report(&report, &sinks).context("Failed to write crawl output")?;

    Ok(())
}
