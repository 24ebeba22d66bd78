//! webcrawler main entry point
//!
//! This is the command-line interface for the concurrent web crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use webcrawler::config::{load_config, validate, Config};
use webcrawler::output::{generate_markdown_summary, print_statistics, CrawlSummary};
use webcrawler::{HttpFetcher, WebCrawler};

/// webcrawler: a concurrent, host-aware web crawler
///
/// Crawls outward from a seed address up to a depth limit, with separate
/// limits on concurrent downloads, concurrent link extraction and concurrent
/// requests per host.
#[derive(Parser, Debug)]
#[command(name = "webcrawler")]
#[command(version)]
#[command(about = "A concurrent, host-aware web crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum number of hops from the seed (the seed counts as one)
    #[arg(value_name = "DEPTH")]
    depth: Option<u32>,

    /// Number of concurrent downloads
    #[arg(value_name = "DOWNLOADERS")]
    downloaders: Option<usize>,

    /// Number of concurrent link extractions
    #[arg(value_name = "EXTRACTORS")]
    extractors: Option<usize>,

    /// Number of concurrent downloads per host
    #[arg(value_name = "PER_HOST")]
    per_host: Option<usize>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a markdown summary of the crawl to this file
    #[arg(short, long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line limits on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(depth) = self.depth {
            config.crawler.depth = depth;
        }
        if let Some(downloaders) = self.downloaders {
            config.crawler.downloaders = downloaders;
        }
        if let Some(extractors) = self.extractors {
            config.crawler.extractors = extractors;
        }
        if let Some(per_host) = self.per_host {
            config.crawler.per_host = per_host;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("invalid crawl settings")?;

    let fetcher = HttpFetcher::new(&config.user_agent, &config.http)
        .context("failed to build HTTP client")?;
    let crawler = WebCrawler::new(Arc::new(fetcher), &config.crawler)?;

    let started_at = Utc::now();
    let result = crawler.crawl(&cli.url, config.crawler.depth).await;
    let finished_at = Utc::now();
    crawler.close();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let summary = CrawlSummary::new(
        cli.url.as_str(),
        config.crawler.depth,
        started_at,
        finished_at,
        &report,
    );

    if !cli.quiet {
        print_statistics(&summary.statistics);
    }

    if let Some(path) = &cli.summary {
        generate_markdown_summary(&summary, path)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to: {}", path.display());
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
        .init();
}
