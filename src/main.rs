//! Trendscout main entry point
//!
//! Command-line interface for the tech-trend crawler.

use clap::Parser;
use std::path::PathBuf;
use trendscout::config::{load_config_with_hash, Config};
use trendscout::output::write_markdown_report;
use trendscout::Orchestrator;
use tracing_subscriber::EnvFilter;

/// Trendscout: a tech-trend discovery crawler
///
/// Trendscout queries several developer-facing sites for a technology
/// domain, merges the results, and prints a deduplicated, ranked trend
/// summary.
#[derive(Parser, Debug)]
#[command(name = "trendscout")]
#[command(version = "0.2.0")]
#[command(about = "A tech-trend discovery crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Domain tag to crawl (must exist in the config's [domains] table)
    #[arg(short, long, default_value = "backend")]
    domain: String,

    /// Extra keyword to merge with the domain's curated terms (repeatable)
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Also write the report as markdown to this path
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli.domain, &cli.keywords, &hash)?;
        return Ok(());
    }

    handle_crawl(config, cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trendscout=info,warn"),
            1 => EnvFilter::new("trendscout=debug,info"),
            2 => EnvFilter::new("trendscout=trace,debug"),
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

/// Handles --dry-run: validates config and shows what would be crawled
fn handle_dry_run(
    config: &Config,
    domain: &str,
    keywords: &[String],
    hash: &str,
) -> anyhow::Result<()> {
    println!("=== Trendscout Dry Run ===\n");
    println!("Config hash: {}\n", hash);

    println!("Crawler Configuration:");
    println!("  Max items per source: {}", config.crawler.max_items);
    println!("  Request timeout: {}s", config.crawler.timeout_secs);
    println!("  Retries per request: {}", config.crawler.retry_times);
    println!(
        "  Politeness delay: {}ms - {}ms",
        config.crawler.delay_min_ms, config.crawler.delay_max_ms
    );
    println!("  Global timeout: {}s", config.crawler.global_timeout_secs);

    println!("\nCache:");
    if config.cache.enabled {
        println!("  Enabled, TTL {}s", config.cache.ttl_secs);
    } else {
        println!("  Disabled");
    }

    println!("\nEnabled Sources:");
    for source in config.sources.enabled() {
        match config.sources.base_url(source) {
            Some(base) => println!("  - {} (base: {})", source, base),
            None => println!("  - {}", source),
        }
    }

    println!("\nDomains ({}):", config.domains.len());
    for (tag, terms) in &config.domains {
        println!("  - {} ({} curated terms)", tag, terms.len());
        for term in terms {
            println!("    * {}", term);
        }
    }

    if !config.domains.contains_key(domain) {
        println!("\n✗ Domain '{}' is not defined in the config", domain);
        return Err(trendscout::TrendError::UnknownDomain {
            domain: domain.to_string(),
        }
        .into());
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl domain '{}' with {} extra keyword(s)",
        domain,
        keywords.len()
    );

    Ok(())
}

/// Runs the crawl and prints the report as JSON to stdout
async fn handle_crawl(config: Config, cli: Cli) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(config)?;

    let report = match orchestrator.run(&cli.domain, &cli.keywords).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let failed = report.sources.iter().filter(|s| !s.success).count();
    if failed > 0 {
        tracing::warn!(
            "{} of {} sources failed; summary covers the rest",
            failed,
            report.sources.len()
        );
    }

    if let Some(path) = &cli.export {
        write_markdown_report(&report, path)?;
        tracing::info!("Markdown report written to: {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
