//! Reach-Probe main entry point
//!
//! This is the command-line interface for the Reach-Probe domain checker.

use anyhow::{bail, Context};
use clap::Parser;
use reach_probe::config::{load_config_with_hash, Config};
use reach_probe::probe::Runner;
use reach_probe::schedule::{run_forever, shutdown_signal};
use reach_probe::state::ProbeTarget;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reach-Probe: an adaptive HTTP reachability prober
///
/// Reach-Probe reads a list of domains from a sheet service, probes each one
/// (optionally through a per-domain proxy) with failure-aware retries, and
/// writes the verdicts back as a new result sheet.
#[derive(Parser, Debug)]
#[command(name = "reach-probe")]
#[command(version = "1.0.0")]
#[command(about = "An adaptive HTTP reachability prober", long_about = None)]
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

    /// Sheet service token (overrides the config file)
    #[arg(long, env = "REACH_PROBE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Run a single pass and exit instead of following the schedule
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "probe"])]
    once: bool,

    /// Validate config and show what would run without probing anything
    #[arg(long, conflicts_with_all = ["stats", "probe"])]
    dry_run: bool,

    /// Show statistics of the latest run from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "probe"])]
    stats: bool,

    /// Probe a single domain, print the outcome and exit
    #[arg(long, value_name = "DOMAIN")]
    probe: Option<String>,

    /// Proxy descriptor used with --probe
    #[arg(long, value_name = "PROXY", requires = "probe")]
    proxy: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.stats {
        return handle_stats(&config);
    }

    let token = cli
        .token
        .clone()
        .or_else(|| config.sheets.token.clone())
        .filter(|t| !t.is_empty());

    if let Some(domain) = &cli.probe {
        return handle_probe(config, domain, cli.proxy.as_deref()).await;
    }

    let Some(token) = token else {
        bail!("No sheet service token: set sheets.token or REACH_PROBE_TOKEN");
    };

    let schedule = config.schedule.clone();
    let runner = Runner::from_config(config, config_hash, token)
        .context("Failed to initialize the prober")?;

    if cli.once {
        let summary = runner.run_once().await.context("Run failed")?;
        tracing::info!(
            "Run completed: {} domains, {} succeeded, sheet {}",
            summary.total,
            summary.succeeded,
            summary.sheet_name
        );
        return Ok(());
    }

    tracing::info!(
        "Scheduling {} runs per day at UTC{:+}",
        schedule.runs_per_day,
        schedule.utc_offset_hours
    );
    run_forever(&runner, &schedule, shutdown_signal()).await;
    tracing::info!("Stopped");

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reach_probe=info,warn"),
            1 => EnvFilter::new("reach_probe=debug,info"),
            2 => EnvFilter::new("reach_probe=trace,debug"),
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
    println!("=== Reach-Probe Dry Run ===\n");

    println!("Probe Configuration:");
    println!("  Default max slots: {}", config.probe.default_max_slots);
    println!(
        "  Default max wait: {}s",
        config.probe.default_max_wait_seconds
    );
    println!("  Request timeout: {}ms", config.probe.request_timeout_ms);
    println!("  Max redirect chase: {}", config.probe.max_redirect_chase);
    println!("  Concurrency limit: {}", config.probe.concurrency_limit);

    println!("\nUser Agent:");
    println!("  Default: {}", config.user_agent.default);

    println!("\nSheet Service:");
    println!("  API URL: {}", config.sheets.api_url);
    println!(
        "  Token: {}",
        if config.sheets.token.is_some() { "set" } else { "from environment" }
    );
    if let Some(id) = &config.sheets.input_spreadsheet_id {
        println!("  Input spreadsheet: {}", id);
    }
    if let Some(id) = &config.sheets.output_spreadsheet_id {
        println!("  Output spreadsheet: {}", id);
    }

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nSchedule:");
    println!("  UTC offset: {:+}h", config.schedule.utc_offset_hours);
    println!("  Runs per day: {}", config.schedule.runs_per_day);
    println!("  Run on start: {}", config.schedule.run_on_start);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the latest run
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use reach_probe::output::{load_statistics, print_statistics};
    use reach_probe::storage::open_store;
    use std::path::Path;

    println!("Database: {}\n", config.storage.database_path);

    let storage = open_store(Path::new(&config.storage.database_path))
        .context("Failed to open the database")?;

    match load_statistics(&storage)? {
        Some(stats) => print_statistics(&stats),
        None => println!("No runs recorded yet"),
    }

    Ok(())
}

/// Handles the --probe mode: probes one domain without touching the sheet or database
async fn handle_probe(
    config: Config,
    domain: &str,
    proxy: Option<&str>,
) -> anyhow::Result<()> {
    use reach_probe::probe::{HttpExecutor, Prober, TokioSleeper};
    use reach_probe::url::normalize_domain;
    use std::sync::Arc;
    use std::time::Duration;

    let executor = HttpExecutor::new(
        Duration::from_millis(config.probe.request_timeout_ms),
        config.user_agent.default.clone(),
    )
    .context("Failed to build the HTTP client")?;
    let prober = Prober::new(
        Arc::new(executor),
        Arc::new(TokioSleeper),
        config.probe.max_redirect_chase,
    );

    let mut target = ProbeTarget::new(
        normalize_domain(domain),
        config.probe.default_max_slots,
        config.probe.default_max_wait_seconds,
    );
    if let Some(proxy) = proxy {
        target = target.with_proxy(proxy);
    }

    let outcome = prober.probe(&target).await;

    println!("Domain:       {}", outcome.domain);
    println!("Verdict:      {}", outcome.status_final);
    println!("HTTP status:  {}", outcome.status_http);
    println!("Attempts:     {}", outcome.tried_count);
    println!("URL:          {}", outcome.reported_url());
    if let Some(error) = outcome.last_error {
        println!("Last error:   {}", error);
    }
    println!("Content:      {}", outcome.content_snippet);

    Ok(())
}
