//! pagecheck - scripted browser assertions against a target page
//!
//! Runs a declarative checklist (YAML, or the built-in pricing one) through
//! the assertion harness, writes the JSON report, prints a console summary,
//! and exits 0 when every record passed, 1 otherwise.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use pagecheck_harness::driver::{Browser, DriverConfig};
use pagecheck_harness::report::{Report, DEFAULT_REPORT_PATH};
use pagecheck_harness::runner::{Runner, RunnerConfig};
use pagecheck_harness::{pricing, Checklist};

mod output;

#[derive(Parser, Debug)]
#[command(name = "pagecheck")]
#[command(author, version)]
#[command(about = "Scripted browser assertions against a target page")]
struct Args {
    /// Path to a YAML checklist (defaults to the built-in pricing checklist)
    #[arg(short, long)]
    checklist: Option<PathBuf>,

    /// Override the checklist base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run with a visible browser window instead of headless
    #[arg(long)]
    headed: bool,

    /// Wait up to this many seconds for the target to answer before starting
    #[arg(long)]
    wait_ready: Option<u64>,

    /// Output path for the JSON report
    #[arg(short, long, default_value = DEFAULT_REPORT_PATH)]
    output: PathBuf,

    /// Directory screenshot steps write into
    #[arg(long, default_value = "screenshots")]
    screenshot_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let mut checklist = match &args.checklist {
        Some(path) => Checklist::from_file(path)
            .with_context(|| format!("loading checklist {}", path.display()))?,
        None => pricing::pricing(),
    };
    if let Some(base_url) = args.base_url {
        checklist.base_url = base_url;
    }
    tracing::debug!(
        "Loaded checklist '{}' with {} steps",
        checklist.name,
        checklist.steps.len()
    );

    let browser = match args.browser.as_str() {
        "firefox" => Browser::Firefox,
        "webkit" => Browser::Webkit,
        _ => Browser::Chromium,
    };

    let config = RunnerConfig {
        driver: DriverConfig {
            browser,
            headless: !args.headed,
            ..Default::default()
        },
        screenshot_dir: args.screenshot_dir,
        target_ready_timeout: args.wait_ready.map(Duration::from_secs),
    };

    let outcome = match Runner::with_config(config).run(&checklist).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // Nothing ran; no report to write
            output::print_error(&format!("run did not start: {e}"));
            std::process::exit(1);
        }
    };

    let report = Report::from_outcome(&outcome);
    let report_path = report
        .write(&args.output)
        .with_context(|| format!("writing report {}", args.output.display()))?;

    output::print_summary(&checklist.name, &outcome, &report_path);

    std::process::exit(if outcome.all_passed() { 0 } else { 1 });
}
