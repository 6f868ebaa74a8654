//! Assertion runner: executes a checklist against one browser session
//!
//! Steps run strictly in order. An assertion evaluating false is recorded and
//! the run continues; any step error (navigation timeout, driver death,
//! missing-element read) is an execution fault that appends one synthetic
//! failed record and skips the rest of the checklist. The browser session is
//! released on every path.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::checklist::{Checklist, Probe, Require, Step};
use crate::driver::{BrowserSession, DriverConfig};
use crate::error::{HarnessError, HarnessResult};

/// Name of the synthetic record appended when an execution fault aborts a run
pub const FAULT_RECORD_NAME: &str = "checklist execution";

/// The logged outcome of one assertion step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    #[serde(rename = "test")]
    pub name: String,
    pub passed: bool,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl CheckRecord {
    fn new(name: impl Into<String>, passed: bool, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Result of running a checklist.
///
/// Counts are derived from the record sequence on demand; there is no
/// parallel counter state to fall out of sync.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Insertion-ordered record sequence, never mutated after append
    pub records: Vec<CheckRecord>,

    /// Message of the execution fault that aborted the run, if any
    pub fault: Option<String>,

    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| !r.passed).count()
    }

    /// Integer success percentage, rounded; 0 for an empty sequence
    pub fn success_rate(&self) -> u32 {
        if self.records.is_empty() {
            return 0;
        }
        (100.0 * self.passed() as f64 / self.total() as f64).round() as u32
    }

    pub fn all_passed(&self) -> bool {
        self.records.iter().all(|r| r.passed)
    }
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub driver: DriverConfig,

    /// Directory screenshot steps write into
    pub screenshot_dir: PathBuf,

    /// When set, poll the target URL until it answers before starting
    pub target_ready_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            screenshot_dir: PathBuf::from("screenshots"),
            target_ready_timeout: None,
        }
    }
}

/// Page assertion runner
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run a checklist to completion or first fault.
    ///
    /// Returns `Err` only when the browser session cannot be launched at all;
    /// once the checklist has started, every failure is folded into the
    /// outcome and the caller decides exit semantics.
    pub async fn run(&self, checklist: &Checklist) -> HarnessResult<RunOutcome> {
        let start = Instant::now();
        let mut records: Vec<CheckRecord> = Vec::new();

        info!(
            "Running checklist '{}' against {}",
            checklist.name, checklist.base_url
        );

        if let Some(ready_timeout) = self.config.target_ready_timeout {
            if let Err(e) = wait_for_target(&checklist.base_url, ready_timeout).await {
                error!("✗ {}", e);
                records.push(CheckRecord::new(FAULT_RECORD_NAME, false, e.to_string()));
                return Ok(RunOutcome {
                    records,
                    fault: Some(e.to_string()),
                    duration_ms: start.elapsed().as_millis() as u64,
                });
            }
        }

        let mut driver_config = self.config.driver.clone();
        driver_config.viewport = checklist.viewport;

        let mut session = BrowserSession::launch(&driver_config).await?;
        let mut fault = None;

        for step in &checklist.steps {
            match self.execute_step(&mut session, checklist, step, &mut records).await {
                Ok(()) => {}
                Err(e) => {
                    error!("✗ execution fault: {}", e);
                    records.push(CheckRecord::new(FAULT_RECORD_NAME, false, e.to_string()));
                    fault = Some(e.to_string());
                    break;
                }
            }
        }

        if let Err(e) = session.close().await {
            warn!("Browser session close failed: {}", e);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let outcome = RunOutcome { records, fault, duration_ms };

        info!(
            "Checklist finished: {} passed, {} failed ({} ms)",
            outcome.passed(),
            outcome.failed(),
            duration_ms
        );

        Ok(outcome)
    }

    async fn execute_step(
        &self,
        session: &mut BrowserSession,
        checklist: &Checklist,
        step: &Step,
        records: &mut Vec<CheckRecord>,
    ) -> HarnessResult<()> {
        match step {
            Step::Navigate { url, wait_until, timeout_ms } => {
                let target = checklist.resolve(url);
                info!("Navigating to {}", target);
                session.goto(&target, *wait_until, *timeout_ms).await?;
            }
            Step::Click { selector, timeout_ms } => {
                session.click(selector, *timeout_ms).await?;
            }
            Step::SetViewport { width, height } => {
                info!("Viewport -> {}x{}", width, height);
                session.set_viewport(*width, *height).await?;
            }
            Step::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            Step::Log { message } => {
                info!("{}", message);
            }
            Step::Screenshot { name, full_page } => {
                std::fs::create_dir_all(&self.config.screenshot_dir)?;
                let path = self.config.screenshot_dir.join(format!("{name}.png"));
                session.screenshot(&path, *full_page).await?;
            }
            Step::Check { name, require, probes } => {
                let record = self
                    .run_check(session, checklist, name, require, probes)
                    .await?;
                if record.passed {
                    info!("✓ {} - {}", record.name, record.details);
                } else {
                    error!("✗ {} - {}", record.name, record.details);
                }
                records.push(record);
            }
        }
        Ok(())
    }

    /// Evaluate all probes of a check and append exactly one record
    async fn run_check(
        &self,
        session: &mut BrowserSession,
        checklist: &Checklist,
        name: &str,
        require: &Require,
        probes: &[Probe],
    ) -> HarnessResult<CheckRecord> {
        let mut hits = 0;
        let mut details = Vec::with_capacity(probes.len());

        for probe in probes {
            let (ok, detail) = self.evaluate_probe(session, checklist, probe).await?;
            if ok {
                hits += 1;
            }
            details.push(detail);
        }

        let passed = require.satisfied(hits, probes.len());
        let details = match require {
            Require::AtLeast(min) => format!(
                "{hits}/{} probes satisfied (need {min}): {}",
                probes.len(),
                details.join("; ")
            ),
            Require::All => details.join("; "),
        };

        Ok(CheckRecord::new(name, passed, details))
    }

    /// Read one observation from the live page and compare it
    async fn evaluate_probe(
        &self,
        session: &mut BrowserSession,
        checklist: &Checklist,
        probe: &Probe,
    ) -> HarnessResult<(bool, String)> {
        Ok(match probe {
            Probe::Title { contains } => {
                let title = session.title().await?;
                (title.contains(contains.as_str()), format!("title \"{title}\""))
            }
            Probe::Url { contains_any } => {
                let url = session.current_url().await?;
                (
                    contains_any.iter().any(|c| url.contains(c.as_str())),
                    format!("current url {url}"),
                )
            }
            Probe::Visible { selector } => {
                let visible = session.visible(selector).await?;
                (visible, format!("{selector}: visible={visible}"))
            }
            Probe::Count { selector, expect } => {
                let n = session.count(selector).await?;
                (expect.matches(n), format!("{selector}: {n} match(es)"))
            }
            Probe::Attribute { selector, name, equals, contains } => {
                let value = session.attribute(selector, name).await?;
                let ok = match (equals, contains) {
                    (Some(want), _) => value.as_deref() == Some(want.as_str()),
                    (None, Some(fragment)) => value
                        .as_deref()
                        .map(|v| v.contains(fragment.as_str()))
                        .unwrap_or(false),
                    (None, None) => value.is_some(),
                };
                let shown = value.as_deref().unwrap_or("<absent>");
                (ok, format!("{selector}[{name}]={shown}"))
            }
            Probe::Property { selector, name, equals } => {
                let value = session.property(selector, name).await?;
                let shown = match &value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (shown == *equals, format!("{selector}.{name}={shown}"))
            }
            Probe::LoadTime { url, under_ms, wait_until } => {
                let target = checklist.resolve(url);
                let elapsed = session.goto(&target, *wait_until, 30_000).await?;
                (elapsed < *under_ms, format!("loaded in {elapsed} ms"))
            }
        })
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll the target URL until it answers HTTP or the timeout elapses
pub async fn wait_for_target(url: &str, timeout_duration: Duration) -> HarnessResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout_duration {
        attempts += 1;

        match client.get(url).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for target to accept connections...");
                }
                // Connection refused is expected while the target is starting
                if !e.is_connect() {
                    warn!("Target probe error: {}", e);
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Err(HarnessError::TargetUnreachable(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, passed: bool) -> CheckRecord {
        CheckRecord::new(name, passed, "detail")
    }

    fn outcome(records: Vec<CheckRecord>, fault: Option<String>) -> RunOutcome {
        RunOutcome { records, fault, duration_ms: 0 }
    }

    #[test]
    fn counts_derive_from_records() {
        let outcome = outcome(
            vec![record("a", true), record("b", false), record("c", true)],
            None,
        );
        assert_eq!(outcome.total(), 3);
        assert_eq!(outcome.passed(), 2);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.total(), outcome.passed() + outcome.failed());
        assert!(!outcome.all_passed());
    }

    #[test]
    fn success_rate_rounds() {
        let outcome = outcome(
            vec![record("a", true), record("b", true), record("c", false)],
            None,
        );
        assert_eq!(outcome.success_rate(), 67);
    }

    #[test]
    fn success_rate_of_empty_run_is_zero() {
        let outcome = outcome(vec![], None);
        assert_eq!(outcome.success_rate(), 0);
        assert!(outcome.all_passed());
    }

    #[test]
    fn fault_record_fails_the_run() {
        let outcome = outcome(
            vec![
                record("a", true),
                record(FAULT_RECORD_NAME, false),
            ],
            Some("net::ERR_CONNECTION_REFUSED".into()),
        );
        assert!(!outcome.all_passed());
        assert_eq!(outcome.failed(), 1);
    }

    #[test]
    fn records_serialize_with_report_field_names() {
        let json = serde_json::to_value(record("pricing page loads", true)).unwrap();
        assert_eq!(json["test"], "pricing page loads");
        assert_eq!(json["passed"], true);
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
