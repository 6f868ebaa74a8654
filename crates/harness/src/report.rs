//! JSON report document and writer

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HarnessResult;
use crate::runner::{CheckRecord, RunOutcome};

/// Tool identifier embedded in every report
pub const TOOL_NAME: &str = "pagecheck/playwright";

/// Default report location relative to the working directory
pub const DEFAULT_REPORT_PATH: &str = "pagecheck-report.json";

/// The report document written once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub tests: Vec<CheckRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    /// Integer percentage 0-100, rounded
    #[serde(rename = "successRate")]
    pub success_rate: u32,

    /// ISO-8601 time the report was produced
    pub timestamp: String,

    pub tool: String,
}

impl Report {
    /// Build a report from a run outcome; the summary is derived from the
    /// record sequence
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        Self {
            summary: Summary {
                total: outcome.total(),
                passed: outcome.passed(),
                failed: outcome.failed(),
                success_rate: outcome.success_rate(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                tool: TOOL_NAME.to_string(),
            },
            tests: outcome.records.clone(),
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write(&self, path: &Path) -> HarnessResult<PathBuf> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        info!("Report written to: {}", path.display());
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunOutcome;
    use chrono::Utc;

    fn sample_outcome() -> RunOutcome {
        let records = [("pricing page loads", true), ("plan prices correct", false)]
            .into_iter()
            .map(|(name, passed)| CheckRecord {
                name: name.to_string(),
                passed,
                details: "detail".to_string(),
                timestamp: Utc::now(),
            })
            .collect();
        RunOutcome { records, fault: None, duration_ms: 1234 }
    }

    #[test]
    fn summary_derives_from_records() {
        let report = Report::from_outcome(&sample_outcome());
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.success_rate, 50);
        assert_eq!(report.summary.tool, TOOL_NAME);
        assert_eq!(
            report.summary.total,
            report.summary.passed + report.summary.failed
        );
    }

    #[test]
    fn json_shape_uses_documented_field_names() {
        let json = serde_json::to_value(Report::from_outcome(&sample_outcome())).unwrap();
        assert!(json["summary"]["successRate"].is_u64());
        assert!(json["summary"]["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["tests"][0]["test"], "pricing page loads");
        assert_eq!(json["tests"][1]["passed"], false);
    }

    #[test]
    fn written_report_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("report.json");

        let report = Report::from_outcome(&sample_outcome());
        let written = report.write(&path).unwrap();
        assert_eq!(written, path);

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Report = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.summary.total, 2);
        assert_eq!(parsed.tests.len(), 2);
        assert_eq!(parsed.tests[0].name, "pricing page loads");
    }
}
