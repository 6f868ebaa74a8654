//! Error types for the assertion harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("driver failed to start: {0}")]
    DriverStartup(String),

    #[error("driver exited before answering")]
    DriverExited,

    #[error("driver protocol error: {0}")]
    Protocol(String),

    #[error("browser step failed: {0}")]
    Step(String),

    #[error("checklist parse error: {0}")]
    ChecklistParse(String),

    #[error("target not reachable after {0} attempts")]
    TargetUnreachable(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
