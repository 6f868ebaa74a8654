//! Pagecheck assertion harness
//!
//! Drives a headless browser through a declarative checklist of
//! navigation / query / assert steps against one target page:
//! - Spawns a long-lived Playwright driver subprocess and owns it exclusively
//! - Parses declarative YAML checklists (or uses the built-in pricing one)
//! - Accumulates an insertion-ordered sequence of pass/fail records; all
//!   counts are derived from the sequence
//! - Writes one JSON report per run and returns a structured outcome,
//!   leaving exit semantics to the caller
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Assertion Runner (Rust)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Runner                                                     │
//! │    ├── BrowserSession::launch() -> node driver subprocess   │
//! │    ├── execute_step(step) -> ()  | execution fault          │
//! │    ├── run_check(check)  -> CheckRecord (exactly one)       │
//! │    └── RunOutcome { records, fault, duration_ms }           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Checklist (YAML or built-in)                               │
//! │    ├── name, base_url, viewport                             │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url, wait_until, timeout_ms }       │
//! │          ├── click { selector }                             │
//! │          ├── set_viewport { width, height }                 │
//! │          └── check { name, require, probes: [Probe] }       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  driver.js (Playwright) — one JSON command per stdin line,  │
//! │  one JSON response per stdout line, one page per session    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod checklist;
pub mod driver;
pub mod error;
pub mod pricing;
pub mod report;
pub mod runner;

pub use checklist::{Checklist, Probe, Step};
pub use error::{HarnessError, HarnessResult};
pub use report::Report;
pub use runner::{CheckRecord, RunOutcome, Runner};
