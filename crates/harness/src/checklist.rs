//! Declarative YAML checklist specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::HarnessResult;

/// A complete checklist parsed from YAML (or built in code)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    /// Unique name for this checklist
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering checklists
    #[serde(default)]
    pub tags: Vec<String>,

    /// Base URL that relative step URLs are resolved against
    pub base_url: String,

    /// Initial viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_until: WaitUntil,
        #[serde(default = "default_nav_timeout")]
        timeout_ms: u64,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Change the viewport mid-run
    SetViewport {
        width: u32,
        height: u32,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    /// Log a section header to the console
    Log {
        message: String,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },

    /// Assert something about the page; appends exactly one result record
    Check {
        name: String,
        #[serde(default)]
        require: Require,
        probes: Vec<Probe>,
    },
}

fn default_nav_timeout() -> u64 {
    30_000
}

/// Load state a navigation waits for
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    #[default]
    Load,
    DomContentLoaded,
    NetworkIdle,
}

/// One observation of the live page, compared against an expected condition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Probe {
    /// The page title contains a substring
    Title {
        contains: String,
    },

    /// The current URL contains any of the given substrings
    Url {
        contains_any: Vec<String>,
    },

    /// The first element matching the selector is visible
    Visible {
        selector: String,
    },

    /// The number of elements matching the selector
    Count {
        selector: String,
        #[serde(default)]
        expect: CountExpect,
    },

    /// An attribute of the first matching element.
    /// With neither `equals` nor `contains`, the attribute must merely exist.
    Attribute {
        selector: String,
        name: String,
        #[serde(default)]
        equals: Option<String>,
        #[serde(default)]
        contains: Option<String>,
    },

    /// A DOM property of the first matching element equals a value
    Property {
        selector: String,
        name: String,
        equals: String,
    },

    /// A fresh navigation to `url` completes within a time budget
    LoadTime {
        url: String,
        under_ms: u64,
        #[serde(default)]
        wait_until: WaitUntil,
    },
}

/// Expected element count
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountExpect {
    Exactly(usize),
    AtLeast(usize),
}

impl Default for CountExpect {
    fn default() -> Self {
        CountExpect::AtLeast(1)
    }
}

impl CountExpect {
    pub fn matches(&self, n: usize) -> bool {
        match self {
            CountExpect::Exactly(want) => n == *want,
            CountExpect::AtLeast(min) => n >= *min,
        }
    }
}

/// How many probes must hold for a check to pass
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Require {
    #[default]
    All,
    AtLeast(usize),
}

impl Require {
    pub fn satisfied(&self, hits: usize, total: usize) -> bool {
        match self {
            Require::All => hits == total,
            Require::AtLeast(min) => hits >= *min,
        }
    }
}

impl Checklist {
    /// Parse a checklist from a YAML string
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a checklist from a YAML file
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all checklists from a directory
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        let mut checklists = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            checklists.push(Self::from_file(entry.path())?);
        }

        Ok(checklists)
    }

    /// Resolve a step URL against the base URL. Absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url.trim_end_matches('/'), url)
        } else {
            url.to_string()
        }
    }

    /// Number of `Check` steps (the nominal record count for a clean run)
    pub fn check_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Check { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parse_simple_checklist() {
        let yaml = r#"
name: pricing-smoke
description: Pricing page renders its plans
base_url: http://localhost:8000
tags:
  - smoke
steps:
  - action: navigate
    url: /subscription/pricing/
    wait_until: domcontentloaded
    timeout_ms: 10000
  - action: check
    name: pricing page loads
    probes:
      - kind: title
        contains: Planes y Precios
"#;
        let checklist = Checklist::from_yaml(yaml).unwrap();
        assert_eq!(checklist.name, "pricing-smoke");
        assert_eq!(checklist.steps.len(), 2);
        assert_eq!(checklist.check_count(), 1);
        assert_eq!(checklist.viewport.width, 1280);

        match &checklist.steps[0] {
            Step::Navigate { url, timeout_ms, .. } => {
                assert_eq!(url, "/subscription/pricing/");
                assert_eq!(*timeout_ms, 10_000);
            }
            other => panic!("expected navigate, got {other:?}"),
        }
    }

    #[test]
    fn parse_probe_variants() {
        let yaml = r#"
name: probes
base_url: http://localhost:8000
steps:
  - action: check
    name: mixed probes
    require: !at_least 2
    probes:
      - kind: visible
        selector: text=Plan Individual
      - kind: count
        selector: text=$3.990
        expect: !exactly 2
      - kind: attribute
        selector: html
        name: lang
        equals: es
      - kind: url
        contains_any:
          - /registro/
          - /login/
      - kind: load_time
        url: /subscription/pricing/
        under_ms: 3000
"#;
        let checklist = Checklist::from_yaml(yaml).unwrap();
        let Step::Check { require, probes, .. } = &checklist.steps[0] else {
            panic!("expected check step");
        };
        assert!(matches!(require, Require::AtLeast(2)));
        assert_eq!(probes.len(), 5);
        assert!(matches!(
            probes[1],
            Probe::Count { expect: CountExpect::Exactly(2), .. }
        ));
    }

    #[test]
    fn count_expect_defaults_to_at_least_one() {
        let yaml = r#"
name: default-count
base_url: http://localhost:8000
steps:
  - action: check
    name: price present
    probes:
      - kind: count
        selector: text=$3.990
"#;
        let checklist = Checklist::from_yaml(yaml).unwrap();
        let Step::Check { probes, .. } = &checklist.steps[0] else {
            panic!("expected check step");
        };
        assert!(matches!(
            probes[0],
            Probe::Count { expect: CountExpect::AtLeast(1), .. }
        ));
    }

    #[test_case(CountExpect::AtLeast(1), 0, false)]
    #[test_case(CountExpect::AtLeast(1), 3, true)]
    #[test_case(CountExpect::Exactly(2), 2, true)]
    #[test_case(CountExpect::Exactly(2), 3, false)]
    fn count_expect_matches(expect: CountExpect, n: usize, want: bool) {
        assert_eq!(expect.matches(n), want);
    }

    #[test_case(Require::All, 3, 3, true)]
    #[test_case(Require::All, 2, 3, false)]
    #[test_case(Require::AtLeast(3), 3, 5, true)]
    #[test_case(Require::AtLeast(3), 2, 5, false)]
    fn require_satisfied(require: Require, hits: usize, total: usize, want: bool) {
        assert_eq!(require.satisfied(hits, total), want);
    }

    #[test]
    fn resolve_joins_relative_urls() {
        let checklist = Checklist {
            name: "resolve".into(),
            description: String::new(),
            tags: vec![],
            base_url: "http://localhost:8000/".into(),
            viewport: default_viewport(),
            steps: vec![],
        };
        assert_eq!(
            checklist.resolve("/subscription/pricing/"),
            "http://localhost:8000/subscription/pricing/"
        );
        assert_eq!(
            checklist.resolve("https://example.com/x"),
            "https://example.com/x"
        );
        assert_eq!(checklist.resolve("data:text/html,<p>hi</p>"), "data:text/html,<p>hi</p>");
    }
}
