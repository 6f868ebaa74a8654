//! Browser session over a long-lived Playwright driver subprocess
//!
//! The driver script is written to a temp directory and run with `node`; it
//! launches one browser, context, and page, then serves one JSON command per
//! stdin line and answers one JSON response per stdout line. The session owns
//! the subprocess exclusively and releases it on every exit path.

use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::checklist::{Viewport, WaitUntil};
use crate::error::{HarnessError, HarnessResult};

const DRIVER_JS: &str = include_str!("driver.js");

/// Grace period between a `close` command and forceful termination
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for the driver subprocess
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport: Viewport,

    /// Node binary used to run the driver script
    pub node_binary: PathBuf,

    /// Timeout for browser launch and the ready handshake
    pub startup_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport { width: 1280, height: 720 },
            node_binary: PathBuf::from("node"),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// One command sent to the driver
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum DriverCommand {
    Goto { url: String, wait_until: WaitUntil, timeout_ms: u64 },
    Title,
    Url,
    Count { selector: String },
    Visible { selector: String },
    Attribute { selector: String, name: String },
    Property { selector: String, name: String },
    Click { selector: String, timeout_ms: u64 },
    SetViewport { width: u32, height: u32 },
    Screenshot { path: String, full_page: bool },
    Close,
}

/// One response line from the driver
#[derive(Debug, Deserialize)]
struct DriverResponse {
    ok: bool,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    elapsed_ms: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    event: Option<String>,
}

/// Handle to a running browser session
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,

    /// Keeps the driver script alive for the lifetime of the session
    _driver_dir: TempDir,
}

impl BrowserSession {
    /// Spawn the driver and wait for its ready handshake
    pub async fn launch(config: &DriverConfig) -> HarnessResult<Self> {
        Self::check_playwright_installed()?;

        let driver_dir = tempfile::tempdir()?;
        let script_path = driver_dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_JS)?;

        debug!("Spawning browser driver: {}", script_path.display());

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .env("PAGECHECK_BROWSER", config.browser.as_str())
            .env("PAGECHECK_HEADLESS", if config.headless { "1" } else { "0" })
            .env("PAGECHECK_VIEWPORT_W", config.viewport.width.to_string())
            .env("PAGECHECK_VIEWPORT_H", config.viewport.height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                HarnessError::DriverStartup(format!(
                    "failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HarnessError::DriverStartup("stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::DriverStartup("stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| HarnessError::DriverStartup("stderr not captured".into()))?;

        // Forward driver diagnostics to our own logs
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("driver: {}", line);
            }
        });

        let mut session = Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            _driver_dir: driver_dir,
        };

        let ready = timeout(config.startup_timeout, session.lines.next_line())
            .await
            .map_err(|_| {
                HarnessError::DriverStartup("timed out waiting for browser launch".into())
            })?
            .map_err(HarnessError::Io)?
            .ok_or(HarnessError::DriverExited)?;

        let ready: DriverResponse = serde_json::from_str(&ready)
            .map_err(|e| HarnessError::Protocol(format!("bad ready line: {e}")))?;
        if !ready.ok || ready.event.as_deref() != Some("ready") {
            return Err(HarnessError::DriverStartup(
                ready.error.unwrap_or_else(|| "driver refused to start".into()),
            ));
        }

        debug!("Browser session ready ({})", config.browser.as_str());
        Ok(session)
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> HarnessResult<()> {
        let output = StdCommand::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::PlaywrightNotFound),
        }
    }

    /// Send one command and wait for its response line
    async fn call(&mut self, cmd: &DriverCommand) -> HarnessResult<DriverResponse> {
        let mut line = serde_json::to_string(cmd)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = self
            .lines
            .next_line()
            .await?
            .ok_or(HarnessError::DriverExited)?;
        let reply: DriverResponse = serde_json::from_str(&reply)
            .map_err(|e| HarnessError::Protocol(format!("bad response line: {e}")))?;

        if reply.ok {
            Ok(reply)
        } else {
            Err(HarnessError::Step(
                reply.error.unwrap_or_else(|| "unspecified driver error".into()),
            ))
        }
    }

    /// Navigate; resolves once the wait condition is met. Returns elapsed ms.
    pub async fn goto(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout_ms: u64,
    ) -> HarnessResult<u64> {
        let reply = self
            .call(&DriverCommand::Goto {
                url: url.to_string(),
                wait_until,
                timeout_ms,
            })
            .await?;
        Ok(reply.elapsed_ms.unwrap_or(0))
    }

    pub async fn title(&mut self) -> HarnessResult<String> {
        let reply = self.call(&DriverCommand::Title).await?;
        expect_string(reply.value, "title")
    }

    pub async fn current_url(&mut self) -> HarnessResult<String> {
        let reply = self.call(&DriverCommand::Url).await?;
        expect_string(reply.value, "url")
    }

    pub async fn count(&mut self, selector: &str) -> HarnessResult<usize> {
        let reply = self
            .call(&DriverCommand::Count { selector: selector.to_string() })
            .await?;
        reply
            .value
            .as_ref()
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .ok_or_else(|| HarnessError::Protocol("count answered without a number".into()))
    }

    pub async fn visible(&mut self, selector: &str) -> HarnessResult<bool> {
        let reply = self
            .call(&DriverCommand::Visible { selector: selector.to_string() })
            .await?;
        reply
            .value
            .as_ref()
            .and_then(Value::as_bool)
            .ok_or_else(|| HarnessError::Protocol("visible answered without a bool".into()))
    }

    /// Attribute of the first matching element; None when the element or
    /// attribute is absent
    pub async fn attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> HarnessResult<Option<String>> {
        let reply = self
            .call(&DriverCommand::Attribute {
                selector: selector.to_string(),
                name: name.to_string(),
            })
            .await?;
        Ok(reply.value.and_then(|v| v.as_str().map(String::from)))
    }

    /// DOM property of the first matching element; faults if no element matches
    pub async fn property(&mut self, selector: &str, name: &str) -> HarnessResult<Value> {
        let reply = self
            .call(&DriverCommand::Property {
                selector: selector.to_string(),
                name: name.to_string(),
            })
            .await?;
        Ok(reply.value.unwrap_or(Value::Null))
    }

    pub async fn click(&mut self, selector: &str, timeout_ms: Option<u64>) -> HarnessResult<()> {
        self.call(&DriverCommand::Click {
            selector: selector.to_string(),
            timeout_ms: timeout_ms.unwrap_or(5000),
        })
        .await?;
        Ok(())
    }

    pub async fn set_viewport(&mut self, width: u32, height: u32) -> HarnessResult<()> {
        self.call(&DriverCommand::SetViewport { width, height }).await?;
        Ok(())
    }

    pub async fn screenshot(&mut self, path: &Path, full_page: bool) -> HarnessResult<()> {
        self.call(&DriverCommand::Screenshot {
            path: path.to_string_lossy().to_string(),
            full_page,
        })
        .await?;
        Ok(())
    }

    /// Close the browser and reap the driver, escalating if it hangs
    pub async fn close(mut self) -> HarnessResult<()> {
        let _ = self.call(&DriverCommand::Close).await;

        match timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!("Driver did not exit after close, terminating");
                self.terminate().await;
                Ok(())
            }
        }
    }

    async fn terminate(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && timeout(Duration::from_millis(500), self.child.wait())
                    .await
                    .is_ok()
            {
                return;
            }
        }

        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

fn expect_string(value: Option<Value>, what: &str) -> HarnessResult<String> {
    value
        .and_then(|v| v.as_str().map(String::from))
        .ok_or_else(|| HarnessError::Protocol(format!("{what} answered without a string")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_with_op_tags() {
        let cmd = DriverCommand::Goto {
            url: "http://localhost:8000/subscription/pricing/".into(),
            wait_until: WaitUntil::DomContentLoaded,
            timeout_ms: 10_000,
        };
        let json: Value = serde_json::from_str(&serde_json::to_string(&cmd).unwrap()).unwrap();
        assert_eq!(json["op"], "goto");
        assert_eq!(json["wait_until"], "domcontentloaded");
        assert_eq!(json["timeout_ms"], 10_000);

        let cmd = DriverCommand::SetViewport { width: 375, height: 667 };
        let json: Value = serde_json::from_str(&serde_json::to_string(&cmd).unwrap()).unwrap();
        assert_eq!(json["op"], "set_viewport");
        assert_eq!(json["width"], 375);
    }

    #[test]
    fn responses_parse_both_shapes() {
        let ok: DriverResponse = serde_json::from_str(r#"{"ok":true,"value":3}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.value.unwrap().as_u64(), Some(3));

        let err: DriverResponse =
            serde_json::from_str(r#"{"ok":false,"error":"net::ERR_CONNECTION_REFUSED"}"#).unwrap();
        assert!(!err.ok);
        assert!(err.error.unwrap().contains("CONNECTION_REFUSED"));

        let ready: DriverResponse =
            serde_json::from_str(r#"{"ok":true,"event":"ready"}"#).unwrap();
        assert_eq!(ready.event.as_deref(), Some("ready"));
    }

    #[test]
    fn default_config_is_headless_chromium() {
        let config = DriverConfig::default();
        assert!(config.headless);
        assert_eq!(config.browser.as_str(), "chromium");
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 720);
    }
}
