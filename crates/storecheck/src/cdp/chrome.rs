use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncBufReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info};

static BROWSER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How long a freshly spawned Chrome gets to print its DevTools URL.
const DEVTOOLS_URL_TIMEOUT: Duration = Duration::from_secs(10);

/// Launch settings for a local Chrome.
#[derive(Clone, Debug, Default)]
pub struct LaunchOptions {
    /// Explicit executable; searched on the usual locations when `None`.
    pub executable: Option<String>,
    /// Show the browser window instead of running `--headless=new`.
    pub headful: bool,
}

/// Chrome process lifecycle: launch (or connect to remote), open and close tabs.
pub struct Chrome {
    /// None when connected to a remote Chrome we don't own.
    child: Option<Child>,
    /// host:port for the HTTP JSON API and per-tab WebSocket URLs.
    host_port: String,
    /// Throwaway profile, removed on drop (local Chrome only).
    data_dir: Option<PathBuf>,
}

impl Chrome {
    /// Launch a local Chrome with `--remote-debugging-port=0` and read the
    /// assigned port from its stderr.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let id = BROWSER_COUNTER.fetch_add(1, Ordering::Relaxed);
        let data_dir =
            std::env::temp_dir().join(format!("storecheck-{}-{id}", std::process::id()));

        let chrome_path = match &options.executable {
            Some(path) => path.clone(),
            None => find_chrome()?,
        };
        info!(path = %chrome_path, headful = options.headful, "launching local Chrome");

        let mut cmd = Command::new(&chrome_path);
        if !options.headful {
            cmd.arg("--headless=new");
        }
        let mut child = cmd
            .args([
                "--disable-gpu",
                "--no-first-run",
                "--no-default-browser-check",
                "--disable-extensions",
                "--disable-sync",
                "--disable-translate",
                "--disable-features=PasswordLeakDetection",
                "--password-store=basic",
                "--mute-audio",
                "--hide-scrollbars",
                "--remote-debugging-port=0",
            ])
            .arg(format!("--user-data-dir={}", data_dir.display()))
            .stderr(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn Chrome at {chrome_path}"))?;

        let stderr = child.stderr.take().context("No stderr from Chrome")?;
        let mut lines = tokio::io::BufReader::new(stderr).lines();

        let debug_url: String = loop {
            let line: Option<String> = tokio::time::timeout(DEVTOOLS_URL_TIMEOUT, lines.next_line())
                .await
                .context("Timed out waiting for Chrome DevTools URL")?
                .context("Failed to read Chrome stderr")?;

            match line {
                Some(ref text) => {
                    if let Some(url) = parse_devtools_line(text) {
                        break url;
                    }
                }
                None => bail!("Chrome exited before printing DevTools URL"),
            }
        };

        debug!(url = %debug_url, "Chrome DevTools URL discovered");
        let host_port = parse_host_port(&debug_url)?;

        Ok(Self {
            child: Some(child),
            host_port,
            data_dir: Some(data_dir),
        })
    }

    /// Connect to a Chrome that is already running (e.g. in Docker).
    ///
    /// `base_url` is `http://host:port`; the caller's host:port is used for
    /// every later request, whatever address Chrome reports internally.
    pub async fn connect(base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let version_url = format!("{base}/json/version");

        let caller_host_port = base
            .split("://")
            .nth(1)
            .context("Invalid chrome_url: no scheme")?
            .to_string();

        info!(url = %version_url, "connecting to remote Chrome");
        reqwest::get(&version_url)
            .await
            .with_context(|| format!("Failed to reach Chrome at {version_url}"))?
            .error_for_status()
            .context("Chrome /json/version returned error")?;

        Ok(Self {
            child: None,
            host_port: caller_host_port,
            data_dir: None,
        })
    }

    /// Open a blank tab via `PUT /json/new`.
    /// Returns `(target_id, ws_url)` for the tab's own WebSocket.
    pub async fn create_tab(&self) -> Result<(String, String)> {
        let url = format!("http://{}/json/new?about:blank", self.host_port);
        debug!(url = %url, "PUT /json/new");

        let resp: serde_json::Value = reqwest::Client::new()
            .put(&url)
            .send()
            .await
            .context("PUT /json/new failed")?
            .json()
            .await
            .context("Failed to parse /json/new response")?;

        let target_id = resp["id"]
            .as_str()
            .context("No id in /json/new response")?
            .to_string();

        let ws_url = format!("ws://{}/devtools/page/{target_id}", self.host_port);
        debug!(target_id = %target_id, "tab created");

        Ok((target_id, ws_url))
    }

    /// Close a tab via `GET /json/close/<id>`.
    pub async fn close_tab(&self, target_id: &str) -> Result<()> {
        let url = format!("http://{}/json/close/{target_id}", self.host_port);
        reqwest::get(&url)
            .await
            .with_context(|| format!("GET /json/close/{target_id} failed"))?;
        debug!(target_id, "tab closed");
        Ok(())
    }

    /// Kill the Chrome process (no-op for remote connections).
    pub fn kill(&mut self) {
        if let Some(ref mut child) = self.child {
            let _ = child.start_kill();
        }
    }
}

impl Drop for Chrome {
    fn drop(&mut self) {
        self.kill();
        if let Some(ref data_dir) = self.data_dir {
            let _ = std::fs::remove_dir_all(data_dir);
        }
    }
}

/// `DevTools listening on ws://...` → the URL.
fn parse_devtools_line(line: &str) -> Option<String> {
    line.split("DevTools listening on ")
        .nth(1)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Extract `host:port` from `ws://127.0.0.1:9222/devtools/browser/...`.
fn parse_host_port(ws_url: &str) -> Result<String> {
    let after_scheme = ws_url
        .split("://")
        .nth(1)
        .context("Invalid WebSocket URL: no scheme")?;
    let host_port = after_scheme
        .split('/')
        .next()
        .filter(|hp| !hp.is_empty())
        .context("Invalid WebSocket URL: no host:port")?;
    Ok(host_port.to_string())
}

fn find_chrome() -> Result<String> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else {
        vec![
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ]
    };

    for path in &candidates {
        if std::path::Path::new(path).exists() {
            return Ok(path.to_string());
        }
    }

    if !cfg!(target_os = "macos") {
        for name in &candidates {
            if std::process::Command::new("which")
                .arg(name)
                .output()
                .is_ok_and(|o| o.status.success())
            {
                return Ok(name.to_string());
            }
        }
    }

    bail!(
        "Chrome not found. Tried: {} (set browser.chrome_path or --chrome-url)",
        candidates.join(", ")
    )
}
