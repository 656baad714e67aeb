use serde::{Deserialize, Serialize};

/// Browser settings.
///
/// Every field is `Option`; `None` means "use default".
/// Serves both TOML deserialization (`[browser]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Number of scenarios run concurrently, one browser tab each
    #[arg(long, short = 'p')]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,

    /// Connect to a remote Chrome instead of launching a local one.
    /// Value is `http://host:port` (e.g. `http://localhost:9222`).
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_url: Option<String>,

    /// Chrome executable for local launches
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,

    /// Show the browser window
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headful: Option<bool>,

    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_width: Option<u32>,

    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_height: Option<u32>,

    /// How long an action waits for its element to show up
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_timeout_ms: Option<u64>,
}

impl BrowserConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &BrowserConfig) {
        if other.parallel.is_some() {
            self.parallel = other.parallel;
        }
        if other.chrome_url.is_some() {
            self.chrome_url = other.chrome_url.clone();
        }
        if other.chrome_path.is_some() {
            self.chrome_path = other.chrome_path.clone();
        }
        if other.headful.is_some() {
            self.headful = other.headful;
        }
        if other.viewport_width.is_some() {
            self.viewport_width = other.viewport_width;
        }
        if other.viewport_height.is_some() {
            self.viewport_height = other.viewport_height;
        }
        if other.action_timeout_ms.is_some() {
            self.action_timeout_ms = other.action_timeout_ms;
        }
    }

    pub fn parallel(&self) -> usize {
        self.parallel.unwrap_or(4)
    }

    pub fn viewport(&self) -> (u32, u32) {
        (
            self.viewport_width.unwrap_or(1366),
            self.viewport_height.unwrap_or(768),
        )
    }

    pub fn action_timeout_ms(&self) -> u64 {
        self.action_timeout_ms.unwrap_or(5000)
    }
}
