use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, config_path};
use crate::artifacts::ARTIFACTS_DIR;

/// Hand-crafted config template with commented-out keys.
/// Used by `storecheck init` instead of `toml::to_string_pretty()` so that
/// users can see the available knobs without uncommenting section headers.
const CONFIG_TEMPLATE: &str = r#"[site]
base_url = "{url}"
password = "secret_sauce"

# ─────────────────────────────────────────────────────────
# Browser (all fields optional)
# ─────────────────────────────────────────────────────────
[browser]
# parallel = 4                      # concurrent browser tabs
# chrome_url = "http://localhost:9222"  # remote Chrome (e.g. Docker)
# chrome_path = "/usr/bin/chromium"
# headful = false
# viewport_width = 1366
# viewport_height = 768
# action_timeout_ms = 5000          # wait for an element before acting

# ─────────────────────────────────────────────────────────
# Image comparison (all fields optional)
# ─────────────────────────────────────────────────────────
[diff]
# threshold = 0.1                   # per-pixel sensitivity, lower = stricter
# engine = "yiq"                    # "yiq" | "dify"
# include_aa = false                # count anti-aliased pixels as differences

# ─────────────────────────────────────────────────────────
# Scenario runs (all fields optional)
# ─────────────────────────────────────────────────────────
[run]
# scenario_timeout_secs = 60
# artifacts_dir = ".storecheck/artifacts"
"#;

pub fn config_file_exists() -> bool {
    config_path().exists()
}

pub fn write_gitignore(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_DIR).join(".gitignore");
    if !force && path.exists() {
        return Ok(());
    }
    std::fs::write(&path, format!("{ARTIFACTS_DIR}/\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the hand-crafted config template (with commented-out sections).
pub fn write_template(url: &str) -> Result<()> {
    let dir = Path::new(CONFIG_DIR);
    std::fs::create_dir_all(dir).context("Failed to create .storecheck directory")?;
    let path = config_path();
    std::fs::write(&path, render(url))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn render(url: &str) -> String {
    CONFIG_TEMPLATE.replace("{url}", url)
}
