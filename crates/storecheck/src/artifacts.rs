use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const BASE_DIR: &str = ".storecheck";
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Default root for per-scenario screenshots.
pub fn default_root() -> PathBuf {
    Path::new(BASE_DIR).join(ARTIFACTS_DIR)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// `<root>/<scenario id>`; the id's `/` separators become directories.
pub fn scenario_dir(root: &Path, scenario_id: &str) -> PathBuf {
    scenario_id
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |dir, part| dir.join(part))
}

/// Remove whatever a previous run left for this scenario.
pub fn clear_scenario_dir(dir: &Path) {
    if dir.exists() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

/// Screenshot of the `index`th inventory thumbnail.
pub fn item_image_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("item_{index}.png"))
}

/// Page screenshot taken when a scenario fails.
pub fn failure_screenshot_path(dir: &Path) -> PathBuf {
    dir.join("failure.png")
}
