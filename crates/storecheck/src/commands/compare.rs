use std::path::Path;

use anyhow::{Context, Result};

use crate::compare::{self, Comparison, Engine};
use crate::config::{self, resolve};

/// `storecheck compare`: count differing pixels between two images.
/// Returns exit code: 0 = identical under the threshold, 1 = any difference.
pub async fn compare(
    left: &Path,
    right: &Path,
    diff: Option<&Path>,
    threshold: Option<f64>,
    engine: Option<Engine>,
    include_aa: bool,
) -> Result<i32> {
    let file_config = config::load()?;
    let options = resolve::compare_options(
        &file_config.diff,
        std::env::var(resolve::ENV_DIFF_THRESHOLD).ok().filter(|v| !v.trim().is_empty()),
        threshold,
        engine,
        include_aa,
    )?;

    let (left, right) = (left.to_path_buf(), right.to_path_buf());
    let diff = diff.map(Path::to_path_buf);
    let diff_out = diff.clone();
    let comparison: Comparison = tokio::task::spawn_blocking(move || {
        compare::compare_images_with(&left, &right, diff_out.as_deref(), &options)
    })
    .await
    .context("Compare task panicked")??;

    println!("{}", comparison.diff_pixels);
    if let Some(e) = &comparison.diff_write_error {
        eprintln!("warning: {e}");
    } else if let (Some(path), false) = (&diff, comparison.is_identical()) {
        eprintln!(
            "{} of {} pixels differ ({:.4}), diff written to {}",
            comparison.diff_pixels,
            comparison.total_pixels,
            comparison.score(),
            path.display()
        );
    }

    Ok(if comparison.is_identical() { 0 } else { 1 })
}
