use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use super::items::{INVENTORY_ITEM, read_items};
use super::data_test;
use crate::artifacts;
use crate::compare::{CompareOptions, compare_images_with};
use crate::driver::BrowserDriver;
use crate::model::InventoryItem;

pub(crate) fn image_link(id: &str) -> String {
    data_test(&format!("item-{id}-img-link"))
}

/// Screenshots every inventory thumbnail and compares them pixel by pixel.
pub struct ImageFlow<'a> {
    driver: &'a mut dyn BrowserDriver,
    artifacts_dir: &'a Path,
    options: &'a CompareOptions,
}

impl<'a> ImageFlow<'a> {
    pub fn new(
        driver: &'a mut dyn BrowserDriver,
        artifacts_dir: &'a Path,
        options: &'a CompareOptions,
    ) -> Self {
        Self {
            driver,
            artifacts_dir,
            options,
        }
    }

    pub async fn items(&mut self) -> Result<Vec<InventoryItem>> {
        read_items(self.driver, INVENTORY_ITEM, true).await
    }

    pub async fn screenshot_item(&mut self, item: &InventoryItem, path: &Path) -> Result<()> {
        self.driver
            .screenshot(&image_link(&item.id), path)
            .await
            .with_context(|| format!("Failed to capture the image of '{}'", item.name))
    }

    /// Screenshot each thumbnail to `<artifacts>/item_<i>.png`, in listing order.
    pub async fn capture_all(&mut self) -> Result<Vec<PathBuf>> {
        let items = self.items().await?;
        if items.is_empty() {
            bail!("No inventory items to capture");
        }
        let mut paths = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let path = artifacts::item_image_path(self.artifacts_dir, i);
            self.screenshot_item(item, &path).await?;
            paths.push(path);
        }
        Ok(paths)
    }

    /// Whether every thumbnail matches the first one. Stops at the first
    /// difference.
    pub async fn all_images_identical(&mut self) -> Result<bool> {
        let paths = self.capture_all().await?;
        let (first, rest) = paths
            .split_first()
            .context("No inventory images captured")?;
        for other in rest {
            let diff_pixels = compare_files(first, other, self.options).await?;
            if diff_pixels > 0 {
                debug!(first = %first.display(), other = %other.display(), diff_pixels, "thumbnails differ");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Index pairs `(i, j)`, `i < j`, whose thumbnails are identical.
    pub async fn duplicate_pairs(&mut self) -> Result<Vec<(usize, usize)>> {
        let paths = self.capture_all().await?;
        let mut pairs = Vec::new();
        for i in 0..paths.len() {
            for j in i + 1..paths.len() {
                if compare_files(&paths[i], &paths[j], self.options).await? == 0 {
                    pairs.push((i, j));
                }
            }
        }
        Ok(pairs)
    }
}

/// Run one file comparison off the async runtime.
async fn compare_files(a: &Path, b: &Path, options: &CompareOptions) -> Result<u64> {
    let (a, b, options) = (a.to_path_buf(), b.to_path_buf(), options.clone());
    let comparison = tokio::task::spawn_blocking(move || compare_images_with(&a, &b, None, &options))
        .await
        .context("Comparison task panicked")??;
    Ok(comparison.diff_pixels)
}
