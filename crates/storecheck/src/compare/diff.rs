use std::collections::HashSet;
use std::path::Path;

use image::RgbaImage;
use tracing::{debug, warn};

use super::{CompareError, CompareOptions, Engine, RasterImage, ensure_same_dimensions, load, yiq};

/// Outcome of comparing two image files.
#[derive(Debug)]
pub struct Comparison {
    pub diff_pixels: u64,
    pub total_pixels: u64,
    /// Set when a diff path was requested but writing it failed.
    /// The count above is still valid.
    pub diff_write_error: Option<CompareError>,
}

impl Comparison {
    pub fn is_identical(&self) -> bool {
        self.diff_pixels == 0
    }

    /// Fraction of differing pixels: 0.0 = identical, 1.0 = every pixel differs.
    pub fn score(&self) -> f64 {
        if self.total_pixels > 0 {
            self.diff_pixels as f64 / self.total_pixels as f64
        } else {
            0.0
        }
    }
}

/// Compare two image files with the default options and return the number of
/// differing pixels.
///
/// A failure to write `diff_path` is logged and does not affect the count.
#[allow(dead_code)]
pub fn compare_images(
    path_a: &Path,
    path_b: &Path,
    diff_path: Option<&Path>,
) -> Result<u64, CompareError> {
    compare_images_with(path_a, path_b, diff_path, &CompareOptions::default())
        .map(|c| c.diff_pixels)
}

/// Load → check dimensions → compare → optionally persist the diff image.
///
/// Runs synchronously; call via `spawn_blocking` from async code.
pub fn compare_images_with(
    path_a: &Path,
    path_b: &Path,
    diff_path: Option<&Path>,
    options: &CompareOptions,
) -> Result<Comparison, CompareError> {
    let left = load::load(path_a)?;
    let right = load::load(path_b)?;

    let (diff_pixels, diff_image) = compare_rasters(&left, &right, options, diff_path.is_some())?;
    let total_pixels = left.total_pixels();

    debug!(
        a = %path_a.display(),
        b = %path_b.display(),
        diff_pixels,
        total_pixels,
        "compared"
    );

    let diff_write_error = match (diff_path, diff_image) {
        (Some(path), Some(img)) => match write_diff(path, &img) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "diff image not written");
                Some(e)
            }
        },
        _ => None,
    };

    Ok(Comparison {
        diff_pixels,
        total_pixels,
        diff_write_error,
    })
}

/// Run the configured engine over two decoded images.
/// The diff visualization is only built when `want_diff` is set.
pub fn compare_rasters(
    left: &RasterImage,
    right: &RasterImage,
    options: &CompareOptions,
    want_diff: bool,
) -> Result<(u64, Option<RgbaImage>), CompareError> {
    ensure_same_dimensions(left, right)?;

    match options.engine {
        Engine::Yiq => {
            if !want_diff {
                return Ok((yiq::diff_pixels(left, right, options, None)?, None));
            }
            let (w, h) = left.dimensions();
            let mut out = vec![0u8; (w as usize) * (h as usize) * 4];
            let count = yiq::diff_pixels(left, right, options, Some(&mut out))?;
            let img = RasterImage::new(w, h, out)?.into_rgba();
            Ok((count, Some(img)))
        }
        Engine::Dify => Ok(dify_diff(left, right, options, want_diff)),
    }
}

/// `dify::diff::get_results` takes the pre-computed `max_delta`
/// (35215 * threshold^2) and owns both images.
fn dify_diff(
    left: &RasterImage,
    right: &RasterImage,
    options: &CompareOptions,
    want_diff: bool,
) -> (u64, Option<RgbaImage>) {
    let output_base = Some(dify::cli::OutputImageBase::LeftImage);
    let block_out: Option<HashSet<(u32, u32)>> = None;

    match dify::diff::get_results(
        left.clone().into_rgba(),
        right.clone().into_rgba(),
        options.max_delta() as f32,
        !options.include_aa,
        Some(0.1),
        &output_base,
        &block_out,
    ) {
        Some((diff_count, diff_image)) => {
            let diff_pixels = diff_count.max(0) as u64;
            (diff_pixels, want_diff.then_some(diff_image))
        }
        // None means no pixel crossed the threshold.
        None => {
            let blank = want_diff.then(|| left.clone().into_rgba());
            (0, blank)
        }
    }
}

fn write_diff(path: &Path, img: &RgbaImage) -> Result<(), CompareError> {
    let storage_err = |source: image::ImageError| CompareError::StorageWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| storage_err(image::ImageError::IoError(e)))?;
    }
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(storage_err)
}
