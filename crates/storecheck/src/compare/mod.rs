pub mod diff;
pub mod load;
pub mod yiq;

use std::path::PathBuf;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::diff::{Comparison, compare_images_with};

/// Canonical sensitivity used by every call site (identical-image checks and
/// duplicate detection alike). Lower is more sensitive.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Largest YIQ delta two RGB colours can have (black vs white).
pub const MAX_YIQ_POSSIBLE_DELTA: f64 = 35215.0;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("dimension mismatch: {left_w}x{left_h} vs {right_w}x{right_h}")]
    DimensionMismatch {
        left_w: u32,
        left_h: u32,
        right_w: u32,
        right_h: u32,
    },

    #[error("pixel buffer is {len} bytes, expected {expected} for {width}x{height} RGBA")]
    InvalidBuffer {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },

    #[error("failed to write diff image {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded bitmap: row-major RGBA8, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CompareError> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(CompareError::InvalidBuffer {
                width,
                height,
                len: pixels.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Solid fill, mostly useful for fixtures.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, CompareError> {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 4)
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn total_pixels(&self) -> u64 {
        (self.width as u64) * (self.height as u64)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn into_rgba(self) -> RgbaImage {
        // Length was validated in `new`, so `from_raw` cannot fail here.
        RgbaImage::from_raw(self.width, self.height, self.pixels)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }
}

impl TryFrom<RgbaImage> for RasterImage {
    type Error = CompareError;

    fn try_from(img: RgbaImage) -> Result<Self, Self::Error> {
        let (w, h) = img.dimensions();
        Self::new(w, h, img.into_raw())
    }
}

/// Which pixel classifier to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    /// Built-in YIQ comparator.
    #[default]
    Yiq,
    /// The `dify` crate (same YIQ model, its own anti-aliasing pass).
    Dify,
}

#[derive(Clone, Debug)]
pub struct CompareOptions {
    /// Sensitivity in [0, 1]. `max_delta = 35215 * threshold^2`.
    pub threshold: f64,
    /// Count anti-aliased pixels as differences instead of skipping them.
    pub include_aa: bool,
    pub engine: Engine,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            include_aa: false,
            engine: Engine::Yiq,
        }
    }
}

impl CompareOptions {
    pub fn max_delta(&self) -> f64 {
        MAX_YIQ_POSSIBLE_DELTA * self.threshold * self.threshold
    }
}

/// Fail with `DimensionMismatch` unless both images share width and height.
pub fn ensure_same_dimensions(left: &RasterImage, right: &RasterImage) -> Result<(), CompareError> {
    if left.dimensions() != right.dimensions() {
        return Err(CompareError::DimensionMismatch {
            left_w: left.width(),
            left_h: left.height(),
            right_w: right.width(),
            right_h: right.height(),
        });
    }
    Ok(())
}
