//! Perceptual pixel comparison in YIQ colour space.
//!
//! Per pixel pair:
//!
//! - semi-transparent colours are blended onto white first
//!   (`c' = 255 + (c - 255) * a / 255`);
//! - `delta = 0.5053 dY^2 + 0.299 dI^2 + 0.1957 dQ^2`;
//! - the pair differs when `|delta| > 35215 * threshold^2`.
//!
//! Unless anti-aliasing is included, a differing pixel that looks like an
//! anti-aliased edge in either image is painted yellow and not counted.
//! Swapping the inputs only flips the sign of each channel delta, so the
//! count is symmetric.

use super::{CompareError, CompareOptions, RasterImage, ensure_same_dimensions};

const DIFF_COLOR: [u8; 3] = [255, 0, 0];
const AA_COLOR: [u8; 3] = [255, 255, 0];
/// Opacity of the faded first image behind the diff markers.
const BACKGROUND_ALPHA: f64 = 0.1;

/// Count pixels whose perceptual delta exceeds the configured threshold.
///
/// When `output` is given it must be `width * height * 4` bytes; it receives
/// the diff visualization.
pub fn diff_pixels(
    left: &RasterImage,
    right: &RasterImage,
    options: &CompareOptions,
    mut output: Option<&mut [u8]>,
) -> Result<u64, CompareError> {
    ensure_same_dimensions(left, right)?;

    let (width, height) = left.dimensions();
    if let Some(out) = output.as_deref() {
        let expected = (width as usize) * (height as usize) * 4;
        if out.len() != expected {
            return Err(CompareError::InvalidBuffer {
                width,
                height,
                len: out.len(),
                expected,
            });
        }
    }

    let img1 = left.pixels();
    let img2 = right.pixels();

    if img1 == img2 {
        if let Some(out) = output.as_deref_mut() {
            for pos in (0..img1.len()).step_by(4) {
                draw_gray_pixel(img1, pos, out);
            }
        }
        return Ok(0);
    }

    let max_delta = options.max_delta();
    let mut diff = 0u64;

    for y in 0..height {
        for x in 0..width {
            let pos = ((y as usize) * (width as usize) + (x as usize)) * 4;
            let delta = color_delta(img1, img2, pos, pos, false);

            if delta.abs() > max_delta {
                let aa = !options.include_aa
                    && (antialiased(img1, x, y, width, height, img2)
                        || antialiased(img2, x, y, width, height, img1));
                if aa {
                    if let Some(out) = output.as_deref_mut() {
                        draw_pixel(out, pos, AA_COLOR);
                    }
                } else {
                    if let Some(out) = output.as_deref_mut() {
                        draw_pixel(out, pos, DIFF_COLOR);
                    }
                    diff += 1;
                }
            } else if let Some(out) = output.as_deref_mut() {
                draw_gray_pixel(img1, pos, out);
            }
        }
    }

    Ok(diff)
}

/// Signed YIQ delta between pixel `k` of `img1` and pixel `m` of `img2`.
/// Negative when the first pixel is brighter. With `y_only`, returns the
/// plain luma difference.
fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, y_only: bool) -> f64 {
    let (r1, g1, b1, a1) = (img1[k], img1[k + 1], img1[k + 2], img1[k + 3]);
    let (r2, g2, b2, a2) = (img2[m], img2[m + 1], img2[m + 2], img2[m + 3]);

    if a1 == a2 && r1 == r2 && g1 == g2 && b1 == b2 {
        return 0.0;
    }

    let (r1, g1, b1) = blend_rgb(r1, g1, b1, a1);
    let (r2, g2, b2) = blend_rgb(r2, g2, b2, a2);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 { -delta } else { delta }
}

fn blend_rgb(r: u8, g: u8, b: u8, a: u8) -> (f64, f64, f64) {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    if a < 255 {
        let a = f64::from(a) / 255.0;
        (blend(r, a), blend(g, a), blend(b, a))
    } else {
        (r, g, b)
    }
}

/// Blend a channel value onto white.
fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

/// Neighbourhood bounds, clamped to the image.
fn window(x: u32, y: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(width - 1),
        (y + 1).min(height - 1),
    )
}

/// Whether pixel (x1, y1) of `img` looks like an anti-aliased edge, using
/// `img2` to confirm the neighbouring flat regions.
fn antialiased(img: &[u8], x1: u32, y1: u32, width: u32, height: u32, img2: &[u8]) -> bool {
    let (x0, y0, x2, y2) = window(x1, y1, width, height);
    let pos = ((y1 as usize) * (width as usize) + (x1 as usize)) * 4;

    let mut zeroes: u32 = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);
    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = (0, 0);
    let mut max_at = (0, 0);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }

            let other = ((y as usize) * (width as usize) + (x as usize)) * 4;
            let delta = color_delta(img, img, pos, other, true);

            if delta == 0.0 {
                zeroes += 1;
                // More than two identical siblings: a flat area, not an edge.
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                // remember the neighbour with the most negative delta
                min = delta;
                min_at = (x, y);
            } else if delta > max {
                max = delta;
                max_at = (x, y);
            }
        }
    }

    // An edge has both darker and brighter neighbours.
    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_at.0, min_at.1, width, height)
        && has_many_siblings(img2, min_at.0, min_at.1, width, height))
        || (has_many_siblings(img, max_at.0, max_at.1, width, height)
            && has_many_siblings(img2, max_at.0, max_at.1, width, height))
}

/// Whether pixel (x1, y1) has three or more identical neighbours.
fn has_many_siblings(img: &[u8], x1: u32, y1: u32, width: u32, height: u32) -> bool {
    let (x0, y0, x2, y2) = window(x1, y1, width, height);
    let pos = ((y1 as usize) * (width as usize) + (x1 as usize)) * 4;

    let mut zeroes: u32 = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }
            let other = ((y as usize) * (width as usize) + (x as usize)) * 4;
            if img[pos..pos + 4] == img[other..other + 4] {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }
    false
}

fn draw_pixel(out: &mut [u8], pos: usize, [r, g, b]: [u8; 3]) {
    out[pos] = r;
    out[pos + 1] = g;
    out[pos + 2] = b;
    out[pos + 3] = 255;
}

fn draw_gray_pixel(img: &[u8], pos: usize, out: &mut [u8]) {
    let y = rgb2y(
        f64::from(img[pos]),
        f64::from(img[pos + 1]),
        f64::from(img[pos + 2]),
    );
    let val = blend(y, BACKGROUND_ALPHA * f64::from(img[pos + 3]) / 255.0);
    let v = val.round().clamp(0.0, 255.0) as u8;
    draw_pixel(out, pos, [v, v, v]);
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn opts(threshold: f64) -> CompareOptions {
        CompareOptions {
            threshold,
            ..CompareOptions::default()
        }
    }

    fn count(a: &RasterImage, b: &RasterImage, threshold: f64) -> u64 {
        diff_pixels(a, b, &opts(threshold), None).unwrap()
    }

    /// Deterministic pseudo-random image so the tests don't need `rand`.
    fn noise(w: u32, h: u32, seed: u32) -> RasterImage {
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
        let pixels = (0..w * h * 4)
            .map(|i| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                if i % 4 == 3 { 255 } else { (state >> 24) as u8 }
            })
            .collect();
        RasterImage::new(w, h, pixels).unwrap()
    }

    /// Vertical black/white edge with a grey column in between.
    fn soft_edge(w: u32, h: u32, grey: u8) -> RasterImage {
        let mut img = RasterImage::filled(w, h, WHITE).unwrap();
        for y in 0..h {
            for x in 0..w / 2 {
                img.set_pixel(x, y, BLACK);
            }
            img.set_pixel(w / 2, y, [grey, grey, grey, 255]);
        }
        img
    }

    #[test]
    fn identical_images_have_no_diff() {
        let a = noise(40, 30, 7);
        assert_eq!(count(&a, &a.clone(), 0.1), 0);
        assert_eq!(count(&a, &a.clone(), 0.0), 0);
    }

    #[test]
    fn single_opaque_pixel_is_counted() {
        let a = RasterImage::filled(100, 150, WHITE).unwrap();
        let mut b = a.clone();
        b.set_pixel(50, 75, BLACK);
        assert_eq!(count(&a, &b, 0.1), 1);
    }

    #[test]
    fn corner_pixel_is_counted() {
        let a = RasterImage::filled(10, 10, WHITE).unwrap();
        let mut b = a.clone();
        b.set_pixel(0, 0, BLACK);
        assert_eq!(count(&a, &b, 0.1), 1);
    }

    #[test]
    fn tiny_colour_nudge_is_below_threshold() {
        let a = RasterImage::filled(20, 20, [128, 128, 128, 255]).unwrap();
        let mut b = a.clone();
        b.set_pixel(3, 3, [129, 128, 128, 255]);
        assert_eq!(count(&a, &b, 0.1), 0);
        // threshold 0 flags any change at all
        assert_eq!(count(&a, &b, 0.0), 1);
    }

    #[test]
    fn black_vs_white_delta_is_pure_luma() {
        let img1 = [255, 255, 255, 255];
        let img2 = [0, 0, 0, 255];
        let d = color_delta(&img1, &img2, 0, 0, false);
        assert!(d < 0.0, "brighter first pixel gives a negative delta");
        // I and Q cancel for greys, leaving 0.5053 * 255^2.
        assert!((d.abs() - 0.5053 * 255.0 * 255.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn transparent_pixels_blend_to_white() {
        let img1 = [0, 0, 0, 0];
        let img2 = [255, 255, 255, 255];
        assert_eq!(color_delta(&img1, &img2, 0, 0, false), 0.0);
    }

    #[test]
    fn comparison_is_symmetric() {
        for seed in 1..6 {
            let a = noise(32, 24, seed);
            let b = noise(32, 24, seed + 100);
            for t in [0.0, 0.05, 0.1, 0.3, 0.7] {
                assert_eq!(count(&a, &b, t), count(&b, &a, t), "seed {seed} t {t}");
            }
        }
    }

    #[test]
    fn delta_is_bitwise_antisymmetric() {
        let a = noise(8, 8, 3);
        let b = noise(8, 8, 4);
        for pos in (0..a.pixels().len()).step_by(4) {
            let ab = color_delta(a.pixels(), b.pixels(), pos, pos, false);
            let ba = color_delta(b.pixels(), a.pixels(), pos, pos, false);
            assert_eq!(ab.abs().to_bits(), ba.abs().to_bits());
        }
    }

    #[test]
    fn count_is_monotonic_in_threshold() {
        let a = noise(48, 48, 11);
        let b = noise(48, 48, 12);
        let mut previous = u64::MAX;
        for step in 0..=20 {
            let t = f64::from(step) / 20.0;
            let c = count(&a, &b, t);
            assert!(c <= previous, "threshold {t}: {c} > {previous}");
            previous = c;
        }
    }

    #[test]
    fn dimension_mismatch_fails_before_scan() {
        let a = RasterImage::filled(100, 150, WHITE).unwrap();
        let b = RasterImage::filled(200, 150, WHITE).unwrap();
        let err = diff_pixels(&a, &b, &opts(0.1), None).unwrap_err();
        assert!(matches!(err, CompareError::DimensionMismatch { .. }));
    }

    #[test]
    fn antialiased_edge_is_skipped_unless_included() {
        // Reference has a hard edge; the candidate softens it with a grey
        // column, as a renderer with different AA would.
        let hard = soft_edge(9, 9, 0);
        let soft = soft_edge(9, 9, 128);

        let skipped = count(&hard, &soft, 0.1);
        let included = diff_pixels(
            &hard,
            &soft,
            &CompareOptions {
                include_aa: true,
                ..opts(0.1)
            },
            None,
        )
        .unwrap();

        assert_eq!(included, 9, "whole grey column differs");
        assert!(skipped < included, "AA detection should drop edge pixels");
    }

    #[test]
    fn diff_output_marks_differences_red() {
        let a = RasterImage::filled(4, 4, WHITE).unwrap();
        let mut b = a.clone();
        b.set_pixel(2, 1, BLACK);
        let mut out = vec![0u8; 4 * 4 * 4];
        let n = diff_pixels(&a, &b, &opts(0.1), Some(&mut out)).unwrap();
        assert_eq!(n, 1);
        let pos = (4 + 2) * 4;
        assert_eq!(&out[pos..pos + 4], &[255, 0, 0, 255]);
        // untouched pixels are the faded first image: white stays white
        assert_eq!(&out[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn diff_output_does_not_change_count() {
        let a = noise(16, 16, 21);
        let b = noise(16, 16, 22);
        let mut out = vec![0u8; 16 * 16 * 4];
        let with = diff_pixels(&a, &b, &opts(0.1), Some(&mut out)).unwrap();
        assert_eq!(with, count(&a, &b, 0.1));
    }

    #[test]
    fn diff_output_of_wrong_size_is_rejected() {
        let a = RasterImage::filled(4, 4, WHITE).unwrap();
        let mut out = vec![0u8; 3];
        assert!(matches!(
            diff_pixels(&a, &a.clone(), &opts(0.1), Some(&mut out)),
            Err(CompareError::InvalidBuffer { .. })
        ));
    }
}
