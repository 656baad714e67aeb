use std::path::Path;

use image::ImageReader;
use tracing::trace;

use super::{CompareError, RasterImage};

/// Read and decode an image file into RGBA8. No caching: every call hits disk.
pub fn load(path: &Path) -> Result<RasterImage, CompareError> {
    let decode_err = |source: image::ImageError| CompareError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let img = ImageReader::open(path)
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_err)?
        .to_rgba8();

    trace!(path = %path.display(), width = img.width(), height = img.height(), "decoded");
    RasterImage::try_from(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        RgbaImage::from_pixel(7, 5, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let img = load(&path).unwrap();
        assert_eq!(img.dimensions(), (7, 5));
        assert_eq!(img.pixel(6, 4), [10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, CompareError::Decode { ref path, .. } if path.ends_with("nope.png")));
    }

    #[test]
    fn garbage_bytes_are_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load(&path), Err(CompareError::Decode { .. })));
    }

    #[test]
    fn format_is_sniffed_not_taken_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("real.png");
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))
            .save(&png)
            .unwrap();
        let renamed = dir.path().join("screenshot.bin");
        std::fs::rename(&png, &renamed).unwrap();
        assert_eq!(load(&renamed).unwrap().dimensions(), (2, 2));
    }
}
