//! Portrait operations over raw image bytes.
//!
//! Both operations decode, transform, and re-encode as JPEG:
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Subject crop | [`SubjectDetector`] + [`pad_region`] + `DynamicImage::crop_imm` |
//! | Downsize | `DynamicImage::resize` with `Lanczos3` |
//! | Encode | `image::codecs::jpeg::JpegEncoder` |
//!
//! Failures are returned, not swallowed: the builder decides whether a
//! failed crop/resize keeps the pre-stage bytes or aborts the run.

use super::detector::{DetectorError, SubjectDetector};
use super::geometry::{pad_region, shrink_dimensions};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

/// Longer-edge cap applied by the resizer.
pub const MAX_PORTRAIT_EDGE: u32 = 512;

const JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum PortraitError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode JPEG: {0}")]
    Encode(image::ImageError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, PortraitError> {
    image::load_from_memory(bytes).map_err(PortraitError::Decode)
}

/// Encode as JPEG, flattening alpha (and any exotic sample format) to an
/// opaque 3-channel image first.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, PortraitError> {
    let converted;
    let source = match image.color() {
        ColorType::L8 | ColorType::Rgb8 => image,
        _ => {
            converted = DynamicImage::ImageRgb8(image.to_rgb8());
            &converted
        }
    };

    let mut buffer = Cursor::new(Vec::new());
    source
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
        .map_err(PortraitError::Encode)?;
    Ok(buffer.into_inner())
}

/// Crop a padded box around the first detected subject region.
///
/// Zero detected regions is not an error: the original raster is
/// re-encoded unchanged — the explicit "no crop possible" terminal case.
/// Decode failures and detector runtime errors are returned so the caller
/// can apply its failure policy.
pub fn crop_to_subject(
    detector: &dyn SubjectDetector,
    bytes: &[u8],
) -> Result<Vec<u8>, PortraitError> {
    let image = decode(bytes)?;
    let regions = detector.detect(&image)?;

    let Some(region) = regions.first() else {
        debug!("no subject region detected, re-encoding uncropped");
        return encode_jpeg(&image);
    };

    let padded = pad_region(*region, image.width(), image.height());
    debug!(
        left = padded.left,
        top = padded.top,
        right = padded.right,
        bottom = padded.bottom,
        "cropping to padded subject box"
    );
    let cropped = image.crop_imm(padded.left, padded.top, padded.width(), padded.height());
    encode_jpeg(&cropped)
}

/// Bound the longer edge to `max_edge` pixels, preserving aspect ratio.
///
/// Never upscales; the output is always a fresh JPEG encode, even when no
/// shrink was needed.
pub fn shrink_to_bounds(bytes: &[u8], max_edge: u32) -> Result<Vec<u8>, PortraitError> {
    let image = decode(bytes)?;
    let image = match shrink_dimensions((image.width(), image.height()), max_edge) {
        Some((width, height)) => image.resize(width, height, FilterType::Lanczos3),
        None => image,
    };
    encode_jpeg(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portrait::detector::tests::{FailingDetector, StubDetector};
    use crate::portrait::{NullDetector, Region};
    use image::{ImageEncoder, RgbImage, RgbaImage};

    /// Encode a synthetic gradient as JPEG bytes.
    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buffer = Cursor::new(Vec::new());
        JpegEncoder::new(&mut buffer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer.into_inner()
    }

    /// Encode a synthetic RGBA image as PNG bytes (keeps the alpha channel).
    fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 128]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn dimensions_of(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn crop_expands_box_by_half_per_side() {
        let bytes = jpeg_bytes(400, 400);
        let detector = StubDetector::with_region(Region {
            top: 100,
            right: 200,
            bottom: 200,
            left: 100,
        });

        let cropped = crop_to_subject(&detector, &bytes).unwrap();
        // Expanded box is (50..250) on both axes.
        assert_eq!(dimensions_of(&cropped), (200, 200));
    }

    #[test]
    fn crop_clamps_box_to_image_bounds() {
        let bytes = jpeg_bytes(300, 300);
        let detector = StubDetector::with_region(Region {
            top: 0,
            right: 300,
            bottom: 200,
            left: 100,
        });

        let cropped = crop_to_subject(&detector, &bytes).unwrap();
        // Horizontal: 100-100=0 .. 300 (clamped). Vertical: 0 .. 200+100=300.
        assert_eq!(dimensions_of(&cropped), (300, 300));
    }

    #[test]
    fn crop_without_detection_keeps_dimensions() {
        let bytes = jpeg_bytes(320, 240);
        let out = crop_to_subject(&StubDetector::empty(), &bytes).unwrap();
        assert_eq!(dimensions_of(&out), (320, 240));
        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn crop_uses_first_region_only() {
        let bytes = jpeg_bytes(400, 400);
        let detector = StubDetector {
            regions: vec![
                Region {
                    top: 100,
                    right: 200,
                    bottom: 200,
                    left: 100,
                },
                Region {
                    top: 0,
                    right: 400,
                    bottom: 400,
                    left: 0,
                },
            ],
        };

        let cropped = crop_to_subject(&detector, &bytes).unwrap();
        assert_eq!(dimensions_of(&cropped), (200, 200));
    }

    #[test]
    fn crop_flattens_alpha_to_jpeg() {
        let bytes = rgba_png_bytes(100, 100);
        let detector = StubDetector::with_region(Region {
            top: 25,
            right: 75,
            bottom: 75,
            left: 25,
        });

        let cropped = crop_to_subject(&detector, &bytes).unwrap();
        let img = image::load_from_memory(&cropped).unwrap();
        assert!(!img.color().has_alpha());
        assert_eq!(image::guess_format(&cropped).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn crop_undecodable_bytes_is_a_decode_error() {
        let result = crop_to_subject(&NullDetector, b"not an image");
        assert!(matches!(result, Err(PortraitError::Decode(_))));
    }

    #[test]
    fn crop_detector_failure_propagates() {
        let bytes = jpeg_bytes(50, 50);
        let result = crop_to_subject(&FailingDetector, &bytes);
        assert!(matches!(result, Err(PortraitError::Detector(_))));
    }

    #[test]
    fn shrink_bounds_longer_edge() {
        let bytes = jpeg_bytes(1024, 768);
        let out = shrink_to_bounds(&bytes, 512).unwrap();
        assert_eq!(dimensions_of(&out), (512, 384));
    }

    #[test]
    fn shrink_never_upscales() {
        let bytes = jpeg_bytes(200, 100);
        let out = shrink_to_bounds(&bytes, 512).unwrap();
        assert_eq!(dimensions_of(&out), (200, 100));
    }

    #[test]
    fn shrink_undecodable_bytes_is_a_decode_error() {
        let result = shrink_to_bounds(b"garbage", 512);
        assert!(matches!(result, Err(PortraitError::Decode(_))));
    }

    #[test]
    fn encode_jpeg_accepts_grayscale() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::new(10, 10));
        let out = encode_jpeg(&gray).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::Jpeg);
    }
}
