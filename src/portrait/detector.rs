//! Subject detection as a swappable capability.
//!
//! The [`SubjectDetector`] trait is the seam between "find the subject"
//! and "crop around it": implementations return zero-or-more bounding
//! regions over a decoded raster, and the crop logic never knows which
//! detection technique produced them.
//!
//! Production implementation is [`RustfaceDetector`] (SeetaFace frontal
//! face detection via the pure-Rust `rustface` crate, model file loaded at
//! construction). [`NullDetector`] reports no regions, which routes every
//! image through the "no crop possible" path.

use super::geometry::Region;
use image::DynamicImage;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("failed to load face model {path}: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("subject detection failed: {0}")]
    Detection(String),
}

/// Finds candidate subject regions in a decoded image.
///
/// Implementations report regions in their own confidence order; callers
/// that want a single subject take the first. Regions are already clamped
/// to the image bounds.
pub trait SubjectDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Region>, DetectorError>;
}

/// Detector that never finds a subject. Used when no face model is
/// configured: cropping degrades to a re-encode pass.
pub struct NullDetector;

impl SubjectDetector for NullDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Region>, DetectorError> {
        Ok(Vec::new())
    }
}

/// SeetaFace frontal-face detection backed by `rustface`.
///
/// `rustface::Detector::detect` needs `&mut self`; the mutex keeps the
/// public trait at `&self` so the detector can be shared by reference.
pub struct RustfaceDetector {
    inner: Mutex<Box<dyn rustface::Detector>>,
}

impl RustfaceDetector {
    /// Load a SeetaFace model file (e.g. `seeta_fd_frontal_v1.0.bin`).
    pub fn from_model(path: &Path) -> Result<Self, DetectorError> {
        let model_path = path.to_string_lossy();
        let mut detector =
            rustface::create_detector(&model_path).map_err(|e| DetectorError::ModelLoad {
                path: model_path.to_string(),
                reason: e.to_string(),
            })?;

        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        Ok(Self {
            inner: Mutex::new(detector),
        })
    }
}

impl SubjectDetector for RustfaceDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Region>, DetectorError> {
        let gray = image.to_luma8();
        let (width, height) = (gray.width(), gray.height());
        let mut data = rustface::ImageData::new(gray.as_raw(), width, height);

        let faces = self.inner.lock().unwrap().detect(&mut data);

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                let left = bbox.x().clamp(0, width as i32) as u32;
                let top = bbox.y().clamp(0, height as i32) as u32;
                let right = (bbox.x() + bbox.width() as i32).clamp(0, width as i32) as u32;
                let bottom = (bbox.y() + bbox.height() as i32).clamp(0, height as i32) as u32;
                Region {
                    top,
                    right,
                    bottom,
                    left,
                }
            })
            .collect())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Detector returning a fixed list of regions, for exercising the crop
    /// logic with known boxes.
    pub struct StubDetector {
        pub regions: Vec<Region>,
    }

    impl StubDetector {
        pub fn with_region(region: Region) -> Self {
            Self {
                regions: vec![region],
            }
        }

        pub fn empty() -> Self {
            Self {
                regions: Vec::new(),
            }
        }
    }

    impl SubjectDetector for StubDetector {
        fn detect(&self, _image: &DynamicImage) -> Result<Vec<Region>, DetectorError> {
            Ok(self.regions.clone())
        }
    }

    /// Detector that always fails, for exercising the runtime-error path.
    pub struct FailingDetector;

    impl SubjectDetector for FailingDetector {
        fn detect(&self, _image: &DynamicImage) -> Result<Vec<Region>, DetectorError> {
            Err(DetectorError::Detection("stub detector failure".to_string()))
        }
    }

    #[test]
    fn null_detector_reports_nothing() {
        let img = DynamicImage::new_rgb8(10, 10);
        let regions = NullDetector.detect(&img).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn stub_detector_reports_configured_region() {
        let region = Region {
            top: 1,
            right: 8,
            bottom: 9,
            left: 2,
        };
        let img = DynamicImage::new_rgb8(10, 10);
        let regions = StubDetector::with_region(region).detect(&img).unwrap();
        assert_eq!(regions, vec![region]);
    }

    #[test]
    fn missing_model_file_is_a_load_error() {
        let result = RustfaceDetector::from_model(Path::new("/nonexistent/model.bin"));
        assert!(matches!(result, Err(DetectorError::ModelLoad { .. })));
    }
}
