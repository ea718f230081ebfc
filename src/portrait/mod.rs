//! Portrait processing — subject detection, crop geometry, pixel ops.
//!
//! The module is split into:
//! - **Geometry**: pure functions for box expansion and downsize math
//! - **Detector**: [`SubjectDetector`] trait + rustface/null implementations
//! - **Operations**: byte-level crop and resize combining the two

pub mod detector;
mod geometry;
pub mod operations;

pub use detector::{DetectorError, NullDetector, RustfaceDetector, SubjectDetector};
pub use geometry::{Region, pad_region, shrink_dimensions};
pub use operations::{MAX_PORTRAIT_EDGE, PortraitError, crop_to_subject, encode_jpeg, shrink_to_bounds};
