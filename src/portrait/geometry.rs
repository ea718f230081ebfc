//! Pure geometry for portrait processing.
//!
//! All functions here are unit-testable without decoding a single pixel.

/// A rectangular subject region inside an image, in pixel coordinates.
///
/// Invariant: `left <= right`, `top <= bottom`, all edges within the image
/// the region was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Expand a detected subject box by 50% of its width/height on every side,
/// clamping to the image bounds.
///
/// The padding absorbs shoulders and hair around a detected face so the
/// crop reads as a head-and-shoulders portrait.
///
/// ```
/// # use cast_cards::portrait::{pad_region, Region};
/// let face = Region { top: 100, right: 200, bottom: 200, left: 100 };
/// let padded = pad_region(face, 400, 400);
/// assert_eq!(padded, Region { top: 50, right: 250, bottom: 250, left: 50 });
/// ```
pub fn pad_region(region: Region, image_width: u32, image_height: u32) -> Region {
    let pad_x = region.width() / 2;
    let pad_y = region.height() / 2;

    Region {
        left: region.left.saturating_sub(pad_x),
        right: (region.right + pad_x).min(image_width),
        top: region.top.saturating_sub(pad_y),
        bottom: (region.bottom + pad_y).min(image_height),
    }
}

/// Dimensions after bounding the longer edge to `max_edge`, preserving
/// aspect ratio. Returns `None` when the image is already within bounds
/// (never upscale).
pub fn shrink_dimensions(original: (u32, u32), max_edge: u32) -> Option<(u32, u32)> {
    let (width, height) = original;
    let longer = width.max(height);
    if longer <= max_edge {
        return None;
    }

    let ratio = max_edge as f64 / longer as f64;
    Some(if width >= height {
        (max_edge, ((height as f64 * ratio).round() as u32).max(1))
    } else {
        (((width as f64 * ratio).round() as u32).max(1), max_edge)
    })
}
