//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Crop sizes and offsets use integer floor division, so an odd leftover pixel
//! goes to the right/bottom edge.

use super::params::CropRect;

/// Target aspect ratio for hero crops.
pub const HERO_RATIO: f64 = 16.0 / 9.0;

/// Sources within this distance of [`HERO_RATIO`] are not cropped.
pub const RATIO_TOLERANCE: f64 = 0.01;

/// Largest centered square.
///
/// `side = min(width, height)`, offset `((w - side) / 2, (h - side) / 2)`.
///
/// ```
/// # use article_images::imaging::calculations::center_square;
/// let rect = center_square(1792, 1024);
/// assert_eq!((rect.x, rect.y, rect.width, rect.height), (384, 0, 1024, 1024));
/// ```
pub fn center_square(width: u32, height: u32) -> CropRect {
    let side = width.min(height);
    CropRect {
        x: (width - side) / 2,
        y: (height - side) / 2,
        width: side,
        height: side,
    }
}

/// Largest centered 16:9 region.
///
/// - `|w/h - 16/9| < 0.01` → full frame, no crop
/// - wider than 16:9 → width becomes `floor(h * 16/9)`, centered horizontally
/// - taller than 16:9 → height becomes `floor(w * 9/16)`, centered vertically
pub fn center_16x9(width: u32, height: u32) -> CropRect {
    if width == 0 || height == 0 {
        return CropRect::full(width, height);
    }

    let ratio = width as f64 / height as f64;

    if (ratio - HERO_RATIO).abs() < RATIO_TOLERANCE {
        return CropRect::full(width, height);
    }

    if ratio > HERO_RATIO {
        // Too wide: trim the sides
        let new_width = ((height as u64 * 16 / 9) as u32).clamp(1, width);
        CropRect {
            x: (width - new_width) / 2,
            y: 0,
            width: new_width,
            height,
        }
    } else {
        // Too tall: trim top and bottom
        let new_height = ((width as u64 * 9 / 16) as u32).clamp(1, height);
        CropRect {
            x: 0,
            y: (height - new_height) / 2,
            width,
            height: new_height,
        }
    }
}
