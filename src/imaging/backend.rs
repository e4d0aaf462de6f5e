//! Image codec trait and shared types.
//!
//! The [`ImageBackend`] trait is the full capability set the variant generator
//! needs: decode, crop, resize, and lossy encode. The two center crops are
//! provided methods built on [`ImageBackend::crop`] and the pure geometry in
//! [`calculations`](super::calculations), so every backend crops identically.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::calculations;
use super::params::{CropRect, Quality};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn ratio(self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Trait for image codec backends.
///
/// `decode` must hand back opaque truecolor pixels: alpha and palette images
/// are flattened so the result is always encodable as lossy WebP.
pub trait ImageBackend {
    type Image;

    /// Decode and normalize a source file.
    fn decode(&self, path: &Path) -> Result<Self::Image, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Copy out a rectangle. `rect` always lies inside the frame.
    fn crop(&self, image: &Self::Image, rect: CropRect) -> Self::Image;

    /// Resize to exactly `width` × `height` with a Lanczos-class filter.
    fn resize(&self, image: &Self::Image, width: u32, height: u32) -> Self::Image;

    /// Encode as lossy WebP.
    fn encode_lossy(&self, image: &Self::Image, quality: Quality) -> Result<Vec<u8>, BackendError>;

    /// Crop to the largest centered square.
    fn center_crop_square(&self, image: &Self::Image) -> Self::Image {
        let dims = self.dimensions(image);
        self.crop(image, calculations::center_square(dims.width, dims.height))
    }

    /// Crop to the largest centered 16:9 region.
    fn center_crop_16x9(&self, image: &Self::Image) -> Self::Image {
        let dims = self.dimensions(image);
        self.crop(image, calculations::center_16x9(dims.width, dims.height))
    }
}
