//! Pure Rust decode/resize backend with libwebp for lossy output.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image::ImageReader` with format sniffing |
//! | Normalize | `DynamicImage::to_rgb8` (drops alpha, expands palette) |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP | `webp::Encoder::from_rgb` (lossy, libwebp) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{CropRect, Quality};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::path::Path;

/// Backend built on the `image` crate, encoding through `webp`.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let decode_error = |reason: String| BackendError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(e.to_string()))?;

        if img.width() == 0 || img.height() == 0 {
            return Err(decode_error("image has no pixels".to_string()));
        }

        // Lossy WebP has no use for alpha; flatten everything to opaque RGB8
        Ok(match img {
            DynamicImage::ImageRgb8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        })
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions {
            width: image.width(),
            height: image.height(),
        }
    }

    fn crop(&self, image: &DynamicImage, rect: CropRect) -> DynamicImage {
        image.crop_imm(rect.x, rect.y, rect.width, rect.height)
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode_lossy(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let converted: RgbImage;
        let rgb = match image.as_rgb8() {
            Some(rgb) => rgb,
            None => {
                converted = image.to_rgb8();
                &converted
            }
        };

        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(BackendError::ProcessingFailed(
                "cannot encode an empty image".to_string(),
            ));
        }

        let encoded = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
            .encode(quality.value() as f32);
        if encoded.is_empty() {
            return Err(BackendError::ProcessingFailed(format!(
                "WebP encode produced no data for {}x{}",
                rgb.width(),
                rgb.height()
            )));
        }
        Ok(encoded.to_vec())
    }
}
