//! Image processing: decode, center-crop, resize, lossy WebP.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` + RGB8 normalization |
//! | **Center crop** | pure geometry in `calculations` + `crop_imm` |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Encode** | `webp` (libwebp, lossy) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: `Quality` and `CropRect`
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Variant generation over the size ladder

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{GeneratedVariant, VariantFailure, VariantSet, generate_variants};
pub use params::{CropRect, Quality};
pub use rust_backend::RustBackend;
