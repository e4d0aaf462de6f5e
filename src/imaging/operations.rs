//! Variant generation.
//!
//! Combines the crop geometry with backend execution: decode once, then for
//! every ladder entry crop → resize → encode → write a `temp_*` file next to
//! the source.
//!
//! Failure granularity:
//! - the source cannot be decoded → `Err`, nothing is written
//! - one variant fails to encode or write → recorded in
//!   [`VariantSet::failures`], the remaining variants still run

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::Quality;
use crate::ladder::{CropPolicy, VariantSpec};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One encoded derivative, written to a scratch file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVariant {
    pub spec: VariantSpec,
    pub temp_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

impl GeneratedVariant {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }
}

#[derive(Debug)]
pub struct VariantFailure {
    pub name: &'static str,
    pub error: BackendError,
}

/// Everything produced for one source image.
#[derive(Debug)]
pub struct VariantSet {
    pub source: Dimensions,
    pub variants: Vec<GeneratedVariant>,
    pub failures: Vec<VariantFailure>,
}

/// Crop and resize one ladder entry, without encoding.
pub fn shape_variant<B: ImageBackend>(backend: &B, image: &B::Image, spec: &VariantSpec) -> B::Image {
    match spec.crop {
        CropPolicy::None => backend.resize(image, spec.width, spec.height),
        CropPolicy::CenterSquare => {
            let cropped = backend.center_crop_square(image);
            backend.resize(&cropped, spec.width, spec.height)
        }
        CropPolicy::Center16x9 => {
            let cropped = backend.center_crop_16x9(image);
            backend.resize(&cropped, spec.width, spec.height)
        }
    }
}

/// Scratch path for a ladder entry inside `temp_dir`.
pub fn temp_path_for(temp_dir: &Path, spec: &VariantSpec) -> PathBuf {
    temp_dir.join(spec.temp_file_name())
}

/// Produce one variant per ladder entry from `source`.
pub fn generate_variants<B: ImageBackend>(
    backend: &B,
    source: &Path,
    ladder: &[VariantSpec],
    quality: Quality,
    temp_dir: &Path,
) -> Result<VariantSet, BackendError> {
    let image = backend.decode(source)?;
    let dims = backend.dimensions(&image);
    info!(
        width = dims.width,
        height = dims.height,
        ratio = %format_args!("{:.2}", dims.ratio()),
        "input image"
    );

    let mut variants = Vec::with_capacity(ladder.len());
    let mut failures = Vec::new();

    for spec in ladder {
        let shaped = shape_variant(backend, &image, spec);
        let out = backend.dimensions(&shaped);

        let written = backend.encode_lossy(&shaped, quality).and_then(|bytes| {
            let temp_path = temp_path_for(temp_dir, spec);
            std::fs::write(&temp_path, &bytes)?;
            Ok((temp_path, bytes.len()))
        });

        match written {
            Ok((temp_path, size_bytes)) => {
                debug!(
                    variant = spec.name,
                    width = out.width,
                    height = out.height,
                    size_bytes,
                    "variant encoded"
                );
                variants.push(GeneratedVariant {
                    spec: *spec,
                    temp_path,
                    width: out.width,
                    height: out.height,
                    size_bytes,
                });
            }
            Err(error) => {
                warn!(variant = spec.name, %error, "variant skipped");
                failures.push(VariantFailure {
                    name: spec.name,
                    error,
                });
            }
        }
    }

    Ok(VariantSet {
        source: dims,
        variants,
        failures,
    })
}
