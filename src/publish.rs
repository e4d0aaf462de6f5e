//! Upload generated variants to object storage.
//!
//! Each variant is stored at `{prefix}/{record_key}/{variant}.webp` with
//! upsert enabled, so re-running an image overwrites in place. One failed
//! upload is logged and skipped; the rest of the ladder still goes out.

use crate::imaging::GeneratedVariant;
use crate::storage::{ObjectStorage, StorageError, content_type_for};
use tracing::{debug, warn};

/// A variant that reached storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVariant {
    pub name: &'static str,
    pub path: String,
    pub url: String,
}

#[derive(Debug)]
pub struct UploadFailure {
    pub name: &'static str,
    pub error: StorageError,
}

#[derive(Debug, Default)]
pub struct PublishReport {
    pub uploaded: Vec<UploadedVariant>,
    pub failures: Vec<UploadFailure>,
}

/// Object path for one variant file.
///
/// Empty segments are dropped, so an empty prefix yields `{key}/{file}`.
pub fn storage_path(prefix: &str, record_key: &str, file_name: &str) -> String {
    [prefix.trim_matches('/'), record_key, file_name]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

pub fn publish_variants(
    storage: &impl ObjectStorage,
    bucket: &str,
    prefix: &str,
    record_key: &str,
    variants: &[GeneratedVariant],
) -> PublishReport {
    let mut report = PublishReport::default();

    for variant in variants {
        let file_name = variant.spec.file_name();
        let path = storage_path(prefix, record_key, &file_name);
        let content_type = content_type_for(&file_name);
        let result = std::fs::read(&variant.temp_path)
            .map_err(StorageError::from)
            .and_then(|data| storage.upload(bucket, &path, data, content_type, true));

        match result {
            Ok(()) => {
                let url = storage.public_url(bucket, &path);
                debug!(variant = variant.name(), url = %url, "uploaded");
                report.uploaded.push(UploadedVariant {
                    name: variant.name(),
                    path,
                    url,
                });
            }
            Err(error) => {
                warn!(variant = variant.name(), path = %path, %error, "upload failed");
                report.failures.push(UploadFailure {
                    name: variant.name(),
                    error,
                });
            }
        }
    }

    report
}
