//! Object-storage capability.
//!
//! The pipeline always uploads with `upsert = true`: writing the same
//! bucket/path twice replaces the object. The public URL is derived from
//! bucket + path alone, so it is stable across re-uploads.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage returned {status}: {body}")]
    Status { status: u16, body: String },
}

pub trait ObjectStorage {
    /// Store `data` at `bucket/path`; with `upsert`, an existing object is replaced.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError>;

    /// Publicly resolvable URL for `bucket/path`.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Content type from a file name's extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "webp" => "image/webp",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
