//! Source discovery and record correlation.
//!
//! The article generator saves each raw image into the images directory and
//! writes the bare filename into the record's correlation column. Discovery
//! lists those files; correlation asks the record store which record carries
//! the filename.
//!
//! Only the top level of the directory is scanned. `temp_*` files are
//! leftovers of an interrupted run and are never picked up as sources.
//! Symlinks are followed. Entries that cannot be used (a dangling link, a
//! name that is not valid UTF-8) are logged and skipped.

use crate::records::{ContentRecord, RecordError, RecordStore};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Prefix of scratch files written next to the sources.
pub const TEMP_PREFIX: &str = "temp_";

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A raw image waiting to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    /// Bare filename including extension, e.g. `robots-take-over.png`.
    pub file_name: String,
}

impl SourceImage {
    pub fn new(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(Self { path, file_name })
    }
}

/// List pending sources in `dir`, sorted by filename.
///
/// A missing directory is an empty batch, not an error.
pub fn find_pending_sources(dir: &Path, extension: &str) -> Result<Vec<SourceImage>, LocateError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let extension = extension.trim_start_matches('.');

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_pending(entry.path(), extension) {
            continue;
        }
        match SourceImage::new(entry.path().to_path_buf()) {
            Some(source) => sources.push(source),
            None => warn!(
                path = %entry.path().display(),
                "skipping source with non-UTF-8 filename"
            ),
        }
    }
    Ok(sources)
}

fn is_pending(path: &Path, extension: &str) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    if name.starts_with(TEMP_PREFIX) || name.starts_with('.') {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// The value matched against the record's correlation column.
pub fn correlation_key(source: &SourceImage) -> &str {
    &source.file_name
}

/// Find the record a source image belongs to.
pub fn locate_record(
    records: &impl RecordStore,
    source: &SourceImage,
) -> Result<Option<ContentRecord>, RecordError> {
    records.find_by_correlation_key(correlation_key(source))
}
