//! Scratch-file and source removal.
//!
//! Cleanup never fails the run: a file that is already gone counts as
//! removed, anything else is logged and reported.

use crate::imaging::operations::temp_path_for;
use crate::ladder::VariantSpec;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

impl CleanupReport {
    pub fn removed(&self, path: &Path) -> bool {
        self.removed.iter().any(|p| p == path)
    }
}

/// Every scratch path the ladder can produce in `dir`.
pub fn temp_files_for(dir: &Path, ladder: &[VariantSpec]) -> Vec<PathBuf> {
    ladder.iter().map(|spec| temp_path_for(dir, spec)).collect()
}

/// Delete `temp_files`, then `source` when given.
pub fn cleanup(source: Option<&Path>, temp_files: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in temp_files.iter().map(PathBuf::as_path).chain(source) {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed");
                report.removed.push(path.to_path_buf());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not remove file");
                report.failed.push((path.to_path_buf(), e));
            }
        }
    }
    report
}
