//! Shared test doubles for the pipeline test suite.
//!
//! In-memory implementations of the two network capabilities, plus fixture
//! helpers that write real files into a temp directory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let records = MemoryRecords::new().with_record("a1", Some("robots"), "robots.png");
//! let storage = MemoryStorage::new().fail_path("articles/a1/hero_800.webp");
//!
//! // ... run a pipeline step ...
//!
//! assert_eq!(storage.uploads().len(), 6);
//! assert!(matches!(records.calls()[0], RecordCall::Update { .. }));
//! ```

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use crate::config::RecordsConfig;
use crate::imaging::GeneratedVariant;
use crate::ladder::VariantSpec;
use crate::records::{ColumnUpdate, ContentRecord, RecordError, RecordStore};
use crate::storage::{ObjectStorage, StorageError};

// =========================================================================
// Records
// =========================================================================

/// A write made against [`MemoryRecords`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordCall {
    Update { id: String, columns: ColumnUpdate },
    Publish { id: String, at: DateTime<Utc> },
}

#[derive(Debug, Clone)]
struct StoredRecord {
    record: ContentRecord,
    correlation: Option<String>,
}

/// Record store backed by a `Vec`, mimicking the correlation-column semantics:
/// an update that writes the correlation column replaces the stored key, and
/// writing `null` clears it.
#[derive(Default)]
pub struct MemoryRecords {
    rows: Mutex<Vec<StoredRecord>>,
    lookups: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordCall>>,
    fail_lookup: HashSet<String>,
    fail_updates: bool,
    fail_publish: bool,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, id: &str, slug: Option<&str>, correlation: &str) -> Self {
        self.rows.lock().unwrap().push(StoredRecord {
            record: ContentRecord {
                id: id.to_string(),
                slug: slug.map(str::to_string),
            },
            correlation: Some(correlation.to_string()),
        });
        self
    }

    /// Make lookups for `key` return an error.
    pub fn fail_lookup(mut self, key: &str) -> Self {
        self.fail_lookup.insert(key.to_string());
        self
    }

    pub fn fail_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn fail_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<RecordCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RecordCall::Publish { .. }))
            .count()
    }

    pub fn correlation_of(&self, id: &str) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.record.id == id)
            .and_then(|r| r.correlation.clone())
    }
}

fn injected() -> RecordError {
    RecordError::Status {
        status: 500,
        body: "injected failure".to_string(),
    }
}

impl RecordStore for MemoryRecords {
    fn find_by_correlation_key(&self, key: &str) -> Result<Option<ContentRecord>, RecordError> {
        self.lookups.lock().unwrap().push(key.to_string());
        if self.fail_lookup.contains(key) {
            return Err(injected());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.correlation.as_deref() == Some(key))
            .map(|r| r.record.clone()))
    }

    fn update_columns(&self, id: &str, columns: &ColumnUpdate) -> Result<(), RecordError> {
        self.calls.lock().unwrap().push(RecordCall::Update {
            id: id.to_string(),
            columns: columns.clone(),
        });
        if self.fail_updates {
            return Err(injected());
        }
        let correlation_column = RecordsConfig::default().correlation_column;
        if let Some(value) = columns.get(&correlation_column) {
            for row in self.rows.lock().unwrap().iter_mut() {
                if row.record.id == id {
                    row.correlation = value.clone();
                }
            }
        }
        Ok(())
    }

    fn set_published_at(&self, id: &str, at: DateTime<Utc>) -> Result<(), RecordError> {
        self.calls.lock().unwrap().push(RecordCall::Publish {
            id: id.to_string(),
            at,
        });
        if self.fail_publish {
            return Err(injected());
        }
        Ok(())
    }
}

// =========================================================================
// Storage
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct StoredUpload {
    pub bucket: String,
    pub path: String,
    pub data: Vec<u8>,
    pub content_type: String,
    pub upsert: bool,
}

/// Object storage that keeps every upload in memory.
#[derive(Default)]
pub struct MemoryStorage {
    uploads: Mutex<Vec<StoredUpload>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_paths: HashSet<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads to `path` fail.
    pub fn fail_path(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    pub fn uploads(&self) -> Vec<StoredUpload> {
        self.uploads.lock().unwrap().clone()
    }

    /// Current content stored under `{bucket}/{path}`.
    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{path}"))
            .cloned()
    }
}

impl ObjectStorage for MemoryStorage {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError> {
        if self.failing_paths.contains(path) {
            return Err(StorageError::Status {
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        let key = format!("{bucket}/{path}");
        let mut objects = self.objects.lock().unwrap();
        if !upsert && objects.contains_key(&key) {
            return Err(StorageError::Status {
                status: 409,
                body: "duplicate".to_string(),
            });
        }
        objects.insert(key, data.clone());
        self.uploads.lock().unwrap().push(StoredUpload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            data,
            content_type: content_type.to_string(),
            upsert,
        });
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }
}

// =========================================================================
// Fixtures
// =========================================================================

/// Write a gradient PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
    .save(path)
    .unwrap();
}

/// Write one fake temp file per ladder entry and describe them as generated.
///
/// File content is `bytes:{variant}` so uploads can be traced back.
pub fn fake_variants(dir: &Path, ladder: &[VariantSpec]) -> Vec<GeneratedVariant> {
    ladder
        .iter()
        .map(|spec| {
            let temp_path = dir.join(spec.temp_file_name());
            let data = format!("bytes:{}", spec.name);
            std::fs::write(&temp_path, &data).unwrap();
            GeneratedVariant {
                spec: *spec,
                temp_path,
                width: spec.width,
                height: spec.height,
                size_bytes: data.len(),
            }
        })
        .collect()
}
