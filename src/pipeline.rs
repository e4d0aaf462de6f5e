//! Batch driver.
//!
//! Runs every pending source image through the full sequence, one image at a
//! time:
//!
//! ```text
//! locate ──► generate ──► upload ──► synchronize ──► cleanup
//!   │           │
//!   │           └─ decode failed: source kept, temps removed
//!   └─ no match / lookup failed: source kept, nothing else runs
//! ```
//!
//! Per-image failures are folded into an [`ImageOutcome`] and never abort the
//! batch. The only error [`run_batch`] returns is an unreadable images
//! directory.
//!
//! ## Cleanup rules
//!
//! | Outcome | Temp files | Source |
//! |---|---|---|
//! | `NoMatch`, `LookupFailed` | untouched | kept |
//! | `DecodeFailed` | removed | kept |
//! | everything else | removed | removed |

use crate::cleanup::{cleanup, temp_files_for};
use crate::config::{Config, PathKey};
use crate::imaging::{GeneratedVariant, ImageBackend, Quality, generate_variants};
use crate::ladder::{LADDER, VariantSpec};
use crate::locate::{LocateError, SourceImage, find_pending_sources, locate_record};
use crate::publish::{UploadedVariant, publish_variants};
use crate::records::{ContentRecord, RecordStore};
use crate::storage::ObjectStorage;
use crate::sync::{PublishPolicy, synchronize};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn};

/// Everything the driver needs, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub images_dir: PathBuf,
    pub source_extension: String,
    pub quality: Quality,
    pub bucket: String,
    pub path_prefix: String,
    pub path_key: PathKey,
    pub correlation_column: String,
    pub publish_policy: PublishPolicy,
    pub ladder: Vec<VariantSpec>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            images_dir: config.images_dir.clone(),
            source_extension: config.source_extension.clone(),
            quality: Quality::new(config.quality),
            bucket: config.storage.bucket.clone(),
            path_prefix: config.storage.path_prefix.clone(),
            path_key: config.storage.path_key,
            correlation_column: config.records.correlation_column.clone(),
            publish_policy: config.publish_policy,
            ladder: LADDER.to_vec(),
        }
    }

    /// Storage folder name for a record.
    pub fn record_key<'a>(&self, record: &'a ContentRecord) -> &'a str {
        match (self.path_key, record.slug.as_deref()) {
            (PathKey::Slug, Some(slug)) if !slug.is_empty() => slug,
            _ => &record.id,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Terminal state of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Variants uploaded, columns written and the record published.
    Published,
    /// No record carries this filename; the source waits for a later run.
    NoMatch,
    LookupFailed(String),
    DecodeFailed(String),
    /// Not a single variant reached storage.
    NothingUploaded,
    /// Uploads happened but the publish policy left the record unpublished.
    Unpublished,
    SyncFailed(String),
}

impl ImageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImageOutcome::Published)
    }

    /// Whether the source file survives this outcome.
    pub fn keeps_source(&self) -> bool {
        matches!(
            self,
            ImageOutcome::NoMatch | ImageOutcome::LookupFailed(_) | ImageOutcome::DecodeFailed(_)
        )
    }
}

/// What happened to one source image.
#[derive(Debug, Clone)]
pub struct ImageReport {
    pub file_name: String,
    pub record_id: Option<String>,
    pub outcome: ImageOutcome,
    pub generated: Vec<GeneratedVariant>,
    pub variant_failures: Vec<String>,
    pub uploaded: Vec<UploadedVariant>,
    pub upload_failures: Vec<String>,
    pub columns_written: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_removed: bool,
    pub cleanup_failures: Vec<PathBuf>,
}

impl ImageReport {
    fn new(source: &SourceImage) -> Self {
        Self {
            file_name: source.file_name.clone(),
            record_id: None,
            outcome: ImageOutcome::NoMatch,
            generated: Vec::new(),
            variant_failures: Vec::new(),
            uploaded: Vec::new(),
            upload_failures: Vec::new(),
            columns_written: Vec::new(),
            published_at: None,
            source_removed: false,
            cleanup_failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub images: Vec<ImageReport>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.images.len()
    }

    pub fn succeeded(&self) -> usize {
        self.images.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Run one source image through locate → generate → upload → sync → cleanup.
pub fn process_single_image<B, R, S>(
    backend: &B,
    records: &R,
    storage: &S,
    settings: &PipelineSettings,
    source: &SourceImage,
) -> ImageReport
where
    B: ImageBackend,
    R: RecordStore,
    S: ObjectStorage,
{
    let _span = info_span!("image", file = %source.file_name).entered();
    let mut report = ImageReport::new(source);

    let record = match locate_record(records, source) {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!("no matching record; leaving file in place");
            return report;
        }
        Err(e) => {
            warn!(error = %e, "record lookup failed; leaving file in place");
            report.outcome = ImageOutcome::LookupFailed(e.to_string());
            return report;
        }
    };
    info!(record_id = %record.id, "matched record");
    report.record_id = Some(record.id.clone());

    let temp_dir = source
        .path
        .parent()
        .unwrap_or(settings.images_dir.as_path());
    let temp_files = temp_files_for(temp_dir, &settings.ladder);

    let set = match generate_variants(
        backend,
        &source.path,
        &settings.ladder,
        settings.quality,
        temp_dir,
    ) {
        Ok(set) => set,
        Err(e) => {
            warn!(error = %e, "could not decode source; skipping");
            report.outcome = ImageOutcome::DecodeFailed(e.to_string());
            finish_cleanup(&mut report, None, &temp_files);
            return report;
        }
    };
    report.variant_failures = set.failures.iter().map(|f| f.name.to_string()).collect();

    let published = publish_variants(
        storage,
        &settings.bucket,
        &settings.path_prefix,
        settings.record_key(&record),
        &set.variants,
    );
    report.generated = set.variants;
    report.upload_failures = published.failures.iter().map(|f| f.name.to_string()).collect();
    report.uploaded = published.uploaded;
    info!(
        uploaded = report.uploaded.len(),
        failed = report.upload_failures.len(),
        "uploads finished"
    );

    report.outcome = match synchronize(
        records,
        &record.id,
        &settings.correlation_column,
        &report.uploaded,
        settings.publish_policy,
        Utc::now(),
    ) {
        Ok(sync) => {
            report.columns_written = sync.columns_written;
            report.published_at = sync.published_at;
            if report.uploaded.is_empty() {
                ImageOutcome::NothingUploaded
            } else if report.published_at.is_none() {
                ImageOutcome::Unpublished
            } else {
                ImageOutcome::Published
            }
        }
        Err(e) => {
            warn!(error = %e, "record synchronization failed");
            report.columns_written = e.columns_written().to_vec();
            ImageOutcome::SyncFailed(e.to_string())
        }
    };

    finish_cleanup(&mut report, Some(&source.path), &temp_files);
    report
}

fn finish_cleanup(report: &mut ImageReport, source: Option<&Path>, temp_files: &[PathBuf]) {
    let cleaned = cleanup(source, temp_files);
    report.source_removed = source.is_some_and(|s| cleaned.removed(s));
    report.cleanup_failures = cleaned.failed.into_iter().map(|(path, _)| path).collect();
}

/// Process every pending source in the images directory.
pub fn run_batch<B, R, S>(
    backend: &B,
    records: &R,
    storage: &S,
    settings: &PipelineSettings,
) -> Result<BatchReport, LocateError>
where
    B: ImageBackend,
    R: RecordStore,
    S: ObjectStorage,
{
    let sources = find_pending_sources(&settings.images_dir, &settings.source_extension)?;
    info!(
        count = sources.len(),
        dir = %settings.images_dir.display(),
        "pending images"
    );

    let images = sources
        .iter()
        .map(|source| process_single_image(backend, records, storage, settings, source))
        .collect();
    Ok(BatchReport { images })
}

/// Correlation status of a pending source, without touching anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Matched(ContentRecord),
    NoMatch,
    LookupFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckEntry {
    pub file_name: String,
    pub status: CheckStatus,
}

/// Dry run: discover pending sources and look up their records.
///
/// Performs no generation, upload, update, or deletion.
pub fn check_batch<R: RecordStore>(
    records: &R,
    settings: &PipelineSettings,
) -> Result<Vec<CheckEntry>, LocateError> {
    let sources = find_pending_sources(&settings.images_dir, &settings.source_extension)?;
    Ok(sources
        .iter()
        .map(|source| {
            let status = match locate_record(records, source) {
                Ok(Some(record)) => CheckStatus::Matched(record),
                Ok(None) => CheckStatus::NoMatch,
                Err(e) => CheckStatus::LookupFailed(e.to_string()),
            };
            CheckEntry {
                file_name: source.file_name.clone(),
                status,
            }
        })
        .collect())
}
