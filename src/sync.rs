//! Record synchronization.
//!
//! After uploads, the record's image columns are overwritten with the new
//! public URLs and the record is stamped as published. Columns go first:
//! a record is never published pointing at placeholder filenames while its
//! URLs are still being written.
//!
//! The correlation column holds the source filename until the record is
//! synchronized. Normally the `hero_1200` URL overwrites it; when that
//! variant did not upload, the same column update writes `null` instead.
//! Either way a published record never matches its old filename again.

use crate::ladder;
use crate::publish::UploadedVariant;
use crate::records::{ColumnUpdate, RecordError, RecordStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Column update failed: {0}")]
    Columns(#[source] RecordError),
    #[error("Publish timestamp update failed: {source}")]
    Publish {
        #[source]
        source: RecordError,
        /// Image columns already written before the timestamp update failed.
        columns_written: Vec<String>,
    },
}

impl SyncError {
    /// Image columns that reached the record despite the failure.
    pub fn columns_written(&self) -> &[String] {
        match self {
            SyncError::Columns(_) => &[],
            SyncError::Publish {
                columns_written, ..
            } => columns_written,
        }
    }
}

/// When to stamp the publish timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishPolicy {
    /// Publish even when no image column was written.
    #[default]
    Always,
    /// Publish only when at least one image column was written.
    RequireImages,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Image columns that now hold public URLs.
    pub columns_written: Vec<String>,
    /// The correlation column was cleared rather than overwritten by a URL.
    pub key_cleared: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// Map uploaded variants onto record columns; unmapped variants are dropped.
pub fn column_updates(uploaded: &[UploadedVariant]) -> ColumnUpdate {
    uploaded
        .iter()
        .filter_map(|u| {
            ladder::column_for(u.name).map(|column| (column.to_string(), Some(u.url.clone())))
        })
        .collect()
}

pub fn synchronize(
    records: &impl RecordStore,
    record_id: &str,
    correlation_column: &str,
    uploaded: &[UploadedVariant],
    policy: PublishPolicy,
    now: DateTime<Utc>,
) -> Result<SyncReport, SyncError> {
    let mut columns = column_updates(uploaded);
    let mut report = SyncReport::default();

    if columns.is_empty() && policy == PublishPolicy::RequireImages {
        warn!("no image columns written; leaving record unpublished");
        return Ok(report);
    }

    let image_columns: Vec<String> = columns.keys().cloned().collect();
    if !columns.contains_key(correlation_column) {
        columns.insert(correlation_column.to_string(), None);
        report.key_cleared = true;
    }

    records
        .update_columns(record_id, &columns)
        .map_err(SyncError::Columns)?;
    report.columns_written = image_columns;
    info!(
        columns = report.columns_written.len(),
        key_cleared = report.key_cleared,
        "record columns updated"
    );

    records
        .set_published_at(record_id, now)
        .map_err(|source| SyncError::Publish {
            source,
            columns_written: report.columns_written.clone(),
        })?;
    report.published_at = Some(now);
    info!(published_at = %now.to_rfc3339(), "record published");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::LADDER;
    use crate::test_helpers::{MemoryRecords, RecordCall};
    use crate::records::RecordStore;
    use chrono::TimeZone;

    fn uploaded(names: &[&'static str]) -> Vec<UploadedVariant> {
        names
            .iter()
            .map(|&name| UploadedVariant {
                name,
                path: format!("articles/a1/{name}.webp"),
                url: format!("https://cdn/articles/a1/{name}.webp"),
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    #[test]
    fn full_ladder_maps_to_five_columns() {
        let names: Vec<&'static str> = LADDER.iter().map(|s| s.name).collect();
        let columns = column_updates(&uploaded(&names));

        assert_eq!(columns.len(), 5);
        assert_eq!(
            columns.get("image_standard").cloned().flatten().as_deref(),
            Some("https://cdn/articles/a1/hero_1200.webp")
        );
        assert_eq!(
            columns.get("image_list").cloned().flatten().as_deref(),
            Some("https://cdn/articles/a1/list_320.webp")
        );
        assert!(
            !columns
                .values()
                .flatten()
                .any(|url| url.contains("list_480"))
        );
    }

    #[test]
    fn columns_written_before_publish() {
        let records = MemoryRecords::new().with_record("a1", None, "x.png");

        let report = synchronize(
            &records,
            "a1",
            "image_standard",
            &uploaded(&["hero_1600", "list_600"]),
            PublishPolicy::Always,
            now(),
        )
        .unwrap();

        assert_eq!(report.columns_written, vec!["image_large"]);
        assert_eq!(report.published_at, Some(now()));
        let calls = records.calls();
        assert!(matches!(&calls[0], RecordCall::Update { id, columns }
            if id == "a1" && columns.len() == 2));
        assert!(matches!(&calls[1], RecordCall::Publish { id, at } if id == "a1" && *at == now()));
    }

    #[test]
    fn nothing_uploaded_still_publishes_by_default() {
        let records = MemoryRecords::new().with_record("a1", None, "x.png");

        let report = synchronize(
            &records,
            "a1",
            "image_standard",
            &[],
            PublishPolicy::Always,
            now(),
        )
        .unwrap();

        assert!(report.columns_written.is_empty());
        assert!(report.key_cleared);
        assert_eq!(report.published_at, Some(now()));
        // The only column written clears the correlation key
        let calls = records.calls();
        assert_eq!(calls.len(), 2);
        let expected: ColumnUpdate = [("image_standard".to_string(), None)].into();
        assert_eq!(
            calls[0],
            RecordCall::Update {
                id: "a1".to_string(),
                columns: expected,
            }
        );
        assert_eq!(records.correlation_of("a1"), None);
    }

    #[test]
    fn missing_hero_1200_clears_correlation_key() {
        let records = MemoryRecords::new().with_record("a1", None, "x.png");

        let report = synchronize(
            &records,
            "a1",
            "image_standard",
            &uploaded(&["hero_1600", "hero_800"]),
            PublishPolicy::Always,
            now(),
        )
        .unwrap();

        assert_eq!(report.columns_written, vec!["image_large", "image_tablet"]);
        assert!(report.key_cleared);
        assert_eq!(records.correlation_of("a1"), None);
        assert_eq!(records.find_by_correlation_key("x.png").unwrap(), None);
    }

    #[test]
    fn hero_1200_url_replaces_correlation_key() {
        let records = MemoryRecords::new().with_record("a1", None, "x.png");

        let report = synchronize(
            &records,
            "a1",
            "image_standard",
            &uploaded(&["hero_1200"]),
            PublishPolicy::Always,
            now(),
        )
        .unwrap();

        assert!(!report.key_cleared);
        assert_eq!(
            records.correlation_of("a1").as_deref(),
            Some("https://cdn/articles/a1/hero_1200.webp")
        );
    }

    #[test]
    fn require_images_skips_publish_without_columns() {
        let records = MemoryRecords::new().with_record("a1", None, "x.png");

        let report = synchronize(
            &records,
            "a1",
            "image_standard",
            &uploaded(&["list_480"]),
            PublishPolicy::RequireImages,
            now(),
        )
        .unwrap();

        assert_eq!(report, SyncReport::default());
        assert!(records.calls().is_empty());
        assert_eq!(records.correlation_of("a1").as_deref(), Some("x.png"));
    }

    #[test]
    fn column_failure_prevents_publish() {
        let records = MemoryRecords::new()
            .with_record("a1", None, "x.png")
            .fail_updates();

        let result = synchronize(
            &records,
            "a1",
            "image_standard",
            &uploaded(&["hero_1600"]),
            PublishPolicy::Always,
            now(),
        );

        assert!(matches!(result, Err(SyncError::Columns(_))));
        assert!(
            !records
                .calls()
                .iter()
                .any(|c| matches!(c, RecordCall::Publish { .. }))
        );
    }

    #[test]
    fn publish_failure_is_reported() {
        let records = MemoryRecords::new()
            .with_record("a1", None, "x.png")
            .fail_publish();

        let result = synchronize(
            &records,
            "a1",
            "image_standard",
            &uploaded(&["hero_1600"]),
            PublishPolicy::Always,
            now(),
        );

        let err = result.unwrap_err();
        assert!(matches!(err, SyncError::Publish { .. }));
        // The columns stay written even though the timestamp did not land
        assert_eq!(err.columns_written().to_vec(), vec!["image_large"]);
    }

    #[test]
    fn policy_parses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrap {
            policy: PublishPolicy,
        }
        let w: Wrap = toml::from_str("policy = \"require-images\"").unwrap();
        assert_eq!(w.policy, PublishPolicy::RequireImages);
    }
}
