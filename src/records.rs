//! Content-record store capability.
//!
//! The pipeline needs three calls against the record store: a read by
//! correlation key (at most one row), a partial column update by id, and a
//! single-column publish-timestamp update by id. [`RecordStore`] is that
//! surface; [`SupabaseClient`](crate::supabase::SupabaseClient) is the
//! production implementation.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Record store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected record store response: {0}")]
    Malformed(String),
}

/// The subset of a content record the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: String,
    pub slug: Option<String>,
}

/// Column name → new value; `None` clears the column (written as JSON `null`).
pub type ColumnUpdate = BTreeMap<String, Option<String>>;

pub trait RecordStore {
    /// Find the record whose correlation column equals `key`.
    fn find_by_correlation_key(&self, key: &str) -> Result<Option<ContentRecord>, RecordError>;

    /// Write the given columns on record `id`.
    fn update_columns(&self, id: &str, columns: &ColumnUpdate) -> Result<(), RecordError>;

    /// Set the publish timestamp on record `id`.
    fn set_published_at(&self, id: &str, at: DateTime<Utc>) -> Result<(), RecordError>;
}
