//! Supabase client: PostgREST for content records, Storage API for objects.
//!
//! One [`SupabaseClient`] is built at startup and handed by reference to every
//! pipeline step. It speaks plain HTTP through a blocking `reqwest` client;
//! the batch job is sequential, so nothing here needs an async runtime.
//!
//! | Operation | Request |
//! |---|---|
//! | find by correlation key | `GET /rest/v1/{table}?select=id,slug&{key_column}=eq.{key}&limit=1` |
//! | update columns | `PATCH /rest/v1/{table}?{id_column}=eq.{id}` |
//! | upload | `POST /storage/v1/object/{bucket}/{path}` with `x-upsert` |
//! | public URL | `{base}/storage/v1/object/public/{bucket}/{path}` (derived) |

use crate::config::RecordsConfig;
use crate::records::{ColumnUpdate, ContentRecord, RecordError, RecordStore};
use crate::storage::{ObjectStorage, StorageError};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    service_key: String,
    records: RecordsConfig,
}

impl SupabaseClient {
    pub fn new(
        base_url: &str,
        service_key: &str,
        records: RecordsConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            records,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.records.table)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.service_key.as_str())
            .bearer_auth(&self.service_key)
    }

    fn patch_record(&self, id: &str, body: &Value) -> Result<(), RecordError> {
        let response = self
            .authed(self.http.patch(self.table_url()))
            .query(&[(self.records.id_column.as_str(), format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(body)
            .send()?;
        ensure_success(response).map_err(|(status, body)| RecordError::Status { status, body })?;
        Ok(())
    }
}

/// Pass 2xx responses through; otherwise return status and body text.
fn ensure_success(response: Response) -> Result<Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err((status.as_u16(), body))
}

/// Read a text-like column; numeric ids are rendered as decimal strings.
fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RecordStore for SupabaseClient {
    fn find_by_correlation_key(&self, key: &str) -> Result<Option<ContentRecord>, RecordError> {
        let select = format!("{},{}", self.records.id_column, self.records.slug_column);
        let response = self
            .authed(self.http.get(self.table_url()))
            .query(&[
                ("select", select),
                (self.records.correlation_column.as_str(), format!("eq.{key}")),
                ("limit", "1".to_string()),
            ])
            .send()?;
        let response =
            ensure_success(response).map_err(|(status, body)| RecordError::Status { status, body })?;

        let rows: Vec<Value> = response.json()?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let id = column_text(row, &self.records.id_column).ok_or_else(|| {
            RecordError::Malformed(format!(
                "row for {key} has no usable `{}` column",
                self.records.id_column
            ))
        })?;
        let slug = column_text(row, &self.records.slug_column);
        debug!(key, id = %id, "correlation lookup matched");

        Ok(Some(ContentRecord { id, slug }))
    }

    fn update_columns(&self, id: &str, columns: &ColumnUpdate) -> Result<(), RecordError> {
        let body = serde_json::to_value(columns)
            .map_err(|e| RecordError::Malformed(format!("column update: {e}")))?;
        self.patch_record(id, &body)
    }

    fn set_published_at(&self, id: &str, at: DateTime<Utc>) -> Result<(), RecordError> {
        let mut body = serde_json::Map::new();
        body.insert(
            self.records.published_column.clone(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        self.patch_record(id, &Value::Object(body))
    }
}

impl ObjectStorage for SupabaseClient {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{bucket}/{path}", self.base_url);
        let response = self
            .authed(self.http.post(url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(data)
            .send()?;
        ensure_success(response).map_err(|(status, body)| StorageError::Status { status, body })?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.base_url
        )
    }
}
