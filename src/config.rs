//! Pipeline configuration.
//!
//! Settings come from an optional `config.toml`; credentials come from the
//! environment. The file is sparse: stock defaults are serialized to a TOML
//! table, the user file is merged on top key-by-key, and the result is
//! deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! images_dir = "afbeeldingen"   # Directory scanned for raw images
//! source_extension = "png"      # Raw image extension (case-insensitive)
//! quality = 85                  # Lossy WebP quality (1-100)
//! publish_policy = "always"     # "always" | "require-images"
//!
//! [storage]
//! bucket = "media"
//! path_prefix = "articles"      # Objects land at {prefix}/{record}/{variant}.webp
//! path_key = "id"               # "id" | "slug"
//!
//! [records]
//! table = "articles"
//! id_column = "id"
//! correlation_column = "image_standard"
//! slug_column = "slug"
//! published_column = "published_at"
//!
//! [http]
//! timeout_secs = 60
//! ```
//!
//! ## Credentials
//!
//! `SUPABASE_URL` and `SUPABASE_SERVICE_KEY` are read from the environment
//! (a `.env` file in the working directory is loaded first). They are never
//! read from `config.toml`.
//!
//! Unknown keys are rejected to catch typos early.

use crate::sync::PublishPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_SERVICE_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// Pipeline configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory scanned for raw images; temp variants are written here too.
    pub images_dir: PathBuf,
    /// Extension of raw images, without the dot.
    pub source_extension: String,
    /// Lossy WebP quality.
    pub quality: u32,
    /// Whether a record is published when no image column could be written.
    pub publish_policy: PublishPolicy,
    pub storage: StorageConfig,
    pub records: RecordsConfig,
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("afbeeldingen"),
            source_extension: "png".to_string(),
            quality: 85,
            publish_policy: PublishPolicy::default(),
            storage: StorageConfig::default(),
            records: RecordsConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.source_extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Validation(
                "source_extension must not be empty".into(),
            ));
        }
        if self.storage.bucket.is_empty() {
            return Err(ConfigError::Validation(
                "storage.bucket must not be empty".into(),
            ));
        }
        let columns = [
            ("records.table", &self.records.table),
            ("records.id_column", &self.records.id_column),
            ("records.correlation_column", &self.records.correlation_column),
            ("records.slug_column", &self.records.slug_column),
            ("records.published_column", &self.records.published_column),
        ];
        for (key, value) in columns {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Which record field names the per-record storage folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathKey {
    #[default]
    Id,
    Slug,
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub bucket: String,
    /// Leading path segment shared by all uploaded variants.
    pub path_prefix: String,
    pub path_key: PathKey,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "media".to_string(),
            path_prefix: "articles".to_string(),
            path_key: PathKey::Id,
        }
    }
}

/// Content-record table and column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordsConfig {
    pub table: String,
    pub id_column: String,
    /// Column holding the placeholder filename written by the generator.
    pub correlation_column: String,
    pub slug_column: String,
    pub published_column: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            table: "articles".to_string(),
            id_column: "id".to_string(),
            correlation_column: "image_standard".to_string(),
            slug_column: "slug".to_string(),
            published_column: "published_at".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Supabase project URL and service-role key.
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub service_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read credentials through `lookup` (normally `std::env::var`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        Ok(Self {
            url: read(URL_VAR)?,
            service_key: read(KEY_VAR)?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Article Images Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Credentials are NOT read from this file. Set them in the environment
# (or a .env file next to where you run the command):
#   SUPABASE_URL=https://<project>.supabase.co
#   SUPABASE_SERVICE_KEY=<service role key>

# Directory scanned for freshly generated images. Temporary variants
# (temp_*.webp) are written here and removed after each image.
images_dir = "afbeeldingen"

# Extension of the raw images to pick up (case-insensitive, no dot).
source_extension = "png"

# Lossy WebP quality for every variant (1 = worst, 100 = best).
quality = 85

# What to do when no image column could be written for a record:
#   "always"          - still set the publish timestamp (image is reported as failed)
#   "require-images"  - leave the record unpublished
publish_policy = "always"

# ---------------------------------------------------------------------------
# Object storage
# ---------------------------------------------------------------------------
[storage]
bucket = "media"

# Variants are stored at {path_prefix}/{record}/{variant}.webp
path_prefix = "articles"

# Which record field fills {record}: "id" or "slug" (falls back to id
# when a record has no slug).
path_key = "id"

# ---------------------------------------------------------------------------
# Content records
# ---------------------------------------------------------------------------
[records]
table = "articles"
id_column = "id"

# Column holding the raw image filename; used to match a file to its record.
correlation_column = "image_standard"

slug_column = "slug"
published_column = "published_at"

# ---------------------------------------------------------------------------
# HTTP
# ---------------------------------------------------------------------------
[http]
# Per-request timeout for storage and record-store calls.
timeout_secs = 60
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.images_dir, PathBuf::from("afbeeldingen"));
        assert_eq!(config.source_extension, "png");
        assert_eq!(config.quality, 85);
        assert_eq!(config.publish_policy, PublishPolicy::Always);
        assert_eq!(config.storage.bucket, "media");
        assert_eq!(config.storage.path_prefix, "articles");
        assert_eq!(config.storage.path_key, PathKey::Id);
        assert_eq!(config.records.correlation_column, "image_standard");
        assert_eq!(config.http.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
quality = 70

[storage]
bucket = "assets"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.quality, 70);
        assert_eq!(config.storage.bucket, "assets");
        // Defaults preserved
        assert_eq!(config.storage.path_prefix, "articles");
        assert_eq!(config.records.table, "articles");
    }

    #[test]
    fn parse_enums() {
        let toml = r#"
publish_policy = "require-images"

[storage]
path_key = "slug"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.publish_policy, PublishPolicy::RequireImages);
        assert_eq!(config.storage.path_key, PathKey::Slug);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<Config, _> = toml::from_str("qualty = 80\n");
        assert!(result.is_err());

        let result: Result<Config, _> = toml::from_str("[storage]\nbuckets = \"x\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // validate
    // =========================================================================

    #[test]
    fn validate_quality_range() {
        let mut config = Config::default();
        config.quality = 0;
        assert!(config.validate().is_err());
        config.quality = 101;
        assert!(config.validate().is_err());
        config.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_empty_names() {
        let mut config = Config::default();
        config.storage.bucket.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.records.correlation_column.clear();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("records.correlation_column"), "{err}");

        let mut config = Config::default();
        config.source_extension = ".".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_timeout() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_overrides_nested_keys_only() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[records]\ntable = \"posts\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        let config: Config = merged.try_into().unwrap();
        assert_eq!(config.records.table, "posts");
        assert_eq!(config.records.id_column, "id");
    }

    #[test]
    fn merge_replaces_scalars() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3\nc = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").and_then(|v| v.as_integer()), Some(1));
        assert_eq!(merged.get("b").and_then(|v| v.as_integer()), Some(3));
        assert_eq!(merged.get("c").and_then(|v| v.as_integer()), Some(4));
    }

    // =========================================================================
    // load_config
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.quality, 85);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
images_dir = "/var/spool/images"

[records]
published_column = "live_at"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.images_dir, PathBuf::from("/var/spool/images"));
        assert_eq!(config.records.published_column, "live_at");
        assert_eq!(config.records.slug_column, "slug");
    }

    #[test]
    fn load_config_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "quality = [").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "quality = 500\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.images_dir, defaults.images_dir);
        assert_eq!(config.quality, defaults.quality);
        assert_eq!(config.publish_policy, defaults.publish_policy);
        assert_eq!(config.storage.bucket, defaults.storage.bucket);
        assert_eq!(config.records, defaults.records);
        assert_eq!(config.http.timeout_secs, defaults.http.timeout_secs);
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    #[test]
    fn credentials_from_lookup() {
        let creds = Credentials::from_lookup(|name| match name {
            URL_VAR => Some("https://proj.supabase.co".to_string()),
            KEY_VAR => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(creds.url, "https://proj.supabase.co");
        assert_eq!(creds.service_key, "secret");
    }

    #[test]
    fn credentials_missing_or_blank() {
        let result = Credentials::from_lookup(|name| match name {
            URL_VAR => Some("https://proj.supabase.co".to_string()),
            _ => Some("   ".to_string()),
        });
        assert!(matches!(result, Err(ConfigError::MissingEnv(KEY_VAR))));

        let result = Credentials::from_lookup(|_| None);
        assert!(matches!(result, Err(ConfigError::MissingEnv(URL_VAR))));
    }

    #[test]
    fn credentials_debug_redacts_key() {
        let creds = Credentials {
            url: "u".to_string(),
            service_key: "super-secret".to_string(),
        };
        assert!(!format!("{creds:?}").contains("super-secret"));
    }
}
