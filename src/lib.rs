//! # Article Images
//!
//! Turns freshly generated article images into a published ladder of cropped
//! WebP variants. An upstream generator drops raw images into a directory and
//! writes each bare filename into its article's `image_standard` column; this
//! crate picks them up, produces the variants, uploads them to Supabase
//! Storage, writes the public URLs back onto the article and publishes it.
//!
//! # Architecture: One Image at a Time
//!
//! ```text
//! locate    afbeeldingen/*.png  →  matching article (by filename)
//! generate  raw image           →  temp_{variant}.webp × 7
//! publish   temp files          →  {bucket}/articles/{id}/{variant}.webp
//! sync      public URLs         →  image columns, then published_at
//! cleanup   temp files + raw    →  deleted
//! ```
//!
//! The batch is strictly sequential and single-threaded. Each stage returns an
//! explicit report instead of an error, so one bad image never stops the
//! batch; the driver folds the reports into a per-image outcome and the CLI
//! prints `N/M images processed successfully`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`ladder`] | The fixed variant ladder and variant → column mapping |
//! | [`imaging`] | Crop geometry, the codec trait, the `image`/`webp` backend, variant generation |
//! | [`locate`] | Pending-source discovery and record correlation |
//! | [`records`] | Record-store capability (`RecordStore`) |
//! | [`storage`] | Object-storage capability (`ObjectStorage`) |
//! | [`supabase`] | PostgREST + Storage API client implementing both capabilities |
//! | [`publish`] | Uploads generated variants and collects public URLs |
//! | [`sync`] | Writes image columns and the publish timestamp |
//! | [`cleanup`] | Removes temp variants and consumed sources |
//! | [`pipeline`] | Batch driver, per-image outcomes, dry-run check |
//! | [`config`] | `config.toml` loading, merging, validation; env credentials |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Capabilities Behind Traits
//!
//! The pipeline never talks to HTTP directly. It takes an [`imaging::ImageBackend`],
//! a [`records::RecordStore`] and an [`storage::ObjectStorage`]; production wires
//! one [`supabase::SupabaseClient`] into both network slots. Tests use a recording
//! mock codec and in-memory stores, so every failure path is exercised without a
//! network or real image encoding.
//!
//! ## The Correlation Key Is Consumed
//!
//! The filename lives in `image_standard`, and the `hero_1200` URL is written
//! to the same column. If `hero_1200` did not upload, the column is set to
//! `null` in the same update. A synchronized article therefore stops matching
//! its old filename, and a rerun with the same file reports "no matching
//! record" instead of republishing.
//!
//! ## Publishing With No Images
//!
//! When no variant uploads, the default `publish_policy = "always"` still
//! clears the key and sets the publish timestamp, but the image counts as
//! failed. `"require-images"` leaves such articles unpublished and matchable.

pub mod cleanup;
pub mod config;
pub mod imaging;
pub mod ladder;
pub mod locate;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod records;
pub mod storage;
pub mod supabase;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_helpers;
