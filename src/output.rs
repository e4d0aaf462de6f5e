//! CLI output formatting.
//!
//! Logs (via `tracing`) describe what the pipeline is doing; the lines built
//! here describe what it *did*, one block per image plus a closing summary.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! 001 robots-take-over.png
//!     Record: 7f3c
//!     Generated: 7 variants, 412.6 KB
//!     Uploaded: 6/7 (failed: hero_800)
//!     Columns: image_large, image_list, image_mobile, image_standard
//!     Published: 2026-10-16T08:30:00Z
//!     Result: published
//! 002 orphan.png
//!     Result: no matching record (file kept)
//!
//! Processing complete. 1/2 images processed successfully.
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 robots-take-over.png → 7f3c (robots-take-over)
//! 002 orphan.png → no matching record
//!
//! 1/2 images ready to process
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::ladder::VariantSpec;
use crate::pipeline::{BatchReport, CheckEntry, CheckStatus, ImageOutcome, ImageReport};
use chrono::SecondsFormat;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count (`812 B`, `48.2 KB`, `1.3 MB`).
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn outcome_text(outcome: &ImageOutcome) -> String {
    match outcome {
        ImageOutcome::Published => "published".to_string(),
        ImageOutcome::NoMatch => "no matching record (file kept)".to_string(),
        ImageOutcome::LookupFailed(e) => format!("record lookup failed (file kept): {e}"),
        ImageOutcome::DecodeFailed(e) => format!("could not decode (file kept): {e}"),
        ImageOutcome::NothingUploaded => "no variant uploaded".to_string(),
        ImageOutcome::Unpublished => "uploaded but left unpublished".to_string(),
        ImageOutcome::SyncFailed(e) => format!("record update failed: {e}"),
    }
}

// ============================================================================
// Run
// ============================================================================

/// Format the result block for one image.
pub fn format_image_report(index: usize, report: &ImageReport) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(index), report.file_name)];
    let pad = indent(1);

    if let Some(id) = &report.record_id {
        lines.push(format!("{pad}Record: {id}"));
    }

    if !report.generated.is_empty() {
        let bytes: usize = report.generated.iter().map(|v| v.size_bytes).sum();
        lines.push(format!(
            "{pad}Generated: {} variants, {}",
            report.generated.len(),
            format_size(bytes)
        ));
    }

    if !report.outcome.keeps_source() {
        let total = report.uploaded.len() + report.upload_failures.len();
        let mut failed: Vec<&str> = report.variant_failures.iter().map(String::as_str).collect();
        failed.extend(report.upload_failures.iter().map(String::as_str));
        let attempted = total + report.variant_failures.len();
        if failed.is_empty() {
            lines.push(format!("{pad}Uploaded: {}/{}", report.uploaded.len(), attempted));
        } else {
            lines.push(format!(
                "{pad}Uploaded: {}/{} (failed: {})",
                report.uploaded.len(),
                attempted,
                failed.join(", ")
            ));
        }
    }

    if !report.columns_written.is_empty() {
        lines.push(format!("{pad}Columns: {}", report.columns_written.join(", ")));
    }
    if let Some(at) = report.published_at {
        lines.push(format!(
            "{pad}Published: {}",
            at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }
    for path in &report.cleanup_failures {
        lines.push(format!("{pad}Not removed: {}", path.display()));
    }

    lines.push(format!("{pad}Result: {}", outcome_text(&report.outcome)));
    lines
}

/// Format the closing success count.
pub fn format_batch_summary(batch: &BatchReport) -> String {
    if batch.is_empty() {
        return "No pending images found.".to_string();
    }
    format!(
        "Processing complete. {}/{} images processed successfully.",
        batch.succeeded(),
        batch.attempted()
    )
}

pub fn format_batch_output(batch: &BatchReport) -> Vec<String> {
    let mut lines: Vec<String> = batch
        .images
        .iter()
        .enumerate()
        .flat_map(|(i, report)| format_image_report(i + 1, report))
        .collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format_batch_summary(batch));
    lines
}

pub fn print_batch_output(batch: &BatchReport) {
    for line in format_batch_output(batch) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(entries: &[CheckEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No pending images found.".to_string()];
    }

    let mut lines = Vec::new();
    let mut ready = 0;
    for (i, entry) in entries.iter().enumerate() {
        let target = match &entry.status {
            CheckStatus::Matched(record) => {
                ready += 1;
                match &record.slug {
                    Some(slug) => format!("{} ({})", record.id, slug),
                    None => record.id.clone(),
                }
            }
            CheckStatus::NoMatch => "no matching record".to_string(),
            CheckStatus::LookupFailed(e) => format!("lookup failed: {e}"),
        };
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            entry.file_name,
            target
        ));
    }
    lines.push(String::new());
    lines.push(format!("{}/{} images ready to process", ready, entries.len()));
    lines
}

pub fn print_check_output(entries: &[CheckEntry]) {
    for line in format_check_output(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Ladder
// ============================================================================

/// Format the size ladder as an aligned table.
///
/// ```text
/// hero_1600   1280x720  center-16:9    image_large
/// list_480     512x512  center-square  -
/// ```
pub fn format_ladder(ladder: &[VariantSpec]) -> Vec<String> {
    ladder
        .iter()
        .map(|spec| {
            format!(
                "{:<10} {:>9}  {:<13}  {}",
                spec.name,
                format!("{}x{}", spec.width, spec.height),
                spec.crop.label(),
                spec.column.unwrap_or("-")
            )
        })
        .collect()
}

pub fn print_ladder(ladder: &[VariantSpec]) {
    for line in format_ladder(ladder) {
        println!("{}", line);
    }
}
