//! CLI output formatting for `run` and `check`.
//!
//! # Information-First Display
//!
//! Output is **record-centric, not file-centric**. Every input row is shown
//! by its 1-based row index and what it is about (the post title once
//! published, otherwise its topic keyword). File paths and error details are
//! secondary context on indented lines.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! 001 Great New Gadget Review → posts/20250304101500-great-new-gadget-review.html
//!     Image: images/20250304101500-great-new-gadget-review.png
//! 002 (no seed) skipped: no seed text
//! 003 Smart Home → posts/20250304101500-smart-home.html
//!     Image: images/20250304101500-smart-home.png
//!     Warning: insertion marker not found in listing page
//! 004 gadgets skipped: text generation failed
//!     Error: service returned 429: quota exceeded
//!
//! Published 2 posts (1 with warnings), skipped 2 rows (1 failed)
//! ```
//!
//! ## Check
//!
//! ```text
//! Listing
//!     blog.html (marker found)
//! Ledger
//!     2 entries
//! Rows
//! 001 Great new gadget review: pending
//! 002 (no seed): no seed text
//! 003 smart-home: already processed
//!
//! 1 pending, 1 already processed, 1 without seed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::input::InputRecord;
use crate::pipeline::{Plan, PlanStatus, RecordOutcome, RunReport};
use crate::text;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// What an unpublished row is about: its keyword, or `(no seed)`.
fn record_topic(record: &InputRecord) -> String {
    let keyword = text::keyword(&record.seed, record.image_hint.as_deref());
    if keyword.is_empty() {
        "(no seed)".to_string()
    } else {
        keyword
    }
}

/// `1 post`, `2 posts`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

// ============================================================================
// Run output
// ============================================================================

/// Format the per-record results and totals of a run.
pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();

    for result in &report.results {
        let index = format_index(result.record.row + 1);
        match &result.outcome {
            RecordOutcome::Committed(post) | RecordOutcome::Warned(post, _) => {
                lines.push(format!("{} {} \u{2192} {}", index, post.title, post.post_path));
                lines.push(format!("{}Image: {}", indent(1), post.image_path));
                if let RecordOutcome::Warned(_, reason) = &result.outcome {
                    lines.push(format!("{}Warning: {}", indent(1), reason));
                }
            }
            RecordOutcome::Skipped(reason) => {
                lines.push(format!(
                    "{} {} skipped: {}",
                    index,
                    record_topic(&result.record),
                    reason.label()
                ));
                if let Some(detail) = reason.detail() {
                    lines.push(format!("{}Error: {}", indent(1), detail));
                }
            }
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }

    let mut summary = format!("Published {}", plural(report.published_count(), "post"));
    let warned = report.warned_count();
    if warned > 0 {
        summary.push_str(&format!(" ({} with warnings)", warned));
    }
    summary.push_str(&format!(", skipped {}", plural(report.skipped_count(), "row")));
    let failed = report.failed_count();
    if failed > 0 {
        summary.push_str(&format!(" ({} failed)", failed));
    }
    lines.push(summary);

    lines
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format a dry-run plan: listing health, ledger size, and per-row status.
pub fn format_plan(plan: &Plan, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    let listing = plan
        .listing
        .strip_prefix(root)
        .unwrap_or(&plan.listing)
        .display();
    let marker = match plan.marker_count {
        0 => "marker missing".to_string(),
        1 => "marker found".to_string(),
        n => format!("marker found {} times", n),
    };
    lines.push("Listing".to_string());
    lines.push(format!("{}{} ({})", indent(1), listing, marker));

    lines.push("Ledger".to_string());
    let entries = match plan.ledger_entries {
        1 => "1 entry".to_string(),
        n => format!("{} entries", n),
    };
    lines.push(format!("{}{}", indent(1), entries));

    lines.push("Rows".to_string());
    let (mut pending, mut processed, mut no_seed) = (0, 0, 0);
    for planned in &plan.records {
        let status = match planned.status {
            PlanStatus::Pending => {
                pending += 1;
                "pending"
            }
            PlanStatus::AlreadyProcessed => {
                processed += 1;
                "already processed"
            }
            PlanStatus::MissingSeed => {
                no_seed += 1;
                "no seed text"
            }
        };
        lines.push(format!(
            "{} {}: {}",
            format_index(planned.record.row + 1),
            record_topic(&planned.record),
            status
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} pending, {} already processed, {} without seed",
        pending, processed, no_seed
    ));

    lines
}

pub fn print_plan(plan: &Plan, root: &Path) {
    for line in format_plan(plan, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
