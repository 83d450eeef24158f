//! # Rowpress
//!
//! Turns rows of a CSV file into blog posts for a static site. Each new row
//! becomes an AI-written Markdown article with a generated hero image,
//! rendered to a standalone HTML page, and announced by a card spliced into
//! the site's hand-written listing page.
//!
//! # Architecture: One Pass, One Record at a Time
//!
//! A run reads the input table and the ledger of already-published rows,
//! then walks the rows in order:
//!
//! ```text
//! row  →  fingerprint  →  generate text + image  →  write post + image
//!                                                →  splice listing card
//!                                                →  append fingerprint to ledger
//! ```
//!
//! The ledger makes runs idempotent: a row is identified by a SHA-256 of its
//! label, seed text and link, and a row whose fingerprint is in the ledger is
//! never generated again. Rows that fail (service error, bad image, write
//! error) are not recorded and get retried on the next run. The whole thing
//! is designed to be run by a scheduled CI job that commits the results.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrator: preflight, per-record decision flow, dry-run planning |
//! | [`input`] | CSV input table reading with header-based column lookup |
//! | [`ledger`] | Record fingerprints and the append-only processed ledger |
//! | [`generator`] | Text/image generation traits and prompts |
//! | [`gemini`] | Blocking client for the Gemini and Imagen HTTP endpoints |
//! | [`text`] | Keyword, title, summary split, emoji stripping, slugs |
//! | [`render`] | Post page and listing card HTML via Maud |
//! | [`splice`] | Marker-anchored insertion into the listing page |
//! | [`artifacts`] | Collision-free post/image naming and cleanup-on-failure writes |
//! | [`config`] | `rowpress.toml` loading, environment overlay, validation |
//! | [`output`] | CLI output formatting for run reports and dry-run plans |
//!
//! # Design Decisions
//!
//! ## Text Splicing Over HTML Rewriting
//!
//! The listing page belongs to the site author. Parsing and re-serializing it
//! would normalize whitespace, attribute order and entities on every run,
//! producing noisy diffs. Instead [`splice`] inserts the card as text at a
//! single configured marker and copies every other byte verbatim. A missing
//! or duplicated marker is an error rather than a guess.
//!
//! ## Commit After Write
//!
//! A fingerprint is appended to the ledger only after the post and image are
//! on disk, and each append is synced before the next record starts. A crash
//! mid-run therefore loses at most the record in flight, which is regenerated
//! next time. A listing update failure is only a warning: the post exists,
//! and regenerating it would publish a duplicate.
//!
//! ## Generators Behind Traits
//!
//! [`pipeline::run_with_generators`] takes `&dyn TextGenerator` and
//! `&dyn ImageGenerator`, so the whole decision flow is tested with recording
//! fakes and a fixed clock, without network access.

pub mod artifacts;
pub mod config;
pub mod gemini;
pub mod generator;
pub mod input;
pub mod ledger;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod splice;
pub mod text;

#[cfg(test)]
pub(crate) mod test_helpers;
