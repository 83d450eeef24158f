//! Run orchestration: one pass over the input table.
//!
//! ## Preflight
//!
//! Before any record is touched the run loads the input table and the
//! ledger and checks that the listing page exists. Any failure here aborts
//! the run with a [`PipelineError`] and nothing is written.
//!
//! ## Per-record flow
//!
//! Records are handled one at a time, in input order:
//!
//! ```text
//! fingerprint ──seen──▶ Skipped(AlreadyProcessed)
//!      │
//!  seed empty ────────▶ Skipped(MissingSeed)        no generation calls
//!      │
//!  generate text ─err─▶ Skipped(TextFailed)
//!      │
//!  generate image ─err▶ Skipped(ImageFailed)
//!      │
//!  write image + post ─err─▶ Skipped(WriteFailed)   no ledger entry
//!      │
//!  splice card ──err──▶ ledger commit, Warned
//!      │
//!  ledger commit ─────▶ Committed
//! ```
//!
//! A record is committed to the ledger only after its post and image exist
//! on disk. A listing update failure does not block the commit: the post is
//! published, only its card is missing, and re-running would publish a
//! duplicate post. A ledger write failure aborts the run.
//!
//! Skipped records are retried on the next run.

use crate::artifacts::{ArtifactPaths, TIMESTAMP_FORMAT};
use crate::config::{ConfigError, SiteConfig};
use crate::gemini::GeminiClient;
use crate::generator::{GenerationError, ImageGenerator, TextGenerator};
use crate::input::{InputError, InputRecord, read_records};
use crate::ledger::{Fingerprint, Ledger, LedgerError, fingerprint};
use crate::render::{ListingCard, PostPage, render_card, render_post};
use crate::splice::{count_markers, splice_file};
use crate::text;
use chrono::{Datelike, Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Display format of the post date, e.g. "March 04, 2025".
pub const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("listing page not found: {0}")]
    ListingMissing(PathBuf),
    #[error("IO error reading listing page: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot set up generation client: {0}")]
    Client(#[from] GenerationError),
}

/// Source of the current local time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local time zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Why a record produced no post this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessed,
    MissingSeed,
    TextFailed(String),
    ImageFailed(String),
    WriteFailed(String),
}

impl SkipReason {
    /// Short label for report lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyProcessed => "already processed",
            Self::MissingSeed => "no seed text",
            Self::TextFailed(_) => "text generation failed",
            Self::ImageFailed(_) => "image generation failed",
            Self::WriteFailed(_) => "write failed",
        }
    }

    /// Underlying error message, for the failure variants.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::TextFailed(d) | Self::ImageFailed(d) | Self::WriteFailed(d) => Some(d),
            Self::AlreadyProcessed | Self::MissingSeed => None,
        }
    }
}

/// A post that made it to disk and into the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub title: String,
    pub summary: String,
    /// Site-root-relative path of the post page.
    pub post_path: String,
    /// Site-root-relative path of the hero image.
    pub image_path: String,
    pub post_url: String,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Skipped(SkipReason),
    Committed(PublishedPost),
    /// Published and committed, but the listing page was not updated.
    Warned(PublishedPost, String),
}

impl RecordOutcome {
    pub fn published(&self) -> Option<&PublishedPost> {
        match self {
            Self::Committed(post) | Self::Warned(post, _) => Some(post),
            Self::Skipped(_) => None,
        }
    }
}

/// One record's result, in input order.
#[derive(Debug, Clone)]
pub struct RecordResult {
    pub record: InputRecord,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<RecordResult>,
}

impl RunReport {
    pub fn published(&self) -> impl Iterator<Item = &PublishedPost> {
        self.results.iter().filter_map(|r| r.outcome.published())
    }

    pub fn published_count(&self) -> usize {
        self.published().count()
    }

    pub fn warned_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Warned(..)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Skipped(_)))
            .count()
    }

    /// Skips that a re-run could fix (everything but already-processed and no-seed).
    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| {
                matches!(
                    &r.outcome,
                    RecordOutcome::Skipped(reason) if reason.detail().is_some()
                )
            })
            .count()
    }
}

/// Run the pipeline against the live generation services.
pub fn run(config: &SiteConfig, root: &Path) -> Result<RunReport, PipelineError> {
    let api_key = config.validate_for_run()?;
    let client = GeminiClient::new(api_key, &config.generation)?;
    run_with_generators(&client, &client, &SystemClock, config, root)
}

/// Run the pipeline with explicit generators and clock (allows testing with fakes).
pub fn run_with_generators(
    text_gen: &dyn TextGenerator,
    image_gen: &dyn ImageGenerator,
    clock: &dyn Clock,
    config: &SiteConfig,
    root: &Path,
) -> Result<RunReport, PipelineError> {
    config.validate()?;
    let (records, mut ledger) = preflight(config, root)?;
    info!(
        records = records.len(),
        processed = ledger.len(),
        "starting run"
    );

    let publisher = Publisher {
        text_gen,
        image_gen,
        clock,
        config,
        root,
    };
    let mut report = RunReport::default();
    for record in records {
        let outcome = publisher.publish(&record, &mut ledger)?;
        report.results.push(RecordResult { record, outcome });
    }

    info!(
        published = report.published_count(),
        warned = report.warned_count(),
        skipped = report.skipped_count(),
        "run finished"
    );
    Ok(report)
}

fn preflight(config: &SiteConfig, root: &Path) -> Result<(Vec<InputRecord>, Ledger), PipelineError> {
    let records = read_records(&root.join(&config.paths.input))?;
    let ledger = Ledger::load(&root.join(&config.paths.ledger))?;
    let listing = root.join(&config.paths.listing);
    if !listing.is_file() {
        return Err(PipelineError::ListingMissing(listing));
    }
    Ok((records, ledger))
}

/// Per-record state shared across one run.
struct Publisher<'a> {
    text_gen: &'a dyn TextGenerator,
    image_gen: &'a dyn ImageGenerator,
    clock: &'a dyn Clock,
    config: &'a SiteConfig,
    root: &'a Path,
}

impl Publisher<'_> {
    fn publish(
        &self,
        record: &InputRecord,
        ledger: &mut Ledger,
    ) -> Result<RecordOutcome, PipelineError> {
        let row = record.row + 1;
        let fp = fingerprint(record);
        if ledger.contains(&fp) {
            info!(row, fingerprint = fp.short(), "already processed, skipping");
            return Ok(RecordOutcome::Skipped(SkipReason::AlreadyProcessed));
        }
        if record.seed.is_empty() {
            info!(row, "no seed text, skipping");
            return Ok(RecordOutcome::Skipped(SkipReason::MissingSeed));
        }

        let keyword = text::keyword(&record.seed, record.image_hint.as_deref());
        info!(row, keyword = %keyword, "generating post");

        let prose = match self.text_gen.generate_text(&keyword, &record.seed) {
            Ok(raw) => text::split_summary(&raw),
            Err(e) => {
                warn!(row, error = %e, "text generation failed, skipping");
                return Ok(RecordOutcome::Skipped(SkipReason::TextFailed(e.to_string())));
            }
        };
        let image = match self.image_gen.generate_image(&keyword) {
            Ok(image) => image,
            Err(e) => {
                warn!(row, error = %e, "image generation failed, skipping");
                return Ok(RecordOutcome::Skipped(SkipReason::ImageFailed(e.to_string())));
            }
        };

        let now = self.clock.now();
        let title = text::title_case(&keyword);
        let stem = format!(
            "{}-{}",
            now.format(TIMESTAMP_FORMAT),
            text::sanitize_slug(&keyword)
        );
        let paths = ArtifactPaths::allocate(
            self.root,
            &self.config.paths.posts_dir,
            &self.config.paths.images_dir,
            &stem,
            image.extension,
        );
        let date = now.format(DATE_FORMAT).to_string();
        let base_url = self.config.base_url();
        let image_url = self.config.public_url(&paths.image);
        let post_url = self.config.public_url(&paths.post);
        let listing_file = self.config.paths.listing.to_string_lossy().replace('\\', "/");

        let page = render_post(&PostPage {
            title: &title,
            body: &prose.body,
            image_url: &image_url,
            cta_link: record.link.as_deref(),
            author: &self.config.site.author,
            date: &date,
            year: now.year(),
            brand: &self.config.site.brand,
            base_url: &base_url,
            listing_file: &listing_file,
        });
        if let Err(e) = paths.write(self.root, &image.bytes, &page) {
            warn!(row, error = %e, "writing post failed, skipping");
            return Ok(RecordOutcome::Skipped(SkipReason::WriteFailed(e.to_string())));
        }
        info!(row, post = %paths.post, image = %paths.image, "post written");

        let card = render_card(&ListingCard {
            title: &title,
            summary: &prose.summary,
            image_url: &image_url,
            post_url: &post_url,
            cta_link: record.link.as_deref(),
            author: &self.config.site.author,
            date: &date,
        });
        let spliced = splice_file(
            &self.root.join(&self.config.paths.listing),
            &card,
            self.config.listing.anchor(),
        );

        ledger.mark_processed(&fp)?;

        let post = PublishedPost {
            title,
            summary: prose.summary,
            post_path: paths.post,
            image_path: paths.image,
            post_url,
            fingerprint: fp,
        };
        Ok(match spliced {
            Ok(()) => {
                info!(row, url = %post.post_url, "published");
                RecordOutcome::Committed(post)
            }
            Err(e) => {
                warn!(row, error = %e, "post published but listing page not updated");
                RecordOutcome::Warned(post, e.to_string())
            }
        })
    }
}

// =============================================================================
// Dry run
// =============================================================================

/// What a run would do with a record, decided without generating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    Pending,
    AlreadyProcessed,
    MissingSeed,
}

#[derive(Debug, Clone)]
pub struct PlannedRecord {
    pub record: InputRecord,
    pub fingerprint: Fingerprint,
    pub status: PlanStatus,
}

/// Result of [`plan`]: per-record status plus listing page health.
#[derive(Debug, Clone)]
pub struct Plan {
    pub records: Vec<PlannedRecord>,
    pub ledger_entries: usize,
    pub listing: PathBuf,
    /// Occurrences of the insertion marker. Anything but 1 means cards can't be added.
    pub marker_count: usize,
}

impl Plan {
    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == PlanStatus::Pending)
            .count()
    }
}

/// Classify every record as a run would, without calling generators or writing.
///
/// Needs no API key.
pub fn plan(config: &SiteConfig, root: &Path) -> Result<Plan, PipelineError> {
    config.validate()?;
    let (records, ledger) = preflight(config, root)?;
    let listing = root.join(&config.paths.listing);
    let marker_count = count_markers(&fs::read_to_string(&listing)?, config.listing.anchor());

    let records = records
        .into_iter()
        .map(|record| {
            let fp = fingerprint(&record);
            let status = if ledger.contains(&fp) {
                PlanStatus::AlreadyProcessed
            } else if record.seed.is_empty() {
                PlanStatus::MissingSeed
            } else {
                PlanStatus::Pending
            };
            PlannedRecord {
                record,
                fingerprint: fp,
                status,
            }
        })
        .collect();

    Ok(Plan {
        records,
        ledger_entries: ledger.len(),
        listing,
        marker_count,
    })
}
