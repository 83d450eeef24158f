//! Shared test utilities for the rowpress test suite.
//!
//! Provides an isolated copy of the fixture site, a fixed clock, and
//! recording fake generators.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_site();
//! let text_gen = FakeText::ok();
//! let report = run_with_generators(
//!     &text_gen, &FakeImage::ok(), &FixedClock::default(), &site.config, site.root(),
//! ).unwrap();
//!
//! assert_eq!(text_gen.topics(), vec!["Great new gadget review", "smart-home"]);
//! assert!(site.read("blog.html").contains("Automated Blog Post Card"));
//! ```

use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::generator::{GeneratedImage, GenerationError, ImageGenerator, TextGenerator};
use crate::pipeline::Clock;
use chrono::{NaiveDate, NaiveDateTime};

/// Smallest byte string `image::guess_format` recognizes as PNG.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Generated text used by [`FakeText::ok`].
pub const FAKE_POST: &str = "A crisp summary.\n\n## Details\n\nBody text with *emphasis*.";

// =========================================================================
// Fixture setup
// =========================================================================

/// A temp copy of `fixtures/site/` plus a config pointing at it.
pub struct Site {
    pub dir: TempDir,
    pub config: SiteConfig,
}

impl Site {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root().join(rel)).unwrap()
    }

    pub fn read_bytes(&self, rel: &str) -> Vec<u8> {
        std::fs::read(self.root().join(rel)).unwrap()
    }

    pub fn write(&self, rel: &str, content: &str) {
        std::fs::write(self.root().join(rel), content).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        std::fs::create_dir_all(self.root().join(rel)).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.root().join(rel)).unwrap();
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }

    /// Sorted file names in a directory; empty when it doesn't exist.
    pub fn list(&self, rel: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.root().join(rel)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Copy `fixtures/site/` to a temp directory, configured for `acme/site`.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site() -> Site {
    let dir = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, dir.path()).unwrap();
    let mut config = SiteConfig::default();
    config.site.owner = "acme".to_string();
    config.site.repo = "site".to_string();
    Site { dir, config }
}

/// [`setup_site`] with the input table replaced by `csv`.
pub fn setup_site_with_csv(csv: &str) -> Site {
    let site = setup_site();
    site.write("blog.csv", csv);
    site
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Fakes
// =========================================================================

/// Always returns the same instant: 2025-03-04 10:15:00.
pub struct FixedClock(pub NaiveDateTime);

impl Default for FixedClock {
    fn default() -> Self {
        Self(
            NaiveDate::from_ymd_opt(2025, 3, 4)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Text generator that records every topic it is asked for.
pub struct FakeText {
    response: Result<String, String>,
    topics: Mutex<Vec<String>>,
}

impl FakeText {
    pub fn ok() -> Self {
        Self::returning(FAKE_POST)
    }

    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            topics: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err("quota exceeded".to_string()),
            topics: Mutex::new(Vec::new()),
        }
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }
}

impl TextGenerator for FakeText {
    fn generate_text(&self, topic: &str, _seed: &str) -> Result<String, GenerationError> {
        self.topics.lock().unwrap().push(topic.to_string());
        self.response.clone().map_err(|body| GenerationError::Status {
            status: 429,
            body,
        })
    }
}

/// Image generator that records every topic it is asked for.
pub struct FakeImage {
    fail: bool,
    topics: Mutex<Vec<String>>,
}

impl FakeImage {
    pub fn ok() -> Self {
        Self {
            fail: false,
            topics: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            topics: Mutex::new(Vec::new()),
        }
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }
}

impl ImageGenerator for FakeImage {
    fn generate_image(&self, topic: &str) -> Result<GeneratedImage, GenerationError> {
        self.topics.lock().unwrap().push(topic.to_string());
        if self.fail {
            return Err(GenerationError::Unusable(
                "image response missing image data".into(),
            ));
        }
        GeneratedImage::from_bytes(PNG_BYTES.to_vec())
    }
}
