//! Record fingerprints and the processed-record ledger.
//!
//! # Fingerprints
//!
//! A [`Fingerprint`] is the SHA-256 of `"{label}-{seed}-{link}"`, hex encoded,
//! taken over the record's raw [`SourceCells`]. Only these three fields take
//! part, so a row that is re-submitted with a different timestamp column (or
//! image hint) is still recognized as the same logical record.
//!
//! The cells are hashed untrimmed, with empty and NA cells spelled `nan`, which
//! is how earlier versions of the blog automation wrote `processed_posts.txt`.
//! Cells that such tooling would have read as numbers (a label of `1` becoming
//! `1.0`, say) are not reinterpreted, so those rows hash differently.
//!
//! # Ledger
//!
//! The ledger is a text file with one fingerprint per line. It is:
//!
//! - **loaded once** per run, an absent file meaning "nothing processed yet";
//! - **appended per record**, right after that record's post page has been
//!   written, so a crash mid-run never loses a committed record and never
//!   records one whose page doesn't exist.
//!
//! Lines that aren't a well-formed fingerprint are skipped on load. A ledger
//! that exists but can't be read is an error, not an empty set: treating it as
//! empty would regenerate every historical post.

use crate::input::{InputRecord, SourceCells};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger {0} is not valid UTF-8 text")]
    Corrupt(PathBuf),
}

/// Length of a hex-encoded SHA-256 digest.
const FINGERPRINT_LEN: usize = 64;

/// Stable identity of an input record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse a ledger line. Returns `None` for anything that isn't 64 hex digits.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        (token.len() == FINGERPRINT_LEN && token.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| Self(token.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint of a record's stable fields: label, seed and link.
pub fn fingerprint(record: &InputRecord) -> Fingerprint {
    let SourceCells { label, seed, link } = &record.source;
    let unique = format!("{label}-{seed}-{link}");
    let digest = Sha256::digest(unique.as_bytes());
    Fingerprint(format!("{:x}", digest))
}

/// Set of fingerprints whose posts have been published.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    entries: HashSet<Fingerprint>,
}

impl Ledger {
    /// Load the ledger at `path`. A missing file gives an empty ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(LedgerError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let content =
            String::from_utf8(bytes).map_err(|_| LedgerError::Corrupt(path.to_path_buf()))?;
        let entries = content.lines().filter_map(Fingerprint::parse).collect();
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.entries.contains(fp)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Durably record `fp` as processed.
    ///
    /// Returns `Ok(false)` without touching the file when `fp` is already
    /// recorded. The line is flushed and synced before returning.
    pub fn mark_processed(&mut self, fp: &Fingerprint) -> Result<bool, LedgerError> {
        if self.entries.contains(fp) {
            return Ok(false);
        }
        self.append_line(fp).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.entries.insert(fp.clone());
        Ok(true)
    }

    fn append_line(&self, fp: &Fingerprint) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // A hand-edited ledger may lack a trailing newline; don't glue onto its last line.
        let needs_newline = file.metadata()?.len() > 0 && !ends_with_newline(&self.path)?;
        let mut line = String::with_capacity(FINGERPRINT_LEN + 2);
        if needs_newline {
            line.push('\n');
        }
        line.push_str(fp.as_str());
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.sync_data()
    }
}

fn ends_with_newline(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read(path)?.last() == Some(&b'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(label: &str, seed: &str, link: Option<&str>) -> InputRecord {
        InputRecord {
            row: 0,
            label: label.into(),
            seed: seed.into(),
            link: link.map(String::from),
            image_hint: None,
            source: SourceCells {
                label: label.into(),
                seed: seed.into(),
                link: link.unwrap_or("nan").into(),
            },
        }
    }

    fn hex(input: &str) -> String {
        format!("{:x}", Sha256::digest(input.as_bytes()))
    }

    // =========================================================================
    // Fingerprints
    // =========================================================================

    #[test]
    fn fingerprint_deterministic() {
        let a = record("tech", "Great new gadget review.", Some("https://example.com/x"));
        let b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).as_str().len(), 64);
    }

    #[test]
    fn fingerprint_ignores_row_and_image_hint() {
        let a = record("tech", "Seed.", Some("https://example.com/x"));
        let mut b = a.clone();
        b.row = 42;
        b.image_hint = Some("gadgets".into());
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_varies_with_each_stable_field() {
        let base = record("tech", "Seed.", Some("https://example.com/x"));
        let fp = fingerprint(&base);
        assert_ne!(fp, fingerprint(&record("food", "Seed.", Some("https://example.com/x"))));
        assert_ne!(fp, fingerprint(&record("tech", "Other.", Some("https://example.com/x"))));
        assert_ne!(fp, fingerprint(&record("tech", "Seed.", Some("https://example.com/y"))));
    }

    #[test]
    fn fingerprint_matches_existing_ledger_lines() {
        let csv = "Platform,Text,Hyperlink,images\n\
                   tech,Great new gadget review.,https://example.com/x,gadgets/\n\
                   tech,Seed.,,\n\
                   \x20tech,Seed. ,NULL,\n";
        let fps: Vec<String> = crate::input::parse_records(csv)
            .unwrap()
            .iter()
            .map(|r| fingerprint(r).to_string())
            .collect();
        assert_eq!(
            fps,
            vec![
                hex("tech-Great new gadget review.-https://example.com/x"),
                hex("tech-Seed.-nan"),
                hex(" tech-Seed. -nan"),
            ]
        );
    }

    #[test]
    fn fingerprint_absent_link_column_hashes_as_empty() {
        let records = crate::input::parse_records("Platform,Text\ntech,Seed.\n").unwrap();
        assert_eq!(fingerprint(&records[0]).as_str(), hex("tech-Seed.-"));
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        assert!(Fingerprint::parse("abc").is_none());
        assert!(Fingerprint::parse(&"g".repeat(64)).is_none());
        assert!(Fingerprint::parse("").is_none());
        let upper = "A".repeat(64);
        assert_eq!(Fingerprint::parse(&upper).unwrap().as_str(), "a".repeat(64));
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    #[test]
    fn load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::load(&tmp.path().join("processed_posts.txt")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn load_skips_malformed_and_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("processed_posts.txt");
        let good = fingerprint(&record("tech", "Seed.", None));
        fs::write(&path, format!("\n  {good}  \nnot-a-hash\n\n")).unwrap();

        let ledger = Ledger::load(&path).unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(&good));
    }

    #[test]
    fn load_non_utf8_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("processed_posts.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();
        assert!(matches!(Ledger::load(&path), Err(LedgerError::Corrupt(_))));
    }

    #[test]
    fn load_unreadable_path_is_error() {
        let tmp = TempDir::new().unwrap();
        // A directory where the file should be
        let path = tmp.path().join("processed_posts.txt");
        fs::create_dir(&path).unwrap();
        assert!(matches!(Ledger::load(&path), Err(LedgerError::Io { .. })));
    }

    #[test]
    fn mark_processed_appends_and_survives_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("processed_posts.txt");
        let fp = fingerprint(&record("tech", "Seed.", None));

        let mut ledger = Ledger::load(&path).unwrap();
        assert!(ledger.mark_processed(&fp).unwrap());
        assert!(ledger.contains(&fp));

        let reloaded = Ledger::load(&path).unwrap();
        assert!(reloaded.contains(&fp));
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{fp}\n"));
    }

    #[test]
    fn mark_processed_twice_writes_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("processed_posts.txt");
        let fp = fingerprint(&record("tech", "Seed.", None));

        let mut ledger = Ledger::load(&path).unwrap();
        assert!(ledger.mark_processed(&fp).unwrap());
        assert!(!ledger.mark_processed(&fp).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn mark_processed_preserves_existing_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("processed_posts.txt");
        let old = fingerprint(&record("a", "Old.", None));
        let new = fingerprint(&record("b", "New.", None));
        // No trailing newline on the existing ledger
        fs::write(&path, old.as_str()).unwrap();

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.mark_processed(&new).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{old}\n{new}\n"));
    }

    #[test]
    fn mark_processed_creates_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state/processed_posts.txt");
        let fp = fingerprint(&record("tech", "Seed.", None));

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.mark_processed(&fp).unwrap();
        assert!(path.exists());
    }
}
