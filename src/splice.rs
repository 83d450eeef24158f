//! Listing page updates by anchored text insertion.
//!
//! The listing page is hand-authored HTML. Rather than parse and re-serialize
//! it (which would reformat the author's markup), new cards are inserted as
//! text at a single fixed [`Anchor`]: an exact marker string plus a placement
//! before or after it.
//!
//! The marker must occur **exactly once**. Zero matches means the page
//! structure changed; two or more means the insertion point is ambiguous.
//! Both are errors, and the document is left untouched: guessing would risk
//! writing cards into the middle of the author's layout.
//!
//! Updates are whole-document: read everything, build the new text in
//! memory, write everything back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("listing page not found: {0}")]
    ListingMissing(PathBuf),
    #[error("insertion marker not found in listing page")]
    MarkerMissing,
    #[error("insertion marker found {count} times in listing page, expected exactly once")]
    MarkerAmbiguous { count: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which side of the marker new entries go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Insert just before the marker. Entries accumulate oldest first.
    Before,
    /// Insert just after the marker. Entries accumulate newest first.
    After,
}

/// Fixed insertion point in the listing page.
#[derive(Debug, Clone, Copy)]
pub struct Anchor<'a> {
    pub marker: &'a str,
    pub placement: Placement,
}

/// Count occurrences of the anchor's marker in a document.
///
/// Matches are non-overlapping, same as [`str::matches`].
pub fn count_markers(document: &str, anchor: Anchor<'_>) -> usize {
    if anchor.marker.is_empty() {
        return 0;
    }
    document.matches(anchor.marker).count()
}

/// Insert `entry` into `document` at the anchor.
///
/// Every byte of `document` outside the insertion point is copied verbatim.
pub fn splice(document: &str, entry: &str, anchor: Anchor<'_>) -> Result<String, SpliceError> {
    let mut positions = document.match_indices(anchor.marker).map(|(pos, _)| pos);
    let pos = match (anchor.marker.is_empty(), positions.next()) {
        (false, Some(pos)) => pos,
        _ => return Err(SpliceError::MarkerMissing),
    };
    let extra = positions.count();
    if extra > 0 {
        return Err(SpliceError::MarkerAmbiguous { count: extra + 1 });
    }

    let at = match anchor.placement {
        Placement::Before => pos,
        Placement::After => pos + anchor.marker.len(),
    };
    let mut out = String::with_capacity(document.len() + entry.len());
    out.push_str(&document[..at]);
    out.push_str(entry);
    out.push_str(&document[at..]);
    Ok(out)
}

/// Read the listing page, splice `entry` in, and write it back.
///
/// The file is only written after the splice succeeded in memory, so a
/// marker error leaves it untouched.
pub fn splice_file(path: &Path, entry: &str, anchor: Anchor<'_>) -> Result<(), SpliceError> {
    let document = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SpliceError::ListingMissing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let updated = splice(&document, entry, anchor)?;
    fs::write(path, updated)?;
    Ok(())
}
