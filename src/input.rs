//! Input table reading.
//!
//! The input is a CSV file with a header row. Four columns are recognized,
//! matched case-insensitively after trimming:
//!
//! | Column | Field | Required |
//! |---|---|---|
//! | `Platform` | [`InputRecord::label`] | no |
//! | `Text` | [`InputRecord::seed`] | yes (the column; cells may be empty) |
//! | `Hyperlink` | [`InputRecord::link`] | no |
//! | `images` | [`InputRecord::image_hint`] | no |
//!
//! Every other column (such as a `Time` column written by the tool that
//! fills the sheet) is ignored. Cell values are trimmed. Short rows are
//! accepted; missing cells read as empty.
//!
//! The untrimmed label, seed and link cells are also kept in
//! [`InputRecord::source`], spelled the way earlier tooling spelled them when
//! it fingerprinted rows (see [`SourceCells`]).

use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("input table not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("input table has no '{0}' column")]
    MissingColumn(&'static str),
}

pub const COLUMN_LABEL: &str = "Platform";
pub const COLUMN_SEED: &str = "Text";
pub const COLUMN_LINK: &str = "Hyperlink";
pub const COLUMN_IMAGE_HINT: &str = "images";

/// Cells that spreadsheet tooling reads as "not available" rather than as text.
const NA_CELLS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Spelling of a missing or NA cell in fingerprint input.
const NA_SPELLING: &str = "nan";

/// The identity cells of a row, exactly as ledgers have always hashed them.
///
/// Values are not trimmed. A present column whose cell is empty, missing from
/// a short row, or one of the usual NA spellings reads as `"nan"`. A column
/// the table doesn't have at all reads as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceCells {
    pub label: String,
    pub seed: String,
    pub link: String,
}

/// One row of the input table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputRecord {
    /// 0-based data row index (header excluded).
    pub row: usize,
    /// Platform/category label.
    pub label: String,
    /// Free-text seed the post is written from. Empty means the row is skipped.
    pub seed: String,
    /// Affiliate/reference link, if any.
    pub link: Option<String>,
    /// Image category hint, used as the post keyword when present.
    pub image_hint: Option<String>,
    /// Raw identity cells, the input to [`fingerprint`](crate::ledger::fingerprint).
    pub source: SourceCells,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    label: Option<usize>,
    seed: usize,
    link: Option<usize>,
    image_hint: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self, InputError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Ok(Self {
            label: find(COLUMN_LABEL),
            seed: find(COLUMN_SEED).ok_or(InputError::MissingColumn(COLUMN_SEED))?,
            link: find(COLUMN_LINK),
            image_hint: find(COLUMN_IMAGE_HINT),
        })
    }

    fn record(&self, row: usize, cells: &StringRecord) -> InputRecord {
        let cell = |idx: Option<usize>| -> String {
            idx.and_then(|i| cells.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let optional = |idx: Option<usize>| Some(cell(idx)).filter(|s| !s.is_empty());
        let raw = |idx: Option<usize>| -> String {
            match idx {
                None => String::new(),
                Some(i) => match cells.get(i) {
                    Some(s) if !NA_CELLS.contains(&s) => s.to_string(),
                    _ => NA_SPELLING.to_string(),
                },
            }
        };
        InputRecord {
            row,
            label: cell(self.label),
            seed: cell(Some(self.seed)),
            link: optional(self.link),
            image_hint: optional(self.image_hint),
            source: SourceCells {
                label: raw(self.label),
                seed: raw(Some(self.seed)),
                link: raw(self.link),
            },
        }
    }
}

/// Parse CSV text into records, in file order.
pub fn parse_records(content: &str) -> Result<Vec<InputRecord>, InputError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(content.as_bytes());
    let columns = Columns::from_header(reader.headers()?)?;
    reader
        .records()
        .enumerate()
        .map(|(row, cells)| Ok(columns.record(row, &cells?)))
        .collect()
}

/// Read the input table at `path`.
pub fn read_records(path: &Path) -> Result<Vec<InputRecord>, InputError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InputError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    parse_records(content.trim_start_matches('\u{feff}'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_recognized_columns() {
        let csv = "Platform,Text,Hyperlink,images\n\
                   tech,Great new gadget review.,https://example.com/x,gadgets/\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(
            records,
            vec![InputRecord {
                row: 0,
                label: "tech".into(),
                seed: "Great new gadget review.".into(),
                link: Some("https://example.com/x".into()),
                image_hint: Some("gadgets/".into()),
                source: SourceCells {
                    label: "tech".into(),
                    seed: "Great new gadget review.".into(),
                    link: "https://example.com/x".into(),
                },
            }]
        );
    }

    #[test]
    fn source_cells_keep_whitespace_and_spell_na_as_nan() {
        let csv = "Platform,Text,Hyperlink
 tech ,Seed. ,N/A
NULL,Other.
";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].label, "tech");
        assert_eq!(records[0].link, Some("N/A".into()));
        assert_eq!(
            records[0].source,
            SourceCells {
                label: " tech ".into(),
                seed: "Seed. ".into(),
                link: "nan".into(),
            }
        );
        // NA spelling in a present cell, and a cell missing from a short row.
        assert_eq!(records[1].source.label, "nan");
        assert_eq!(records[1].source.link, "nan");
    }

    #[test]
    fn source_cells_for_absent_column_are_empty() {
        let records = parse_records("Text
Seed.
").unwrap();
        assert_eq!(
            records[0].source,
            SourceCells {
                label: String::new(),
                seed: "Seed.".into(),
                link: String::new(),
            }
        );
    }

    #[test]
    fn ignores_unknown_columns_and_header_case() {
        let csv = "time,PLATFORM, text ,extra\n2025-01-01 10:00,tech,Hello there.,junk\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].label, "tech");
        assert_eq!(records[0].seed, "Hello there.");
        assert_eq!(records[0].link, None);
        assert_eq!(records[0].image_hint, None);
    }

    #[test]
    fn quoted_cells_with_commas_and_newlines() {
        let csv = "Platform,Text\nblog,\"One, two.\nThree.\"\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].seed, "One, two.\nThree.");
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let csv = "Platform,Text,Hyperlink\ntech\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].seed, "");
        assert_eq!(records[0].link, None);
    }

    #[test]
    fn blank_cells_become_none() {
        let csv = "Platform,Text,Hyperlink,images\ntech,Seed.,  ,\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].link, None);
        assert_eq!(records[0].image_hint, None);
    }

    #[test]
    fn row_indices_follow_file_order() {
        let csv = "Text\na\nb\nc\n";
        let rows: Vec<usize> = parse_records(csv).unwrap().iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn missing_text_column_is_error() {
        let result = parse_records("Platform,Hyperlink\ntech,https://x\n");
        assert!(matches!(result, Err(InputError::MissingColumn("Text"))));
    }

    #[test]
    fn header_only_table_has_no_records() {
        assert!(parse_records("Platform,Text\n").unwrap().is_empty());
    }

    #[test]
    fn read_records_strips_bom() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blog.csv");
        std::fs::write(&path, "\u{feff}Text\nHello.\n").unwrap();
        let records = read_records(&path).unwrap();
        assert_eq!(records[0].seed, "Hello.");
    }

    #[test]
    fn read_records_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blog.csv");
        assert!(matches!(read_records(&path), Err(InputError::NotFound(_))));
    }
}
