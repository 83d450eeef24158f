//! Text derivations shared by the pipeline: keyword, display title,
//! summary/body split, emoji stripping, and filename slugs.
//!
//! ## Keyword and title
//!
//! The keyword names the post's topic. It is the row's image hint when
//! present (surrounding slashes trimmed, so `gadgets/` works), otherwise the
//! first non-empty sentence of the seed. The display title is the keyword with dashes
//! turned into spaces, title-cased per word:
//!
//! - `"smart-home/"` → keyword `smart-home` → title `"Smart Home"`
//! - seed `"great new gadget. buy now"` → keyword `great new gadget` → `"Great New Gadget"`
//!
//! ## Summary extraction
//!
//! Generated prose is asked to open with a short unlabeled summary followed
//! by a blank line. [`split_summary`] takes everything before the first blank
//! line as the summary and the rest as the body. When there is no blank line
//! (or nothing after it), the whole text is the body and the summary is the
//! first [`SUMMARY_MAX_CHARS`] characters, cut back to a word boundary with
//! `...` appended. This is a heuristic; the summary is only ever shown as
//! escaped plain text on the listing card.

/// Longest fallback summary, in characters (not bytes).
pub const SUMMARY_MAX_CHARS: usize = 150;

/// Longest slug, in bytes. Slugs are ASCII so bytes == chars.
pub const MAX_SLUG_LEN: usize = 60;

/// Topic keyword for a record: image hint first, then the seed's first sentence.
pub fn keyword(seed: &str, image_hint: Option<&str>) -> String {
    let hint = image_hint.map(|h| h.trim().trim_matches('/').trim()).unwrap_or("");
    if !hint.is_empty() {
        return hint.to_string();
    }
    seed.split('.')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Display title: dashes to spaces, each word capitalized, the rest lowercased.
pub fn title_case(keyword: &str) -> String {
    keyword
        .replace('-', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Generated prose split into its card summary and page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prose {
    pub summary: String,
    /// Markdown.
    pub body: String,
}

/// Split generated text into summary and body, and strip emojis from both.
pub fn split_summary(text: &str) -> Prose {
    let normalized = text.replace("\r\n", "\n");
    let split = find_blank_line(&normalized).and_then(|(end, start)| {
        let summary = normalized[..end].trim();
        let body = normalized[start..].trim();
        (!summary.is_empty() && !body.is_empty()).then_some((summary, body))
    });
    let (summary, body) = match split {
        Some((summary, body)) => (clean_summary(summary), body.to_string()),
        None => {
            let body = normalized.trim();
            (truncate_summary(&clean_summary(body)), body.to_string())
        }
    };
    Prose {
        summary: strip_emojis(&summary).trim().to_string(),
        body: strip_emojis(&body).trim().to_string(),
    }
}

/// Byte range of the first blank line: (end of text before it, start of text after it).
///
/// A blank line is a line containing only whitespace.
fn find_blank_line(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut prev_end: Option<usize> = None;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            if let Some(end) = prev_end {
                return Some((end, offset));
            }
        } else {
            prev_end = Some(start + line.trim_end().len());
        }
    }
    None
}

/// Drop leading Markdown heading markers and collapse whitespace.
fn clean_summary(summary: &str) -> String {
    summary
        .trim_start_matches('#')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut to [`SUMMARY_MAX_CHARS`] at a word boundary, appending `...` when shortened.
pub fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .nth(SUMMARY_MAX_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head,
    };
    format!("{}...", head.trim_end_matches(|c: char| c.is_whitespace() || c == ','))
}

/// Whether `c` is an emoji or emoji-joining code point.
fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F600..=0x1F64F   // emoticons
        | 0x1F300..=0x1F5FF // symbols & pictographs
        | 0x1F680..=0x1F6FF // transport & map
        | 0x1F1E0..=0x1F1FF // flags
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1FA70..=0x1FAFF // symbols & pictographs extended-A
        | 0x2600..=0x26FF   // misc symbols
        | 0x2702..=0x27B0   // dingbats
        | 0xFE0F            // variation selector-16
        | 0x200D            // zero width joiner
    )
}

/// Remove emojis, leaving all other text (including non-Latin scripts) intact.
pub fn strip_emojis(text: &str) -> String {
    text.chars().filter(|&c| !is_emoji(c)).collect()
}

/// Filesystem- and URL-safe slug for artifact names.
///
/// Lowercases, keeps `[a-z0-9]`, turns whitespace and dashes into single
/// dashes, drops everything else, trims dashes, and truncates to
/// [`MAX_SLUG_LEN`]. Falls back to `"post"` when nothing is left.
pub fn sanitize_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_dash = true; // suppresses a leading dash
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            prev_dash = false;
        } else if (c.is_whitespace() || c == '-') && !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug.to_string()
    }
}
