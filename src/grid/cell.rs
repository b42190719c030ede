//! Cell text preparation
//!
//! Raw values can be megabytes of JSON. Everything here first cuts the input
//! down to a small multiple of the column width, so the cost of drawing a cell
//! never depends on what is stored in it.

use unicode_truncate::UnicodeTruncateStr;
use unicode_width::UnicodeWidthStr;

/// Raw text kept per cell, as a multiple of the column's display width
pub const TRUNCATE_FACTOR: usize = 4;

/// Literal text data sources use for SQL NULL
pub const NULL_TEXT: &str = "NULL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Null,
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCell {
    pub text: String,
    pub kind: CellKind,
    /// True when `text` is shorter than the stored value
    pub truncated: bool,
}

/// First `max_chars` characters of `raw`, without scanning past them
pub fn hard_truncate(raw: &str, max_chars: usize) -> &str {
    match raw.char_indices().nth(max_chars) {
        Some((byte, _)) => &raw[..byte],
        None => raw,
    }
}

/// Fit `raw` into `width` display columns
pub fn prepare(raw: &str, width: usize) -> PreparedCell {
    if raw == NULL_TEXT {
        return PreparedCell {
            text: fit(NULL_TEXT, width).0,
            kind: CellKind::Null,
            truncated: false,
        };
    }

    let bounded = hard_truncate(raw, width.max(1) * TRUNCATE_FACTOR);
    let cut_early = bounded.len() < raw.len();
    let flat = flatten_whitespace(bounded);
    let kind = if looks_like_json(&flat) {
        CellKind::Json
    } else {
        CellKind::Text
    };
    let (text, clipped) = fit(&flat, width);
    PreparedCell {
        text,
        kind,
        truncated: cut_early || clipped,
    }
}

/// Display width of a cell for column sizing, inspecting at most `max_bytes`
pub fn measure(raw: &str, max_bytes: usize) -> usize {
    let mut end = raw.len().min(max_bytes);
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &raw[..end];
    if sample.contains(['\n', '\r', '\t']) {
        flatten_whitespace(sample).width()
    } else {
        sample.width()
    }
}

fn flatten_whitespace(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect()
}

fn looks_like_json(s: &str) -> bool {
    let trimmed = s.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

// Truncates to `width` columns, marking the cut with an ellipsis
fn fit(s: &str, width: usize) -> (String, bool) {
    if s.width() <= width {
        return (s.to_string(), false);
    }
    if width == 0 {
        return (String::new(), true);
    }
    let (head, _) = s.unicode_truncate(width - 1);
    (format!("{}…", head), true)
}
