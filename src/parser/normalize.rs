//! Field normalizers
//!
//! Pure functions turning raw node text into typed values. None of them
//! fail: unreadable input becomes `None` or an empty list.

use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Parse trimmed text as an unsigned integer
pub fn parse_int(text: &str) -> Option<u32> {
    text.trim().parse().ok()
}

/// Parse trimmed text as a finite float
pub fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// First run of digits anywhere in the text ("Episode 12" -> 12)
pub fn extract_int(text: &str) -> Option<u32> {
    FIRST_INT
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Split a comma separated genre string into trimmed, non-empty tags
pub fn split_genres(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonical form of an info label: "Tanggal Rilis:" -> "tanggal_rilis"
pub fn canonical_label(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Canonical form of a download format label: " MP4 720p " -> "mp4-720p"
pub fn canonical_format(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Trimmed text, or `None` when nothing is left
pub fn non_empty(text: impl AsRef<str>) -> Option<String> {
    let text = text.as_ref().trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
