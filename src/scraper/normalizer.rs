//! Shared building blocks for the per-site record normalizers.
//!
//! Everything here is pure: the scrape timestamp is an input, so the same raw
//! listing always normalizes to the same records.

use serde::{Deserialize, Serialize};

/// Per-invocation normalization switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Emit one record per combination of multi-valued fields instead of a
    /// single record with joined values. Changes the row count, so it is
    /// never on by default.
    #[serde(default)]
    pub expand_multi: bool,
}

/// Inputs fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeContext {
    pub options: NormalizeOptions,
    pub scraped_at: String,
    /// Page the listing was read from; used when a row carries no link.
    pub page_url: String,
}

/// Split a field that packs several values with `;` or `,`.
pub fn split_multi(value: &str) -> Vec<String> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join values with `"; "`, dropping repeats but keeping first-seen order.
pub fn join_unique(parts: &[String]) -> String {
    let mut seen: Vec<&str> = Vec::with_capacity(parts.len());
    for part in parts {
        if !seen.contains(&part.as_str()) {
            seen.push(part);
        }
    }
    seen.join("; ")
}

/// Canonical single-string form of a multi-valued field. Falls back to the
/// raw value when nothing survives the split.
pub fn normalize_multi(value: &str) -> String {
    let parts = split_multi(value);
    if parts.is_empty() {
        value.trim().to_string()
    } else {
        join_unique(&parts)
    }
}

/// Cartesian product of two value lists, in row-major order.
pub fn cartesian(left: &[String], right: &[String]) -> Vec<(String, String)> {
    left.iter()
        .flat_map(|l| right.iter().map(move |r| (l.clone(), r.clone())))
        .collect()
}

/// Collapse internal whitespace runs to single spaces.
pub fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
