//! Status normalizer
//!
//! Turns raw `systemctl` and `snap` output into typed values. This is the only
//! module that looks at tool text; everything above it works on the types in
//! `crate::types`.
//!
//! # Search output formats
//!
//! | Format    | Shape |
//! |-----------|-------|
//! | `Machine` | `name\tversion\tpublisher\tchannel[\tnotes[\tsummary]]`, no header |
//! | `Classic` | `Name  Version  Publisher  Notes  Summary` columns with a header row |
//!
//! The caller chooses the format by probing the tool before searching, never
//! by sniffing the output.

use crate::types::{EnabledState, InstalledPackage, PackageSearchResult};

/// Default number of search rows kept for display.
pub const DEFAULT_SEARCH_LIMIT: usize = 30;

/// Shape of `snap find` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFormat {
    /// Tab-delimited, one package per line.
    Machine,
    /// Human-readable columns with a header row.
    Classic,
}

/// Interpret `systemctl is-active` output.
///
/// Returns `None` when there is nothing to interpret (query failure).
pub fn parse_service_active(raw: &str) -> Option<bool> {
    let word = first_non_empty_line(raw)?;
    Some(matches!(word, "active" | "reloading"))
}

/// Interpret `systemctl is-enabled` output. Unrecognized words pass through.
pub fn parse_service_enabled(raw: &str) -> EnabledState {
    match first_non_empty_line(raw) {
        Some(word) => word.parse().unwrap_or(EnabledState::Unknown),
        None => EnabledState::Unknown,
    }
}

/// Parse `snap find` output in the given format, keeping at most `limit` rows.
///
/// Excess rows are dropped silently.
pub fn parse_package_search_rows(
    raw: &str,
    format: SearchFormat,
    limit: usize,
) -> Vec<PackageSearchResult> {
    let rows = raw.lines().filter_map(|line| match format {
        SearchFormat::Machine => parse_machine_row(line),
        SearchFormat::Classic => parse_classic_row(line),
    });
    rows.take(limit).collect()
}

/// Parse `snap list` output.
pub fn parse_installed_rows(raw: &str) -> Vec<InstalledPackage> {
    raw.lines()
        .filter(|line| !is_decoration(line) && !is_header(line))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 5 {
                return None;
            }
            Some(InstalledPackage {
                name: cols[0].to_string(),
                version: cols[1].to_string(),
                revision: cols[2].to_string(),
                tracking_channel: cols[3].to_string(),
                publisher: strip_verification(cols[4]),
                notes: cols.get(5).map(|n| n.to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

fn parse_machine_row(line: &str) -> Option<PackageSearchResult> {
    if line.trim().is_empty() {
        return None;
    }
    let cols: Vec<&str> = line.split('\t').map(str::trim).collect();
    if cols.len() < 4 || cols[0].is_empty() {
        return None;
    }
    Some(PackageSearchResult {
        name: cols[0].to_string(),
        version: cols[1].to_string(),
        publisher: strip_verification(cols[2]),
        channel: cols[3].to_string(),
        notes: cols.get(4).map(|s| s.to_string()).unwrap_or_default(),
        summary: cols.get(5).map(|s| s.to_string()).unwrap_or_default(),
    })
}

fn parse_classic_row(line: &str) -> Option<PackageSearchResult> {
    if is_decoration(line) || is_header(line) {
        return None;
    }
    let mut cols = line.split_whitespace();
    let name = cols.next()?;
    let version = cols.next()?;
    let publisher = cols.next()?;
    let notes = cols.next().unwrap_or("-");
    let summary = cols.collect::<Vec<_>>().join(" ");
    Some(PackageSearchResult {
        name: name.to_string(),
        version: version.to_string(),
        publisher: strip_verification(publisher),
        channel: "stable".to_string(),
        notes: notes.to_string(),
        summary,
    })
}

/// Blank lines and rows whose first token starts with a non-alphanumeric marker.
fn is_decoration(line: &str) -> bool {
    match line.split_whitespace().next() {
        None => true,
        Some(token) => !token.chars().next().is_some_and(char::is_alphanumeric),
    }
}

fn is_header(line: &str) -> bool {
    let mut cols = line.split_whitespace();
    cols.next() == Some("Name") && cols.next() == Some("Version")
}

/// `canonical✓` / `jdoe*` / `jdoe**` -> bare publisher name.
fn strip_verification(publisher: &str) -> String {
    publisher
        .trim_end_matches(['✓', '*', '✪'])
        .to_string()
}

fn first_non_empty_line(raw: &str) -> Option<&str> {
    raw.lines().map(str::trim).find(|l| !l.is_empty())
}
