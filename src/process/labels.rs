// src/process/labels.rs
//
// Column label rules. Matching is plain string comparison on the source
// labels: a relabelled column stops matching rather than being guessed at.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::Region;

static DISAMBIGUATION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(\d+)$").expect("suffix regex should compile"));

/// Drop a trailing `.N` added when a label repeats (`SARS-CoV-2%.3`).
pub fn strip_suffix(label: &str) -> &str {
    match DISAMBIGUATION_SUFFIX.find(label) {
        Some(m) => &label[..m.start()],
        None => label,
    }
}

/// Occurrence number of a repeated label: 0 for the first, `N` for `.N`.
pub fn suffix_index(label: &str) -> usize {
    DISAMBIGUATION_SUFFIX
        .captures(label)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

pub fn is_positivity(label: &str) -> bool {
    strip_suffix(label).trim_end().ends_with('%')
}

pub fn is_case_count(label: &str) -> bool {
    label.contains("Tests")
}

/// `Week end` / `Week End`.
pub fn find_week_column(labels: &[String]) -> Option<usize> {
    labels
        .iter()
        .position(|l| strip_suffix(l).trim().eq_ignore_ascii_case("week end"))
}

/// Split a leading region code off a label: `ON Tests` → `(ON, "Tests")`.
pub fn region_prefix(label: &str) -> Option<(Region, &str)> {
    let (head, rest) = strip_suffix(label).trim().split_once(char::is_whitespace)?;
    Some((Region::from_code(head)?, rest.trim()))
}

/// Pathogen code carried by a positivity label, without region prefix,
/// disambiguation suffix or `%`: `RSV%.3` → `RSV`, `ON A%` → `A`.
pub fn positivity_code(label: &str) -> &str {
    let base = match region_prefix(label) {
        Some((_, rest)) => rest,
        None => strip_suffix(label).trim(),
    };
    base.trim_end_matches('%').trim_end()
}

/// Case-count label for one region, as the source writes it.
pub fn case_count_label(region: Region) -> String {
    format!("{} Tests", region.code())
}

/// Influenza subtype positivity label for one region (`ON A%`).
pub fn subtype_label(region: Region, subtype_code: &str) -> String {
    format!("{} {}%", region.code(), subtype_code)
}
