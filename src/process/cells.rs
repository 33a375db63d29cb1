use chrono::{NaiveDate, NaiveDateTime};

/// Cell values the publisher uses for "no data".
const PLACEHOLDERS: &[&str] = &["-", "–", "—", "..", ".", "x", "X", "NA", "N/A", "n/a", "nan", "NaN"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y"];

/// Trim whitespace (including non-breaking spaces) and strip outer quotes.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}');
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Parse a count or percentage cell into a non-negative number.
///
/// Thousands separators and a trailing `%` are accepted; blanks and
/// placeholders are absent values, never zero.
pub fn parse_measure(raw: &str) -> Option<f64> {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() || PLACEHOLDERS.contains(&cleaned) {
        return None;
    }
    let digits: String = cleaned
        .trim_end_matches('%')
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    let value: f64 = digits.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Parse the week-end date of a reporting period.
pub fn parse_week_end(raw: &str) -> Option<NaiveDate> {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(cleaned, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
