use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Case-insensitive substring test.
/// `needle` should already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(needle)
}

/// Unicode-aware case-insensitive equality
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 (`2025-05-15T08:00:00.000Z`), a naive datetime
/// (`2025-05-15T08:00:00`, read as UTC) or a bare date (`2025-05-15`,
/// read as midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
