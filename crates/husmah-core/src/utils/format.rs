use chrono::Duration;

/// Truncate a string to a maximum number of characters, adding an ellipsis if needed
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

/// The value itself, or `placeholder` when it is blank
pub fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Format a backend timestamp for display
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y %H:%M").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        // Try to parse YYYY-MM-DD format
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

/// Session time left as `MM:SS`, never negative
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Case-insensitive substring search, used by the list filters
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
