//! Small text helpers shared across the crate.

/// Truncate a string to at most `max_chars` characters (not bytes).
///
/// # Examples
///
/// ```
/// use wiki_lookup_bot::utils::truncate_str;
///
/// assert_eq!(truncate_str("Привет", 3), "При");
/// assert_eq!(truncate_str("ok", 10), "ok");
/// ```
#[must_use]
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Display name of a Telegram user for logs.
#[must_use]
pub fn user_label(username: Option<&str>, first_name: &str) -> String {
    match username {
        Some(name) if !name.is_empty() => name.to_string(),
        _ if !first_name.is_empty() => first_name.to_string(),
        _ => "Unknown".to_string(),
    }
}
