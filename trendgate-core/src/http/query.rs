//! Query-string parsing

use std::borrow::Cow;

/// Percent-decode a form value, treating `+` as a space
fn decode_component(raw: &str) -> String {
    let spaced: Cow<'_, str> =
        if raw.contains('+') { Cow::Owned(raw.replace('+', " ")) } else { Cow::Borrowed(raw) };
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

/// First value of `name` in a raw query string
///
/// A parameter given without `=` yields an empty value.
pub fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode_component(key) == name)
        .map(|(_, value)| decode_component(value))
}

/// Comma-separated keywords, trimmed, blanks dropped, first occurrence kept
///
/// Duplicates are detected case-insensitively, matching cache key identity.
pub fn split_keywords(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .filter(|kw| seen.insert(kw.to_lowercase()))
        .map(str::to_string)
        .collect()
}
