//! Normalized cache keys

use std::fmt;

/// Cache and cooldown key: (keyword, region), normalized
///
/// The keyword is trimmed and lowercased, the region trimmed and uppercased,
/// so keys that differ only in case or surrounding whitespace collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    keyword: String,
    geo: String,
}

impl CacheKey {
    pub fn new(keyword: &str, geo: &str) -> Self {
        Self { keyword: keyword.trim().to_lowercase(), geo: geo.trim().to_uppercase() }
    }

    /// Key for a multi-keyword query; keyword order is significant
    pub fn for_keywords<S: AsRef<str>>(keywords: &[S], geo: &str) -> Self {
        let joined = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        Self { keyword: joined, geo: geo.trim().to_uppercase() }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn geo(&self) -> &str {
        &self.geo
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.geo.is_empty() {
            write!(f, "'{}'", self.keyword)
        } else {
            write!(f, "'{}'@{}", self.keyword, self.geo)
        }
    }
}
