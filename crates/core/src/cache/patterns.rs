//! Pure pattern matching functions for cache keys.
//!
//! Patterns support a single trailing `*` wildcard (`prefix*`) that matches
//! any suffix, including the empty one. A pattern without `*` names exactly
//! one key. Wildcards anywhere else are rejected.

use super::{key_domain, CacheError, Result};

/// A parsed cache key pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern<'a> {
    /// Matches exactly one key.
    Exact(&'a str),
    /// Matches every key starting with the prefix.
    Prefix(&'a str),
}

impl<'a> KeyPattern<'a> {
    /// Parses a pattern string.
    ///
    /// # Examples
    ///
    /// ```
    /// use courtsync_core::cache::KeyPattern;
    ///
    /// assert_eq!(KeyPattern::parse("courts:1").unwrap(), KeyPattern::Exact("courts:1"));
    /// assert_eq!(KeyPattern::parse("slots:5:*").unwrap(), KeyPattern::Prefix("slots:5:"));
    /// assert!(KeyPattern::parse("slots:*:9").is_err());
    /// ```
    pub fn parse(pattern: &'a str) -> Result<Self> {
        match pattern.find('*') {
            None => Ok(KeyPattern::Exact(pattern)),
            Some(pos) if pos == pattern.len() - 1 => Ok(KeyPattern::Prefix(&pattern[..pos])),
            Some(_) => Err(CacheError::InvalidPattern(pattern.to_string())),
        }
    }

    /// Returns true if the key matches this pattern.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Exact(exact) => key == *exact,
            KeyPattern::Prefix(prefix) => key.starts_with(prefix),
        }
    }

    /// Returns the key domain every match belongs to, if the pattern fixes it.
    ///
    /// `slots:5:*` is confined to `slots`; a bare `sl*` could match keys of
    /// any domain starting with `sl`, so it returns `None`.
    pub fn domain(&self) -> Option<&'a str> {
        match self {
            KeyPattern::Exact(exact) => key_domain(exact),
            KeyPattern::Prefix(prefix) => key_domain(prefix),
        }
    }
}
