//! Key Pattern Module
//!
//! Compiles bulk-invalidation patterns. `*` matches any run of characters
//! (including none); everything else matches literally. Patterns are anchored
//! at both ends, the same way Redis `KEYS` treats its glob.

use regex::Regex;

use crate::error::{CacheError, Result};

/// A compiled invalidation pattern.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    raw: String,
    regex: Regex,
    glob: String,
}

impl KeyPattern {
    /// Compiles a wildcard pattern.
    ///
    /// Returns `CacheError::InvalidPattern` for an empty pattern or one the
    /// regex engine refuses (e.g. size limits).
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(CacheError::InvalidPattern(
                "pattern cannot be empty".to_string(),
            ));
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("(?s)^{body}$"))
            .map_err(|e| CacheError::InvalidPattern(format!("{pattern}: {e}")))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
            glob: escape_glob(pattern, true),
        })
    }

    /// Pattern matching every key that starts with `prefix`, taken literally.
    ///
    /// Unlike [`KeyPattern::parse`], a `*` inside `prefix` is not a wildcard.
    pub fn prefix(prefix: &str) -> Result<Self> {
        if prefix.is_empty() {
            return Err(CacheError::InvalidPattern(
                "prefix cannot be empty".to_string(),
            ));
        }

        let regex = Regex::new(&format!("(?s)^{}.*$", regex::escape(prefix)))
            .map_err(|e| CacheError::InvalidPattern(format!("{prefix}: {e}")))?;

        Ok(Self {
            raw: format!("{prefix}*"),
            regex,
            glob: format!("{}*", escape_glob(prefix, false)),
        })
    }

    /// The pattern as written by the caller.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Tests a logical (decoded) key against the pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Renders the pattern as a Redis glob, escaping every glob
    /// metacharacter except `*`.
    pub fn to_glob(&self) -> String {
        self.glob.clone()
    }
}

/// Escapes Redis glob metacharacters. `*` is kept as a wildcard when
/// `keep_star` is set.
pub(crate) fn escape_glob(text: &str, keep_star: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' if keep_star => out.push('*'),
            '*' | '?' | '[' | ']' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern() {
        let pattern = KeyPattern::parse("search:*").unwrap();
        assert!(pattern.matches("search:folder:docs:1"));
        assert!(pattern.matches("search:"));
        assert!(!pattern.matches("folder:search:1"));
        assert!(!pattern.matches("folders:root:1"));
    }

    #[test]
    fn test_inner_wildcard() {
        let pattern = KeyPattern::parse("folder:*:content:*").unwrap();
        assert!(pattern.matches("folder:abc:content:1"));
        assert!(pattern.matches("folder::content:"));
        assert!(!pattern.matches("folder:abc:children:1"));
    }

    #[test]
    fn test_literal_pattern_is_exact() {
        let pattern = KeyPattern::parse("file:42").unwrap();
        assert!(pattern.matches("file:42"));
        assert!(!pattern.matches("file:421"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = KeyPattern::parse("search:file:a.b(c)+:*").unwrap();
        assert!(pattern.matches("search:file:a.b(c)+:3"));
        assert!(!pattern.matches("search:file:aXb(c)+:3"));
    }

    #[test]
    fn test_wildcard_spans_newlines() {
        let pattern = KeyPattern::parse("search:*").unwrap();
        assert!(pattern.matches("search:multi\nline"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(
            KeyPattern::parse(""),
            Err(CacheError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_prefix_star_is_literal() {
        let pattern = KeyPattern::prefix("folder:a*b:").unwrap();
        assert!(pattern.matches("folder:a*b:content:1"));
        assert!(!pattern.matches("folder:aXb:content:1"));
        assert_eq!(pattern.to_glob(), "folder:a\\*b:*");
        assert!(KeyPattern::prefix("").is_err());
    }

    #[test]
    fn test_glob_escaping() {
        let pattern = KeyPattern::parse("search:file:what?[x]\\*").unwrap();
        assert_eq!(pattern.to_glob(), "search:file:what\\?\\[x\\]\\\\*");
        assert_eq!(escape_glob("pre*fix:", false), "pre\\*fix:");
    }
}
