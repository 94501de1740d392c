//! Key patterns for bulk invalidation.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{CacheError, Result};

/// Compiled regular expression matched against cache keys.
///
/// A plain substring is a valid pattern, so `"students"` matches every key
/// containing it while `"^students:"` only matches keys starting with it.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compiles `pattern` as a regular expression.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| CacheError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Matches keys containing `text` verbatim, regex metacharacters included.
    pub fn literal(text: &str) -> Self {
        let source = regex::escape(text);
        let regex = Regex::new(&source).expect("escaped literal is a valid regex");
        Self { source, regex }
    }

    /// Matches every key generated for `operation`: the bare name and any
    /// `operation:...` key.
    pub fn operation(operation: &str) -> Self {
        let source = format!("^{}(:|$)", regex::escape(operation));
        let regex = Regex::new(&source).expect("escaped operation is a valid regex");
        Self { source, regex }
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for KeyPattern {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
