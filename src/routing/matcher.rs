//! Route matching logic.
//!
//! # Design Decisions
//! - Path matching is a case-sensitive byte prefix test
//! - No regex, no segment awareness: `/ab` matches a `/a` prefix
//! - Specificity is the prefix length, so the longest prefix wins

/// Matches request paths starting with a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Longer prefixes are more specific.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }
}
