use glob::{Pattern, PatternError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const GLOB_CHARS: &[char] = &['*', '?', '['];

/// Directories to skip during recursive table discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryFilter {
    /// Exclude these directory path patterns (glob-style)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl DiscoveryFilter {
    pub fn new(exclude_patterns: Vec<String>) -> Self {
        Self { exclude_patterns }
    }

    /// Parse a comma-separated pattern list, dropping empty items.
    pub fn from_list(patterns: &str) -> Self {
        Self::new(
            patterns
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.exclude_patterns.is_empty()
    }

    /// Reject patterns that do not compile.
    pub fn validate(&self) -> Result<(), PatternError> {
        for pattern in &self.exclude_patterns {
            Pattern::new(pattern)?;
        }
        Ok(())
    }

    /// Check if a directory should be skipped
    pub fn is_excluded(&self, dir: &Path) -> bool {
        let path_str = dir.to_string_lossy();
        self.exclude_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &path_str))
    }
}

/// Match a directory path against an exclude pattern.
///
/// Patterns use shell glob syntax, with `*` also crossing `/`. A pattern with
/// no wildcard matches when it occurs anywhere in the path. An invalid
/// pattern matches nothing.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains(GLOB_CHARS) {
        return text.contains(pattern);
    }
    Pattern::new(pattern).is_ok_and(|p| p.matches(text))
}
