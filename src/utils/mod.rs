//! Utility functions and helpers.
//!
//! - [`hash`]: SHA-256 fingerprinting of files
//! - [`file_ops`]: copy, delete and modification-time primitives
//! - [`IgnoreSet`]: name-level ignore pattern matching

/// Low-level file operations used when applying a merge
pub mod file_ops;
/// Content fingerprinting
pub mod hash;

use anyhow::{Context, Result};
use glob::Pattern;

/// Compiled ignore patterns, matched against single file or directory names.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    /// Compiled glob patterns
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    /// Compile a list of glob patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is not a valid glob
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid ignore pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether a name matches any pattern
    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }
}
