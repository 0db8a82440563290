//! Configuration loading.
//!
//! Settings come from an optional TOML file; command-line flags are layered
//! on top by the binary before a [`crate::SyncContext`] is built.

/// TOML parsing and semantic validation
pub mod parser;
/// Unknown-key detection
pub mod validator;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "DIRSYNC_CONFIG";

/// Configuration file path relative to the platform config directory
pub const DEFAULT_CONFIG_PATH: &str = "dirsync/config.toml";

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// `[sync]` table
    #[serde(default)]
    pub sync: SyncSettings,

    /// `[output]` table
    #[serde(default)]
    pub output: OutputSettings,
}

/// Synchronization behaviour
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncSettings {
    /// Recurse into symlinked directories (cycles are detected)
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Glob patterns for file or directory names that are never synchronized
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Plan and report without touching any file
    #[serde(default)]
    pub dry_run: bool,
}

/// Output formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Pretty-print `.sync` files
    #[serde(default = "default_pretty_json")]
    pub pretty_json: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty_json: default_pretty_json(),
        }
    }
}

impl Config {
    /// Resolve which configuration file to read.
    ///
    /// Precedence: explicit path, then `DIRSYNC_CONFIG`, then the platform
    /// config directory. Returns `None` when no location can be determined.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from a file
    ///
    /// A missing file yields the defaults; nothing is created on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML
    /// - A setting fails validation (e.g. a malformed ignore pattern)
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        parser::parse_config_file(path)
    }
}

/// Default for `output.pretty_json`
const fn default_pretty_json() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.sync.follow_symlinks);
        assert!(!config.sync.dry_run);
        assert!(config.sync.ignore_patterns.is_empty());
        assert!(config.output.pretty_json);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.toml");

        let config = Config::load(&path)?;
        assert!(config.output.pretty_json);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/custom.toml");
        assert_eq!(
            Config::resolve_path(Some(&explicit)),
            Some(explicit.clone())
        );
    }
}
