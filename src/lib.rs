#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters cannot overflow
#![allow(clippy::indexing_slicing)] // Histories are never empty

//! # Dirsync - Two-Way Directory Synchronizer
//!
//! Dirsync keeps two directory trees in agreement. Every directory carries a
//! `.sync` file recording, per file, a newest-first history of
//! `(timestamp, SHA-256)` observations. Comparing histories lets a run tell a
//! stale copy from a genuine divergent edit and a deletion from a file that
//! was never seen, so repeated runs converge without re-copying anything.
//!
//! ## Architecture
//!
//! - [`storage`]: version records, histories and the `.sync` file format
//! - [`scanner`]: directory listing and change detection
//! - [`merge`]: per-file conflict resolution, planned then applied
//! - [`sync`]: the recursive tree driver and root validation
//! - [`config`]: TOML configuration
//! - [`output`]: console output
//! - [`report`]: run summary and per-file issues
//!
//! ## Example Usage
//!
//! ```no_run
//! use dirsync::{SyncContext, config::Config};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = SyncContext::new(Config::default())?;
//! let report = dirsync::sync::synchronize(&ctx, Path::new("laptop"), Path::new("usb"))?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Configuration parsing and validation.
pub mod config;

/// Typed errors for root validation.
pub mod errors;

/// Tracing subscriber setup.
pub mod logging;

/// Merge planning and application.
pub mod merge;

/// Console output and verbosity.
pub mod output;

/// Run report and per-file issues.
pub mod report;

/// Directory listing and change detection.
pub mod scanner;

/// Version histories and `.sync` persistence.
pub mod storage;

/// Recursive synchronization of a root pair.
pub mod sync;

/// Utility functions and helpers.
pub mod utils;

use anyhow::Result;
use std::path::Path;
use utils::IgnoreSet;

/// Current version of the dirsync binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the per-directory state file.
pub const SYNC_FILE: &str = ".sync";

/// Settings shared by every level of a synchronization run.
///
/// Built once from the configuration (with command-line overrides already
/// applied) and passed by reference through the whole traversal.
///
/// # Examples
///
/// ```
/// use dirsync::{SyncContext, config::Config};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut config = Config::default();
/// config.sync.ignore_patterns.push("*.swp".to_string());
///
/// let ctx = SyncContext::new(config)?;
/// assert!(ctx.ignore().is_ignored("notes.txt.swp"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Effective configuration
    config: config::Config,
    /// Compiled ignore patterns
    ignore: IgnoreSet,
}

impl SyncContext {
    /// Create a context from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an ignore pattern is not a valid glob.
    pub fn new(config: config::Config) -> Result<Self> {
        let ignore = IgnoreSet::new(&config.sync.ignore_patterns)?;
        Ok(Self { config, ignore })
    }

    /// Load the configuration file and build a context from it.
    ///
    /// The file is located with [`config::Config::resolve_path`]. Unknown keys
    /// only produce warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = config::Config::resolve_path(explicit) else {
            return Self::new(config::Config::default());
        };

        let config = config::Config::load(&path)?;

        let validator = config::validator::ConfigValidator::new();
        if let Err(e) = validator.validate_config_file(&path) {
            output::warning(&format!("Configuration validation failed: {e}"));
        }

        Self::new(config)
    }

    /// Layer command-line flags over the loaded settings.
    ///
    /// Flags can only switch behaviour on; extra ignore patterns are appended.
    ///
    /// # Errors
    ///
    /// Returns an error if an extra ignore pattern is not a valid glob.
    pub fn with_overrides(
        mut self,
        dry_run: bool,
        follow_symlinks: bool,
        extra_ignores: &[String],
    ) -> Result<Self> {
        self.config.sync.dry_run |= dry_run;
        self.config.sync.follow_symlinks |= follow_symlinks;
        self.config
            .sync
            .ignore_patterns
            .extend(extra_ignores.iter().cloned());
        Self::new(self.config)
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &config::Config {
        &self.config
    }

    /// Compiled ignore patterns
    #[must_use]
    pub const fn ignore(&self) -> &IgnoreSet {
        &self.ignore
    }

    /// Whether file operations and `.sync` writes are suppressed
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.config.sync.dry_run
    }

    /// Whether symlinked directories are recursed into
    #[must_use]
    pub const fn follow_symlinks(&self) -> bool {
        self.config.sync.follow_symlinks
    }

    /// Whether `.sync` files are pretty-printed
    #[must_use]
    pub const fn pretty_json(&self) -> bool {
        self.config.output.pretty_json
    }
}
