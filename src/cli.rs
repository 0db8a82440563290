//! Command-line interface definitions for dirsync.
//!
//! The CLI definitions are shared between the main binary and build tools
//! (like xtask) for man page generation.
//!
//! Note: Field-level documentation doubles as clap help text, so we allow
//! missing private-item docs for this module.

#![allow(clippy::missing_docs_in_private_items)]

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for dirsync.
#[derive(Parser, Debug)]
#[command(
    name = "dirsync",
    version = crate::VERSION,
    about = "Two-way directory synchronizer",
    long_about = "Synchronize two directory trees in both directions, using per-file \
                  version histories stored in .sync files to resolve edits and deletions"
)]
pub struct Cli {
    /// First directory
    #[arg(value_name = "DIR_A")]
    pub dir_a: Option<PathBuf>,

    /// Second directory
    #[arg(value_name = "DIR_B")]
    pub dir_b: Option<PathBuf>,

    /// Configuration file to use (default: $DIRSYNC_CONFIG, then the user config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show what would change without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Recurse into symlinked directories
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Never synchronize names matching this glob (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Both roots, when both were given
    #[must_use]
    pub fn roots(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.dir_a.as_ref().zip(self.dir_b.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "dirsync", "-n", "--ignore", "*.swp", "-i", "*.tmp", "left", "right",
        ]);
        assert!(cli.dry_run);
        assert_eq!(cli.ignore, vec!["*.swp", "*.tmp"]);
        assert_eq!(
            cli.roots(),
            Some((&PathBuf::from("left"), &PathBuf::from("right")))
        );
    }

    #[test]
    fn test_single_root_is_incomplete() {
        let cli = Cli::parse_from(["dirsync", "left"]);
        assert!(cli.roots().is_none());
    }
}
