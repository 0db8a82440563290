//! Run summary and per-file issue reporting.
//!
//! Per-file failures never abort a run. They are collected here as
//! [`FileIssue`] values, accumulated across every recursion level, and printed
//! once the whole tree has been processed.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Operation that failed for a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// Fingerprinting an existing file
    Hash,
    /// Copying a file to the other side
    Copy,
    /// Deleting a file
    Delete,
    /// Setting a modification time
    SetModifiedTime,
    /// Reading a modification time
    ReadMetadata,
    /// Synchronizing a subdirectory pair
    Recurse,
}

impl FileOperation {
    /// Short label used in messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Copy => "copy",
            Self::Delete => "delete",
            Self::SetModifiedTime => "set modification time",
            Self::ReadMetadata => "read modification time of",
            Self::Recurse => "synchronize directory",
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A recoverable failure affecting one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIssue {
    /// Path the operation was attempted on
    pub path: PathBuf,
    /// What was attempted
    pub operation: FileOperation,
    /// Error chain rendered as text
    pub message: String,
}

impl fmt::Display for FileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not {} {}: {}",
            self.operation,
            self.path.display(),
            self.message
        )
    }
}

/// Counters and issues for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Directory pairs synchronized
    pub directories: usize,
    /// Files copied between sides
    pub copied: usize,
    /// Files deleted to propagate a removal
    pub deleted: usize,
    /// Modification times aligned between sides
    pub retimed: usize,
    /// `.sync` files written
    pub states_written: usize,
    /// Recoverable failures
    pub issues: Vec<FileIssue>,
}

impl SyncReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable failure and log it
    pub fn record_issue(&mut self, path: &Path, operation: FileOperation, error: &anyhow::Error) {
        let message = format!("{error:#}");
        warn!(path = %path.display(), operation = operation.label(), error = %message, "Skipped");
        self.issues.push(FileIssue {
            path: path.to_path_buf(),
            operation,
            message,
        });
    }

    /// Whether any recoverable failure occurred
    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// One-line summary of the run
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} director{} synchronized: {} copied, {} deleted, {} retimed",
            self.directories,
            if self.directories == 1 { "y" } else { "ies" },
            self.copied,
            self.deleted,
            self.retimed
        );
        if self.has_issues() {
            line.push_str(&format!(
                ", {} issue{}",
                self.issues.len(),
                if self.issues.len() == 1 { "" } else { "s" }
            ));
        }
        line
    }
}
