//! One-level directory listing.

use crate::SYNC_FILE;
use crate::utils::IgnoreSet;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Live entries of a single directory, names only, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Regular files (and symlinks to files), excluding `.sync`
    pub files: BTreeSet<String>,
    /// Subdirectories to recurse into
    pub directories: BTreeSet<String>,
    /// Symlinked directories left alone: links are not followed, or the link
    /// points back at the directory being listed
    pub skipped_links: BTreeSet<String>,
}

impl DirectoryListing {
    /// Whether `name` is a live regular file
    #[must_use]
    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    /// Whether `name` is a subdirectory (followed or not)
    #[must_use]
    pub fn has_directory(&self, name: &str) -> bool {
        self.directories.contains(name) || self.skipped_links.contains(name)
    }
}

/// List the immediate children of `dir`.
///
/// A directory that does not exist lists as empty. Names that are not valid
/// UTF-8 cannot be stored in `.sync` and are skipped with a warning, as are
/// names matching an ignore pattern.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub fn list_directory(
    dir: &Path,
    ignore: &IgnoreSet,
    follow_symlinks: bool,
) -> Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();

    if !dir.exists() {
        debug!(dir = %dir.display(), "Directory missing, listing as empty");
        return Ok(listing);
    }

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(follow_symlinks)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.io_error().is_some_and(|io| io.kind() == ErrorKind::NotFound) => {
                // Dangling symlink while following links
                debug!(dir = %dir.display(), error = %e, "Skipping vanished entry");
                continue;
            }
            Err(e) if e.loop_ancestor().is_some() => {
                debug!(path = ?e.path(), "Symlink loops back to an ancestor, not following");
                if let Some(name) = e.path().and_then(Path::file_name).and_then(|n| n.to_str()) {
                    listing.skipped_links.insert(name.to_string());
                }
                continue;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read directory entry in {}", dir.display()));
            }
        };

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %entry.path().display(), "Skipping entry with non UTF-8 name");
            continue;
        };

        if name == SYNC_FILE || ignore.is_ignored(&name) {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            listing.directories.insert(name);
        } else if file_type.is_file() {
            listing.files.insert(name);
        } else if file_type.is_symlink() {
            classify_link(entry.path(), name, &mut listing);
        } else {
            debug!(path = %entry.path().display(), "Skipping special file");
        }
    }

    Ok(listing)
}

/// Sort an unfollowed symlink by what it points at
fn classify_link(path: &Path, name: String, listing: &mut DirectoryListing) {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %path.display(), "Not following symlinked directory");
            listing.skipped_links.insert(name);
        }
        Ok(meta) if meta.is_file() => {
            listing.files.insert(name);
        }
        Ok(_) => debug!(path = %path.display(), "Skipping link to special file"),
        Err(_) => debug!(path = %path.display(), "Skipping dangling symlink"),
    }
}

/// A directory taking part in one level of a synchronization.
///
/// Owned by exactly one level of the traversal and never shared with parent
/// or sibling levels.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// Directory path
    pub path: PathBuf,
    /// Live listing taken at the start of this level
    pub listing: DirectoryListing,
}

impl DirectoryContext {
    /// List a directory and wrap it in a context
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed
    pub fn open(path: &Path, ignore: &IgnoreSet, follow_symlinks: bool) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            listing: list_directory(path, ignore, follow_symlinks)?,
        })
    }

    /// Full path of a child entry
    #[must_use]
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}
