use crate::storage::Timestamp;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Modification time of a file at second resolution
///
/// # Errors
///
/// Returns an error if the file metadata cannot be read
pub fn modified_time(path: &Path) -> Result<Timestamp> {
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    Ok(Timestamp::from_system_time(modified))
}

/// Stamp a file with the given modification time
///
/// # Errors
///
/// Returns an error if the time cannot be set
pub fn set_modified_time(path: &Path, timestamp: Timestamp) -> Result<()> {
    filetime::set_file_mtime(path, timestamp.to_file_time()).with_context(|| {
        format!(
            "Failed to set modification time of {} to {timestamp}",
            path.display()
        )
    })
}

/// Copy `source` over `dest`, replacing any existing file
///
/// # Errors
///
/// Returns an error if the source is missing or the copy fails
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64> {
    fs::copy(source, dest)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))
}

/// Delete a file; a file that is already gone counts as deleted
///
/// # Errors
///
/// Returns an error if the file exists and cannot be removed
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
    }
}
