/// Timestamps, digests and version records
pub mod record;
/// Version histories and per-directory state
pub mod state;

pub use record::{DELETED_SENTINEL, Digest, TIMESTAMP_FORMAT, Timestamp, VersionRecord};
pub use state::{SyncState, VersionHistory};

use crate::SYNC_FILE;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Path of the state file inside a directory
#[must_use]
pub fn state_path(dir: &Path) -> PathBuf {
    dir.join(SYNC_FILE)
}

impl SyncState {
    /// Load the persisted state of a directory.
    ///
    /// A missing, unreadable or corrupt `.sync` yields an empty state: every
    /// file in the directory is then rediscovered as new.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let path = state_path(dir);

        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file, starting empty");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable state file, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_slice(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt state file, starting empty");
                Self::new()
            }
        }
    }

    /// Persist this state as the directory's `.sync`, replacing it entirely.
    ///
    /// The file is written to a temporary sibling first and then renamed over
    /// the old one, so a crash never leaves a half-written state behind.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Serialization fails
    /// - The temporary file cannot be created or written
    /// - The rename over `.sync` fails
    pub fn save(&self, dir: &Path, pretty: bool) -> Result<()> {
        let path = state_path(dir);

        let mut data = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
        .context("Failed to serialize sync state")?;
        data.push(b'\n');

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        temp.write_all(&data)
            .with_context(|| format!("Failed to write state for {}", dir.display()))?;
        temp.persist(&path)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        debug!(path = %path.display(), entries = self.len(), "State saved");
        Ok(())
    }
}
