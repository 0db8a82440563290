//! Change detection for a single directory.
//!
//! [`scan`] reconciles what is on disk with the histories persisted in the
//! directory's `.sync`, producing the directory's local state for this run:
//!
//! 1. Every known filename is re-fingerprinted. An unchanged file keeps its
//!    history and gets its modification time reset to the recorded one; a
//!    changed or vanished file gets a new head record.
//! 2. Every live file without a history starts a single-record history.
//!
//! Nothing is persisted here; the state is written only after the merge.

/// One-level directory listing and per-level directory context
pub mod listing;

pub use listing::{DirectoryContext, DirectoryListing, list_directory};

use crate::SyncContext;
use crate::report::{FileOperation, SyncReport};
use crate::storage::{Digest, SyncState, Timestamp, VersionHistory, VersionRecord};
use crate::utils::file_ops;
use crate::utils::hash::try_digest_of;
use std::path::Path;
use tracing::{Level, debug, span};

/// Produce the local state of `dir` from its persisted `prior` state.
///
/// Per-file failures are recorded in `report` and leave that file's prior
/// history untouched.
pub fn scan(
    ctx: &SyncContext,
    dir: &DirectoryContext,
    prior: SyncState,
    report: &mut SyncReport,
) -> SyncState {
    let span = span!(Level::DEBUG, "scan", dir = %dir.path.display());
    let _guard = span.enter();

    let mut state = SyncState::new();

    for (name, mut history) in prior {
        if ctx.ignore().is_ignored(&name) {
            debug!(file = %name, "Dropping history of ignored file");
            continue;
        }

        let path = dir.entry_path(&name);
        let digest = if dir.listing.has_directory(&name) {
            // Replaced by a directory: the file is gone
            Digest::Deleted
        } else {
            match try_digest_of(&path) {
                Ok(digest) => digest,
                Err(e) => {
                    report.record_issue(&path, FileOperation::Hash, &e);
                    state.insert(name, history);
                    continue;
                }
            }
        };

        let head = history.head().clone();
        if digest == head.digest {
            if !digest.is_deleted() && !ctx.dry_run() {
                // Normalize drift so later timestamp comparisons are meaningful
                if let Err(e) = file_ops::set_modified_time(&path, head.timestamp) {
                    report.record_issue(&path, FileOperation::SetModifiedTime, &e);
                }
            }
        } else {
            let timestamp = observed_time(&path, &digest, report);
            debug!(file = %name, from = %head.digest, to = %digest, %timestamp, "Changed");
            history.prepend(VersionRecord::new(timestamp, digest));
        }

        state.insert(name, history);
    }

    for name in &dir.listing.files {
        if state.contains(name) {
            continue;
        }

        let path = dir.entry_path(name);
        match try_digest_of(&path) {
            Ok(Digest::Deleted) => {
                debug!(file = %name, "Vanished before it could be hashed");
            }
            Ok(digest) => {
                let timestamp = observed_time(&path, &digest, report);
                debug!(file = %name, %digest, %timestamp, "New file");
                state.insert(
                    name.clone(),
                    VersionHistory::new(VersionRecord::new(timestamp, digest)),
                );
            }
            Err(e) => report.record_issue(&path, FileOperation::Hash, &e),
        }
    }

    state
}

/// Timestamp for a fresh observation: the file's own modification time when
/// it still exists, otherwise the current wall-clock time.
fn observed_time(path: &Path, digest: &Digest, report: &mut SyncReport) -> Timestamp {
    if digest.is_deleted() {
        return Timestamp::now();
    }
    match file_ops::modified_time(path) {
        Ok(timestamp) => timestamp,
        Err(e) => {
            report.record_issue(path, FileOperation::ReadMetadata, &e);
            Timestamp::now()
        }
    }
}
