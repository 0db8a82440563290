//! Execute a merge plan against a directory pair.

use super::plan::{MergeAction, MergePlan, Reason, Resolution};
use crate::output;
use crate::report::{FileOperation, SyncReport};
use crate::storage::SyncState;
use crate::sync::PairContext;
use crate::utils::file_ops;
use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

/// States to persist on each side after applying a plan.
///
/// Both sides hold the converged state when every action succeeded. When an
/// action failed, each side keeps its own local history for that key so the
/// next run sees the file as it really is rather than as planned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// State to write to A's `.sync`
    pub a: SyncState,
    /// State to write to B's `.sync`
    pub b: SyncState,
}

impl MergeOutcome {
    /// Whether both sides ended with the same state
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.a == self.b
    }
}

/// Apply every resolution in `plan`.
///
/// Failures are recorded in `report` and never stop the remaining actions.
/// With `dry_run` no file is touched; actions are only printed and counted.
pub fn apply_plan(
    pair: &PairContext,
    plan: MergePlan,
    local_a: &SyncState,
    local_b: &SyncState,
    dry_run: bool,
    report: &mut SyncReport,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for resolution in plan.resolutions {
        if resolution.action != MergeAction::None {
            debug!(
                file = %resolution.key,
                action = ?resolution.action,
                reason = %resolution.reason,
                "Resolved"
            );
        }

        let result = if dry_run {
            Ok(())
        } else {
            execute(pair, &resolution)
        };

        match result {
            Ok(()) => {
                if !dry_run {
                    stamp_copy(pair, &resolution, report);
                }
                count(&resolution, report);
                announce(pair, &resolution, dry_run);
                outcome.a.insert(resolution.key.clone(), resolution.converged.clone());
                outcome.b.insert(resolution.key, resolution.converged);
            }
            Err(e) => {
                let (operation, path) = target(pair, &resolution);
                report.record_issue(&path, operation, &e);

                if resolution.reason == Reason::OnlyInA && resolution.converged.head().is_tombstone() {
                    // Nothing to copy, and B lacking the file matches the tombstone
                    outcome.a.insert(resolution.key.clone(), resolution.converged.clone());
                    outcome.b.insert(resolution.key, resolution.converged);
                    continue;
                }
                if let Some(history) = local_a.get(&resolution.key) {
                    outcome.a.insert(resolution.key.clone(), history.clone());
                }
                if let Some(history) = local_b.get(&resolution.key) {
                    outcome.b.insert(resolution.key, history.clone());
                }
            }
        }
    }

    outcome
}

/// Perform the file operation of one resolution
fn execute(pair: &PairContext, resolution: &Resolution) -> Result<()> {
    let a = pair.a.entry_path(&resolution.key);
    let b = pair.b.entry_path(&resolution.key);

    match resolution.action {
        MergeAction::None => Ok(()),
        MergeAction::CopyAToB => file_ops::copy_file(&a, &b).map(|_| ()),
        MergeAction::CopyBToA => file_ops::copy_file(&b, &a).map(|_| ()),
        MergeAction::DeleteInA => file_ops::remove_file(&a),
        MergeAction::DeleteInB => file_ops::remove_file(&b),
        MergeAction::SetModifiedTimeA(ts) => file_ops::set_modified_time(&a, ts),
        MergeAction::SetModifiedTimeB(ts) => file_ops::set_modified_time(&b, ts),
    }
}

/// Give a freshly copied file the converged head timestamp.
///
/// The content already matches the converged history, so a failure here is
/// reported without undoing the copy.
fn stamp_copy(pair: &PairContext, resolution: &Resolution, report: &mut SyncReport) {
    let destination = match resolution.action {
        MergeAction::CopyAToB => pair.b.entry_path(&resolution.key),
        MergeAction::CopyBToA => pair.a.entry_path(&resolution.key),
        _ => return,
    };

    let stamp = resolution.converged.head().timestamp;
    if let Err(e) = file_ops::set_modified_time(&destination, stamp) {
        report.record_issue(&destination, FileOperation::SetModifiedTime, &e);
    }
}

/// Operation kind and path blamed when a resolution fails
fn target(pair: &PairContext, resolution: &Resolution) -> (FileOperation, PathBuf) {
    let a = pair.a.entry_path(&resolution.key);
    let b = pair.b.entry_path(&resolution.key);

    match resolution.action {
        MergeAction::CopyAToB => (FileOperation::Copy, a),
        MergeAction::CopyBToA => (FileOperation::Copy, b),
        MergeAction::DeleteInA => (FileOperation::Delete, a),
        MergeAction::DeleteInB => (FileOperation::Delete, b),
        MergeAction::SetModifiedTimeA(_) => (FileOperation::SetModifiedTime, a),
        MergeAction::SetModifiedTimeB(_) | MergeAction::None => {
            (FileOperation::SetModifiedTime, b)
        }
    }
}

/// Update run counters for a successful action
fn count(resolution: &Resolution, report: &mut SyncReport) {
    match resolution.action {
        MergeAction::None => {}
        MergeAction::CopyAToB | MergeAction::CopyBToA => report.copied += 1,
        MergeAction::DeleteInA | MergeAction::DeleteInB => report.deleted += 1,
        MergeAction::SetModifiedTimeA(_) | MergeAction::SetModifiedTimeB(_) => report.retimed += 1,
    }
}

/// Print a user-facing line for a successful action
fn announce(pair: &PairContext, resolution: &Resolution, dry_run: bool) {
    let a = pair.a.entry_path(&resolution.key);
    let b = pair.b.entry_path(&resolution.key);

    let (past, present, message) = match resolution.action {
        MergeAction::None => return,
        MergeAction::CopyAToB => (
            "copied",
            "copy",
            format!("{} -> {}", a.display(), b.display()),
        ),
        MergeAction::CopyBToA => (
            "copied",
            "copy",
            format!("{} -> {}", b.display(), a.display()),
        ),
        MergeAction::DeleteInA => ("deleted", "delete", a.display().to_string()),
        MergeAction::DeleteInB => ("deleted", "delete", b.display().to_string()),
        MergeAction::SetModifiedTimeA(ts) => ("retimed", "retime", format!("{} to {ts}", a.display())),
        MergeAction::SetModifiedTimeB(ts) => ("retimed", "retime", format!("{} to {ts}", b.display())),
    };

    if resolution.action.changes_content() {
        output::action(if dry_run { present } else { past }, &message, dry_run);
    } else {
        output::verbose(&format!(
            "{}{} {message}",
            if dry_run { "would " } else { "" },
            if dry_run { present } else { past }
        ));
    }
}
