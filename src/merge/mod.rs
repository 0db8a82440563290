//! Two-way merge of the sync states of a directory pair.
//!
//! Merging happens in two steps:
//!
//! 1. [`plan_merge`] compares the two locally scanned states and decides,
//!    for every filename known to either side, one [`MergeAction`] and the
//!    history both sides converge to. Planning is pure.
//! 2. [`apply_plan`] performs the actions and returns the states to persist.
//!
//! For a filename known to both sides the rules are, in order:
//!
//! - a deletion on one side propagates unless the other side already
//!   recorded a deletion at that exact second (the file was recreated)
//! - differing content is resolved through history: a side whose content
//!   appears anywhere in the other's history is stale and receives the other
//!   side's file; unrelated edits go to the newer timestamp, ties to A
//! - equal content with different timestamps moves the older side's
//!   modification time up to the newer one
//! - otherwise nothing happens

/// Executing a plan against the filesystem
pub mod apply;
/// Pure per-file resolution
pub mod plan;

pub use apply::{MergeOutcome, apply_plan};
pub use plan::{MergeAction, MergePlan, Reason, Resolution, plan_merge, resolve};

use crate::report::SyncReport;
use crate::storage::SyncState;
use crate::sync::PairContext;

/// Plan and apply the merge of two local states
pub fn merge(
    pair: &PairContext,
    local_a: &SyncState,
    local_b: &SyncState,
    dry_run: bool,
    report: &mut SyncReport,
) -> MergeOutcome {
    let plan = plan_merge(local_a, local_b);
    apply_plan(pair, plan, local_a, local_b, dry_run, report)
}
