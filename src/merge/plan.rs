//! Pure merge planning: decide one action per filename without touching disk.

use crate::storage::{SyncState, Timestamp, VersionHistory};
use std::fmt;

/// File operation needed to bring one filename into agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Both sides already agree
    None,
    /// Overwrite B's file with A's
    CopyAToB,
    /// Overwrite A's file with B's
    CopyBToA,
    /// Remove A's file
    DeleteInA,
    /// Remove B's file
    DeleteInB,
    /// Stamp A's file with the given modification time
    SetModifiedTimeA(Timestamp),
    /// Stamp B's file with the given modification time
    SetModifiedTimeB(Timestamp),
}

impl MergeAction {
    /// Whether the action changes file content or existence
    #[must_use]
    pub const fn changes_content(self) -> bool {
        matches!(
            self,
            Self::CopyAToB | Self::CopyBToA | Self::DeleteInA | Self::DeleteInB
        )
    }
}

/// Which rule produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Known only to A
    OnlyInA,
    /// Known only to B
    OnlyInB,
    /// Deleted in A and not recreated in B
    DeletedInA,
    /// Deleted in B and not recreated in A
    DeletedInB,
    /// B's content is an older version from A's history
    BStale,
    /// A's content is an older version from B's history
    AStale,
    /// A was deleted and B recreated the file after seeing the deletion
    RecreatedInB,
    /// B was deleted and A recreated the file after seeing the deletion
    RecreatedInA,
    /// Unrelated edits, A is at least as new
    DivergentAWins,
    /// Unrelated edits, B is newer
    DivergentBWins,
    /// Same content, B's time moved up to A's
    AlignedB,
    /// Same content, A's time moved up to B's
    AlignedA,
    /// Nothing to do
    Unchanged,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OnlyInA => "only in A",
            Self::OnlyInB => "only in B",
            Self::DeletedInA => "deleted in A",
            Self::DeletedInB => "deleted in B",
            Self::BStale => "B holds an older version",
            Self::AStale => "A holds an older version",
            Self::RecreatedInB => "recreated in B after deletion",
            Self::RecreatedInA => "recreated in A after deletion",
            Self::DivergentAWins => "divergent edits, A is newer",
            Self::DivergentBWins => "divergent edits, B is newer",
            Self::AlignedB => "same content, B retimed",
            Self::AlignedA => "same content, A retimed",
            Self::Unchanged => "unchanged",
        };
        f.write_str(text)
    }
}

/// Decision for one filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Filename relative to the directory pair
    pub key: String,
    /// Operation to perform
    pub action: MergeAction,
    /// Rule that fired
    pub reason: Reason,
    /// History both sides record once the action succeeds
    pub converged: VersionHistory,
}

/// Ordered resolutions for every filename known to either side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    /// One entry per key, sorted by key
    pub resolutions: Vec<Resolution>,
}

impl MergePlan {
    /// State both directories converge to when every action succeeds
    #[must_use]
    pub fn converged_state(&self) -> SyncState {
        self.resolutions
            .iter()
            .map(|r| (r.key.clone(), r.converged.clone()))
            .collect()
    }

    /// Resolutions that require a file operation
    pub fn pending(&self) -> impl Iterator<Item = &Resolution> {
        self.resolutions
            .iter()
            .filter(|r| r.action != MergeAction::None)
    }

    /// Whether no file operation is needed
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.pending().next().is_none()
    }

    /// Number of resolutions
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolutions.len()
    }

    /// Whether both states were empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolutions.is_empty()
    }
}

/// Plan the merge of two locally scanned states.
///
/// Every key of either state gets exactly one resolution. Keys present on
/// one side only are adopted from that side; keys present on both are
/// resolved by [`resolve`].
#[must_use]
pub fn plan_merge(a: &SyncState, b: &SyncState) -> MergePlan {
    let mut resolutions = Vec::with_capacity(a.len().max(b.len()));

    for (key, history_a) in a.iter() {
        let resolution = match b.get(key) {
            Some(history_b) => resolve(key, history_a, history_b),
            // Copied even when the head is a tombstone; apply reports the miss
            None => Resolution {
                key: key.clone(),
                action: MergeAction::CopyAToB,
                reason: Reason::OnlyInA,
                converged: history_a.clone(),
            },
        };
        resolutions.push(resolution);
    }

    for (key, history_b) in b.iter() {
        if a.contains(key) {
            continue;
        }
        let action = if history_b.head().is_tombstone() {
            MergeAction::None
        } else {
            MergeAction::CopyBToA
        };
        resolutions.push(Resolution {
            key: key.clone(),
            action,
            reason: Reason::OnlyInB,
            converged: history_b.clone(),
        });
    }

    resolutions.sort_by(|x, y| x.key.cmp(&y.key));
    MergePlan { resolutions }
}

/// Which history the converged record is taken from
#[derive(Clone, Copy)]
enum Winner {
    /// Side A
    A,
    /// Side B
    B,
}

/// Resolve a key known to both sides.
///
/// Rules apply in order: propagated deletions, history reconciliation for
/// differing content, timestamp alignment for equal content, no-op.
///
/// A tombstone is never a copy source. When one head is a tombstone that
/// survived the deletion rules, the other side recreated the file after
/// seeing that deletion, and the live file wins.
#[must_use]
pub fn resolve(key: &str, history_a: &VersionHistory, history_b: &VersionHistory) -> Resolution {
    let ra = history_a.head();
    let rb = history_b.head();
    let (da, db) = (&ra.digest, &rb.digest);
    let (ta, tb) = (ra.timestamp, rb.timestamp);

    let (action, reason, winner) = if da.is_deleted()
        && !db.is_deleted()
        && !history_b.has_tombstone_at(ta)
    {
        (MergeAction::DeleteInB, Reason::DeletedInA, Winner::A)
    } else if db.is_deleted() && !da.is_deleted() && !history_a.has_tombstone_at(tb) {
        (MergeAction::DeleteInA, Reason::DeletedInB, Winner::B)
    } else if da != db {
        if da.is_deleted() {
            (MergeAction::CopyBToA, Reason::RecreatedInB, Winner::B)
        } else if db.is_deleted() {
            (MergeAction::CopyAToB, Reason::RecreatedInA, Winner::A)
        } else if history_a.contains_digest(db) {
            (MergeAction::CopyAToB, Reason::BStale, Winner::A)
        } else if history_b.contains_digest(da) {
            (MergeAction::CopyBToA, Reason::AStale, Winner::B)
        } else if ta < tb {
            (MergeAction::CopyBToA, Reason::DivergentBWins, Winner::B)
        } else {
            (MergeAction::CopyAToB, Reason::DivergentAWins, Winner::A)
        }
    } else if !da.is_deleted() && tb < ta {
        (MergeAction::SetModifiedTimeB(ta), Reason::AlignedB, Winner::A)
    } else if !da.is_deleted() && tb > ta {
        (MergeAction::SetModifiedTimeA(tb), Reason::AlignedA, Winner::B)
    } else {
        (MergeAction::None, Reason::Unchanged, Winner::A)
    };

    let converged = match winner {
        Winner::A => history_a.clone(),
        Winner::B => history_b.clone(),
    };

    Resolution {
        key: key.to_string(),
        action,
        reason,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Digest, VersionRecord};
    use rstest::rstest;

    /// Build a history from `(seconds, digest)` pairs, newest first; `"deleted"`
    /// is the tombstone
    fn history(records: &[(i64, &str)]) -> VersionHistory {
        let mut iter = records.iter().rev();
        let (ts, digest) = iter.next().expect("non-empty history");
        let mut history =
            VersionHistory::new(VersionRecord::new(Timestamp::from_unix(*ts), Digest::parse(digest)));
        for (ts, digest) in iter {
            history.prepend(VersionRecord::new(Timestamp::from_unix(*ts), Digest::parse(digest)));
        }
        history
    }

    #[rstest]
    // Deletion in A propagates
    #[case(&[(30, "deleted"), (10, "h1")], &[(10, "h1")], MergeAction::DeleteInB, Reason::DeletedInA, 'A')]
    // Deletion in B propagates, converged record is B's tombstone
    #[case(&[(10, "h1")], &[(30, "deleted"), (10, "h1")], MergeAction::DeleteInA, Reason::DeletedInB, 'B')]
    // B is behind A
    #[case(&[(20, "h2"), (10, "h1")], &[(10, "h1")], MergeAction::CopyAToB, Reason::BStale, 'A')]
    // A is behind B
    #[case(&[(10, "h1")], &[(20, "h2"), (10, "h1")], MergeAction::CopyBToA, Reason::AStale, 'B')]
    // Unrelated edits, newer B wins
    #[case(&[(10, "h1")], &[(20, "h2")], MergeAction::CopyBToA, Reason::DivergentBWins, 'B')]
    // Unrelated edits, newer A wins
    #[case(&[(20, "h1")], &[(10, "h2")], MergeAction::CopyAToB, Reason::DivergentAWins, 'A')]
    // Unrelated edits at the same second, A wins
    #[case(&[(10, "h1")], &[(10, "h2")], MergeAction::CopyAToB, Reason::DivergentAWins, 'A')]
    // Same content, B older
    #[case(&[(20, "h1")], &[(10, "h1")], MergeAction::SetModifiedTimeB(Timestamp::from_unix(20)), Reason::AlignedB, 'A')]
    // Same content, A older
    #[case(&[(10, "h1")], &[(20, "h1")], MergeAction::SetModifiedTimeA(Timestamp::from_unix(20)), Reason::AlignedA, 'B')]
    // Identical
    #[case(&[(10, "h1")], &[(10, "h1")], MergeAction::None, Reason::Unchanged, 'A')]
    // Both tombstoned at different times
    #[case(&[(30, "deleted"), (10, "h1")], &[(40, "deleted"), (10, "h1")], MergeAction::None, Reason::Unchanged, 'A')]
    fn test_resolution_rules(
        #[case] a: &[(i64, &str)],
        #[case] b: &[(i64, &str)],
        #[case] action: MergeAction,
        #[case] reason: Reason,
        #[case] winner: char,
    ) {
        let (ha, hb) = (history(a), history(b));
        let resolution = resolve("x.txt", &ha, &hb);

        assert_eq!(resolution.action, action);
        assert_eq!(resolution.reason, reason);
        let expected = if winner == 'A' { ha } else { hb };
        assert_eq!(resolution.converged, expected);
    }

    #[rstest]
    // B saw A's deletion at 30 and recreated the file with new content
    #[case(&[(30, "deleted"), (10, "h1")], &[(40, "h3"), (30, "deleted"), (10, "h1")], MergeAction::CopyBToA, Reason::RecreatedInB, 'B')]
    // B restored the old content after seeing A's deletion
    #[case(&[(30, "deleted"), (10, "h1")], &[(40, "h1"), (30, "deleted"), (10, "h1")], MergeAction::CopyBToA, Reason::RecreatedInB, 'B')]
    // A saw B's deletion at 30 and recreated the file with new content
    #[case(&[(40, "h3"), (30, "deleted"), (10, "h1")], &[(30, "deleted"), (10, "h1")], MergeAction::CopyAToB, Reason::RecreatedInA, 'A')]
    // A restored the old content after seeing B's deletion
    #[case(&[(40, "h1"), (30, "deleted"), (10, "h1")], &[(30, "deleted"), (10, "h1")], MergeAction::CopyAToB, Reason::RecreatedInA, 'A')]
    fn test_recreated_blocks_deletion(
        #[case] a: &[(i64, &str)],
        #[case] b: &[(i64, &str)],
        #[case] action: MergeAction,
        #[case] reason: Reason,
        #[case] winner: char,
    ) {
        let (ha, hb) = (history(a), history(b));
        let resolution = resolve("x.txt", &ha, &hb);

        assert!(!matches!(
            resolution.action,
            MergeAction::DeleteInA | MergeAction::DeleteInB
        ));
        assert_eq!(resolution.action, action);
        assert_eq!(resolution.reason, reason);
        let expected = if winner == 'A' { ha } else { hb };
        assert_eq!(resolution.converged, expected);
        assert!(!resolution.converged.head().is_tombstone());
    }

    #[rstest]
    #[case(&[(30, "deleted"), (10, "h1")], &[(40, "h3"), (31, "deleted"), (10, "h1")], MergeAction::DeleteInB)]
    #[case(&[(40, "h3"), (31, "deleted"), (10, "h1")], &[(30, "deleted"), (10, "h1")], MergeAction::DeleteInA)]
    fn test_recreated_match_requires_exact_second(
        #[case] a: &[(i64, &str)],
        #[case] b: &[(i64, &str)],
        #[case] action: MergeAction,
    ) {
        assert_eq!(resolve("x.txt", &history(a), &history(b)).action, action);
    }

    #[test]
    fn test_one_sided_keys() {
        let mut a = SyncState::new();
        a.insert("new.txt".to_string(), history(&[(10, "h1")]));
        a.insert("ghost.txt".to_string(), history(&[(20, "deleted"), (10, "h0")]));
        let mut b = SyncState::new();
        b.insert("theirs.txt".to_string(), history(&[(10, "h2")]));
        b.insert("gone.txt".to_string(), history(&[(20, "deleted"), (10, "h3")]));

        let plan = plan_merge(&a, &b);
        let actions: Vec<_> = plan
            .resolutions
            .iter()
            .map(|r| (r.key.as_str(), r.action))
            .collect();

        assert_eq!(
            actions,
            vec![
                ("ghost.txt", MergeAction::CopyAToB),
                ("gone.txt", MergeAction::None),
                ("new.txt", MergeAction::CopyAToB),
                ("theirs.txt", MergeAction::CopyBToA),
            ]
        );

        let converged = plan.converged_state();
        assert_eq!(converged.len(), 4);
        assert_eq!(converged.get("gone.txt"), b.get("gone.txt"));
        assert_eq!(converged.get("new.txt"), a.get("new.txt"));
    }

    #[test]
    fn test_empty_states_plan_nothing() {
        let plan = plan_merge(&SyncState::new(), &SyncState::new());
        assert!(plan.is_empty());
        assert!(plan.is_noop());
    }

    #[test]
    fn test_changes_content() {
        assert!(MergeAction::CopyAToB.changes_content());
        assert!(MergeAction::DeleteInA.changes_content());
        assert!(!MergeAction::SetModifiedTimeA(Timestamp::from_unix(0)).changes_content());
        assert!(!MergeAction::None.changes_content());
    }
}
