use dirsync::merge::{MergeAction, Reason, plan_merge};
use dirsync::storage::{Digest, SyncState, Timestamp, VersionHistory, VersionRecord};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// A record drawn from a tiny alphabet so histories overlap often
fn record() -> impl Strategy<Value = VersionRecord> {
    (0i64..6, prop_oneof![Just("deleted"), Just("h1"), Just("h2"), Just("h3")]).prop_map(
        |(secs, digest)| VersionRecord::new(Timestamp::from_unix(secs * 10), Digest::parse(digest)),
    )
}

fn history() -> impl Strategy<Value = VersionHistory> {
    prop::collection::vec(record(), 1..5).prop_map(|records| {
        let mut iter = records.into_iter();
        let mut history = VersionHistory::new(iter.next().expect("at least one record"));
        for record in iter {
            history.prepend(record);
        }
        history
    })
}

fn state() -> impl Strategy<Value = SyncState> {
    prop::collection::btree_map(
        prop_oneof![Just("a.txt"), Just("b.txt"), Just("c.txt"), Just("d.txt")],
        history(),
        0..4,
    )
    .prop_map(|map| {
        map.into_iter()
            .map(|(key, history)| (key.to_string(), history))
            .collect()
    })
}

proptest! {
    #[test]
    fn test_every_key_converges_to_one_side(a in state(), b in state()) {
        let plan = plan_merge(&a, &b);
        let converged = plan.converged_state();

        let expected: BTreeSet<_> = a.names().chain(b.names()).collect();
        let actual: BTreeSet<_> = converged.names().collect();
        prop_assert_eq!(actual, expected);

        for resolution in &plan.resolutions {
            let from_a = a.get(&resolution.key) == Some(&resolution.converged);
            let from_b = b.get(&resolution.key) == Some(&resolution.converged);
            prop_assert!(from_a || from_b, "{} converged to neither side", resolution.key);
        }
    }

    #[test]
    fn test_tombstones_are_never_copied(a in state(), b in state()) {
        for resolution in plan_merge(&a, &b).resolutions {
            let source = match resolution.action {
                MergeAction::CopyAToB if resolution.reason != Reason::OnlyInA => a.get(&resolution.key),
                MergeAction::CopyBToA => b.get(&resolution.key),
                _ => None,
            };
            if let Some(history) = source {
                prop_assert!(!history.head().is_tombstone());
            }
        }
    }

    #[test]
    fn test_content_actions_match_converged_head(a in state(), b in state()) {
        for resolution in plan_merge(&a, &b).resolutions {
            let head = resolution.converged.head();
            match resolution.action {
                MergeAction::DeleteInA | MergeAction::DeleteInB => {
                    prop_assert!(head.is_tombstone());
                }
                MergeAction::CopyBToA => prop_assert!(!head.is_tombstone()),
                MergeAction::SetModifiedTimeA(ts) | MergeAction::SetModifiedTimeB(ts) => {
                    prop_assert_eq!(ts, head.timestamp);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_converged_state_is_a_fixed_point(a in state(), b in state()) {
        let converged = plan_merge(&a, &b).converged_state();
        let replan = plan_merge(&converged, &converged);

        prop_assert!(replan.is_noop());
        prop_assert_eq!(replan.converged_state(), converged);
    }
}
