//! Version histories and per-directory sync state.

use super::record::{Digest, Timestamp, VersionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Newest-first sequence of records for one filename.
///
/// A history is never empty: it can only be created from a first record, and
/// deserialization rejects empty arrays. New observations are prepended;
/// nothing is ever removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<VersionRecord>", into = "Vec<VersionRecord>")]
pub struct VersionHistory(Vec<VersionRecord>);

impl VersionHistory {
    /// Start a history with its first observation
    #[must_use]
    pub fn new(first: VersionRecord) -> Self {
        Self(vec![first])
    }

    /// Last known state of the file
    #[must_use]
    pub fn head(&self) -> &VersionRecord {
        &self.0[0]
    }

    /// Record a new observation as the head
    pub fn prepend(&mut self, record: VersionRecord) {
        self.0.insert(0, record);
    }

    /// Whether any record in the history carries this digest
    #[must_use]
    pub fn contains_digest(&self, digest: &Digest) -> bool {
        self.0.iter().any(|record| &record.digest == digest)
    }

    /// Whether the history holds a tombstone stamped exactly at `timestamp`.
    ///
    /// A match means this side already accounted for a deletion at that
    /// instant, so the other side's deletion must not be propagated again.
    #[must_use]
    pub fn has_tombstone_at(&self, timestamp: Timestamp) -> bool {
        self.0
            .iter()
            .any(|record| record.is_tombstone() && record.timestamp == timestamp)
    }

    /// All records, newest first
    #[must_use]
    pub fn records(&self) -> &[VersionRecord] {
        &self.0
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<VersionRecord>> for VersionHistory {
    type Error = anyhow::Error;

    fn try_from(records: Vec<VersionRecord>) -> anyhow::Result<Self> {
        if records.is_empty() {
            anyhow::bail!("Version history must contain at least one record");
        }
        Ok(Self(records))
    }
}

impl From<VersionHistory> for Vec<VersionRecord> {
    fn from(history: VersionHistory) -> Self {
        history.0
    }
}

/// Filename to history mapping for one directory.
///
/// Keys are plain file names relative to the directory; subdirectories and the
/// `.sync` file itself never appear. Keys are kept sorted so the persisted
/// form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncState {
    /// Histories by filename
    files: BTreeMap<String, VersionHistory>,
}

impl SyncState {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History for a filename
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VersionHistory> {
        self.files.get(name)
    }

    /// Whether a filename is known
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Insert or replace a history
    pub fn insert(&mut self, name: String, history: VersionHistory) {
        self.files.insert(name, history);
    }

    /// Remove a history
    pub fn remove(&mut self, name: &str) -> Option<VersionHistory> {
        self.files.remove(name)
    }

    /// Iterate histories in filename order
    pub fn iter(&self) -> btree_map::Iter<'_, String, VersionHistory> {
        self.files.iter()
    }

    /// Known filenames in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of tracked files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl IntoIterator for SyncState {
    type Item = (String, VersionHistory);
    type IntoIter = btree_map::IntoIter<String, VersionHistory>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl FromIterator<(String, VersionHistory)> for SyncState {
    fn from_iter<I: IntoIterator<Item = (String, VersionHistory)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
