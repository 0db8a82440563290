//! Version records: a timestamp paired with a content digest.
//!
//! A record is persisted as a two-element JSON array
//! `["2024-03-01 12:00:00 +0000", "<sha256 hex>"]`, where the digest may also be
//! the literal tombstone sentinel `"deleted"`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Literal digest stored in place of a hash when a file has been removed.
pub const DELETED_SENTINEL: &str = "deleted";

/// Persisted timestamp layout (`yyyy-MM-dd HH:mm:ss Z`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Wall-clock instant at second resolution.
///
/// Stored as seconds since the Unix epoch and always rendered in UTC, so the
/// bytes of a `.sync` file never depend on the host time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from seconds since the Unix epoch
    #[must_use]
    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    /// Current wall-clock time, truncated to the second
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Truncate a filesystem time to second resolution
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        Self(DateTime::<Utc>::from(time).timestamp())
    }

    /// Seconds since the Unix epoch
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0
    }

    /// Convert for use with `filetime` when stamping a file
    #[must_use]
    pub fn to_file_time(self) -> FileTime {
        FileTime::from_unix_time(self.0, 0)
    }

    /// Parse the persisted layout; any UTC offset is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not match [`TIMESTAMP_FORMAT`].
    pub fn parse(value: &str) -> Result<Self> {
        let parsed = DateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .with_context(|| format!("Invalid timestamp: {value:?}"))?;
        Ok(Self(parsed.timestamp()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp(self.0, 0) {
            Some(time) => write!(f, "{}", time.format(TIMESTAMP_FORMAT)),
            None => write!(f, "@{}", self.0),
        }
    }
}

/// Content fingerprint of a file, or the tombstone marking its removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Digest {
    /// Lowercase hex SHA-256 of the file contents
    Content(String),
    /// The file no longer exists
    Deleted,
}

impl Digest {
    /// Interpret a persisted digest string
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == DELETED_SENTINEL {
            Self::Deleted
        } else {
            Self::Content(value.to_string())
        }
    }

    /// Whether this digest is the tombstone sentinel
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// String form as written to `.sync`
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Content(hex) => hex,
            Self::Deleted => DELETED_SENTINEL,
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(hex) => write!(f, "{}", hex.get(..12).unwrap_or(hex)),
            Self::Deleted => f.write_str(DELETED_SENTINEL),
        }
    }
}

/// Wire form of a record: `[timestamp, digest]`
#[derive(Serialize, Deserialize)]
struct RawRecord(String, String);

/// One observed state of a file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct VersionRecord {
    /// When the state was observed (file modification time when available)
    pub timestamp: Timestamp,
    /// Content digest, or the tombstone
    pub digest: Digest,
}

impl VersionRecord {
    /// Create a record
    #[must_use]
    pub const fn new(timestamp: Timestamp, digest: Digest) -> Self {
        Self { timestamp, digest }
    }

    /// Create a tombstone record
    #[must_use]
    pub const fn tombstone(timestamp: Timestamp) -> Self {
        Self::new(timestamp, Digest::Deleted)
    }

    /// Whether this record marks a removal
    #[must_use]
    pub const fn is_tombstone(&self) -> bool {
        self.digest.is_deleted()
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.timestamp, self.digest)
    }
}

impl TryFrom<RawRecord> for VersionRecord {
    type Error = anyhow::Error;

    fn try_from(raw: RawRecord) -> Result<Self> {
        if raw.1.is_empty() {
            anyhow::bail!("Empty digest in version record");
        }
        Ok(Self {
            timestamp: Timestamp::parse(&raw.0)?,
            digest: Digest::parse(&raw.1),
        })
    }
}

impl From<VersionRecord> for RawRecord {
    fn from(record: VersionRecord) -> Self {
        Self(record.timestamp.to_string(), record.digest.as_str().to_string())
    }
}
