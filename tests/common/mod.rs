#![allow(dead_code)]

use anyhow::Result;
use dirsync::config::Config;
use dirsync::report::SyncReport;
use dirsync::storage::{Digest, SyncState, Timestamp, state_path};
use dirsync::utils::hash::hash_bytes;
use dirsync::{SyncContext, sync};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two sibling roots inside one temporary directory
pub struct TestPair {
    pub temp_dir: TempDir,
    pub a: PathBuf,
    pub b: PathBuf,
}

impl TestPair {
    /// Create both roots, empty
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir_all(&a)?;
        fs::create_dir_all(&b)?;
        Ok(Self { temp_dir, a, b })
    }

    /// Synchronize with default settings
    pub fn sync(&self) -> Result<SyncReport> {
        self.sync_with(Config::default())
    }

    /// Synchronize with the given settings
    pub fn sync_with(&self, config: Config) -> Result<SyncReport> {
        let ctx = SyncContext::new(config)?;
        sync::synchronize(&ctx, &self.a, &self.b)
    }

    pub fn state_a(&self) -> SyncState {
        SyncState::load(&self.a)
    }

    pub fn state_b(&self) -> SyncState {
        SyncState::load(&self.b)
    }

    /// Raw `.sync` bytes of both roots
    pub fn raw_states(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        Ok((
            fs::read(state_path(&self.a))?,
            fs::read(state_path(&self.b))?,
        ))
    }
}

/// Write a file and stamp it with a modification time
pub fn write_at(path: &Path, content: &str, secs: i64) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(secs, 0))?;
    Ok(())
}

/// Modification time of a file in whole seconds
pub fn mtime(path: &Path) -> Result<i64> {
    let meta = fs::metadata(path)?;
    Ok(filetime::FileTime::from_last_modification_time(&meta).unix_seconds())
}

pub fn digest(content: &str) -> Digest {
    Digest::Content(hash_bytes(content.as_bytes()))
}

pub fn ts(secs: i64) -> Timestamp {
    Timestamp::from_unix(secs)
}
