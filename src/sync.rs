//! Tree driver: synchronize a root pair and every subdirectory pair below it.
//!
//! Each level runs scan(A), scan(B), merge, persist, and only then recurses
//! into the union of both sides' subdirectory names, once per name. Every
//! level builds its own [`PairContext`]; nothing is shared between levels
//! except the run-wide [`SyncReport`] and the set of visited directories.

use crate::SyncContext;
use crate::errors::RootError;
use crate::merge::merge;
use crate::output;
use crate::report::{FileOperation, SyncReport};
use crate::scanner::{DirectoryContext, scan};
use crate::storage::SyncState;
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span};

/// The two directories synchronized at one level of the traversal
#[derive(Debug, Clone)]
pub struct PairContext {
    /// Side A
    pub a: DirectoryContext,
    /// Side B
    pub b: DirectoryContext,
}

impl PairContext {
    /// List both directories of a pair
    ///
    /// # Errors
    ///
    /// Returns an error if either directory exists but cannot be listed
    pub fn open(ctx: &SyncContext, a: &Path, b: &Path) -> Result<Self> {
        Ok(Self {
            a: DirectoryContext::open(a, ctx.ignore(), ctx.follow_symlinks())?,
            b: DirectoryContext::open(b, ctx.ignore(), ctx.follow_symlinks())?,
        })
    }

    /// Subdirectory names seen on either side, sorted
    #[must_use]
    pub fn subdirectories(&self) -> BTreeSet<&str> {
        self.a
            .listing
            .directories
            .iter()
            .chain(&self.b.listing.directories)
            .map(String::as_str)
            .collect()
    }
}

/// Validate the two roots, creating one of them if it is missing.
///
/// # Errors
///
/// Returns [`RootError::BothMissing`] if neither root exists,
/// [`RootError::NotADirectory`] if either is an existing non-directory, or an
/// I/O error if the missing root cannot be created.
pub fn prepare_roots(a: &Path, b: &Path) -> Result<()> {
    for root in [a, b] {
        if root.exists() && !root.is_dir() {
            return Err(RootError::NotADirectory(root.to_path_buf()).into());
        }
    }

    match (a.exists(), b.exists()) {
        (false, false) => Err(RootError::BothMissing(a.to_path_buf(), b.to_path_buf()).into()),
        (true, true) => Ok(()),
        (a_exists, _) => {
            let missing = if a_exists { b } else { a };
            fs::create_dir_all(missing)
                .with_context(|| format!("Failed to create directory: {}", missing.display()))?;
            info!(path = %missing.display(), "Created missing root");
            output::info(&format!("Created {}", missing.display()));
            Ok(())
        }
    }
}

/// Synchronize two directory trees.
///
/// # Arguments
///
/// * `ctx` - Run settings (ignore patterns, dry run, symlink policy)
/// * `a` - First root
/// * `b` - Second root
///
/// # Returns
///
/// The run report. Per-file failures and failures below the top level are
/// recorded in it rather than returned.
///
/// # Errors
///
/// Returns an error if the roots fail validation, or if the top-level pair
/// cannot be listed or its state cannot be written.
pub fn synchronize(ctx: &SyncContext, a: &Path, b: &Path) -> Result<SyncReport> {
    prepare_roots(a, b)?;

    let mut report = SyncReport::new();
    let mut visited = Visited::default();
    sync_pair(ctx, a, b, &mut visited, &mut report)?;

    info!(
        directories = report.directories,
        copied = report.copied,
        deleted = report.deleted,
        retimed = report.retimed,
        issues = report.issues.len(),
        "Synchronization finished"
    );
    Ok(report)
}

/// Synchronize one directory pair, then recurse into its subdirectories
fn sync_pair(
    ctx: &SyncContext,
    a: &Path,
    b: &Path,
    visited: &mut Visited,
    report: &mut SyncReport,
) -> Result<()> {
    let span = span!(Level::INFO, "sync_pair", a = %a.display(), b = %b.display());
    let _guard = span.enter();

    if !visited.insert(a, b) {
        debug!("Directory already synchronized in this run, skipping");
        return Ok(());
    }

    let pair = PairContext::open(ctx, a, b)?;

    let local_a = scan(ctx, &pair.a, SyncState::load(a), report);
    let local_b = scan(ctx, &pair.b, SyncState::load(b), report);

    let outcome = merge(&pair, &local_a, &local_b, ctx.dry_run(), report);
    if !outcome.is_converged() {
        debug!("Some actions failed, sides keep their local histories for those files");
    }

    if !ctx.dry_run() {
        outcome.a.save(a, ctx.pretty_json())?;
        outcome.b.save(b, ctx.pretty_json())?;
        report.states_written += 2;
    }
    report.directories += 1;

    for name in pair.subdirectories() {
        let child_a = pair.a.entry_path(name);
        let child_b = pair.b.entry_path(name);

        if pair.a.listing.has_file(name) || pair.b.listing.has_file(name) {
            let error = anyhow::anyhow!("{name} is a directory on one side and a file on the other");
            report.record_issue(&child_a, FileOperation::Recurse, &error);
            continue;
        }

        if pair.a.listing.skipped_links.contains(name) || pair.b.listing.skipped_links.contains(name)
        {
            debug!(dir = %name, "Symlinked directory on one side, not following");
            continue;
        }

        if visited.contains(&child_a, &child_b) {
            debug!(dir = %name, "Symlink cycle, not descending");
            continue;
        }

        if let Err(e) = ensure_directory(&child_a, ctx.dry_run())
            .and_then(|()| ensure_directory(&child_b, ctx.dry_run()))
            .and_then(|()| sync_pair(ctx, &child_a, &child_b, visited, report))
        {
            report.record_issue(&child_a, FileOperation::Recurse, &e);
        }
    }

    Ok(())
}

/// Create a subdirectory that exists only on the other side
fn ensure_directory(path: &Path, dry_run: bool) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if !dry_run {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    output::action(
        if dry_run { "create" } else { "created" },
        &path.display().to_string(),
        dry_run,
    );
    Ok(())
}

/// Canonical directories already synchronized, per side.
///
/// A directory reached a second time through a symlink is never entered
/// again on either side, which bounds the traversal on cyclic trees.
#[derive(Debug, Default)]
struct Visited {
    /// Side A directories
    a: HashSet<PathBuf>,
    /// Side B directories
    b: HashSet<PathBuf>,
}

impl Visited {
    /// Whether either directory was already synchronized
    fn contains(&self, a: &Path, b: &Path) -> bool {
        self.a.contains(&canonical(a)) || self.b.contains(&canonical(b))
    }

    /// Mark a pair as synchronized; false if either side was seen before
    fn insert(&mut self, a: &Path, b: &Path) -> bool {
        if self.contains(a, b) {
            return false;
        }
        self.a.insert(canonical(a));
        self.b.insert(canonical(b));
        true
    }
}

/// Resolve symlinks, falling back to the path as given when it is missing
fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
