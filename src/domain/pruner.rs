//! Retention Pruner
//!
//! Deletes expired analysis snapshots from the storage directory, keeping
//! the N most-recently-modified files that match the snapshot pattern.
//! Deletion is best-effort per file: individual failures are collected into
//! the outcome rather than aborting the batch, so a stale file that cannot
//! be removed never blocks a restart.
//!
//! The pruner assumes a single caller. A file created or removed by an
//! unrelated process between listing and deletion is an accepted race; the
//! next pass picks it up.

use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::retention::{split_retained, RetentionPolicy, SnapshotFile};

/// Errors that abort a cleanup pass before any deletion happens
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("storage directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("failed to read storage directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid filename pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

/// A single failed deletion, recorded instead of raised
#[derive(Debug, Clone)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for DeleteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Result of one prune or sweep pass
#[derive(Debug, Default)]
pub struct CleanupOutcome {
    /// Files actually removed
    pub deleted: usize,
    /// Per-file failures (permission denied, vanished mid-pass, ...)
    pub errors: Vec<DeleteFailure>,
}

impl CleanupOutcome {
    /// True when every attempted deletion succeeded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold another outcome into this one
    pub fn merge(&mut self, other: CleanupOutcome) {
        self.deleted += other.deleted;
        self.errors.extend(other.errors);
    }
}

/// List regular files in `directory` whose name matches `pattern`.
///
/// Modification times are read per file rather than trusting directory
/// order. Entries that vanish between listing and stat are skipped.
pub fn list_matching(directory: &Path, pattern: &str) -> Result<Vec<SnapshotFile>, CleanupError> {
    if !directory.exists() {
        return Err(CleanupError::DirectoryNotFound(directory.to_path_buf()));
    }

    let matcher = Pattern::new(pattern).map_err(|source| CleanupError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let entries = fs::read_dir(directory).map_err(|source| CleanupError::ReadDir {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        let name = entry.file_name();
        if !matcher.matches(&name.to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                // Vanished between listing and stat
                tracing::debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        let modified = metadata
            .modified()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        files.push(SnapshotFile::new(path, modified, metadata.len()));
    }

    Ok(files)
}

/// Delete every file in `expired`, best-effort, returning the outcome
pub(crate) fn delete_all(expired: &[SnapshotFile]) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();

    for file in expired {
        match fs::remove_file(&file.path) {
            Ok(()) => {
                tracing::info!("Removed {}", file.path.display());
                outcome.deleted += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to remove {}: {}", file.path.display(), e);
                outcome.errors.push(DeleteFailure {
                    path: file.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    outcome
}

/// Prune snapshots in `directory` down to the policy's retention count.
///
/// Matches are ordered most-recently-modified first (mtime ties broken by
/// ascending path), the first `policy.keep` survive, the rest are deleted.
/// A directory with `keep` or fewer matches is a no-op with `deleted = 0`;
/// a missing directory is an error and nothing is touched.
pub fn prune(directory: &Path, policy: &RetentionPolicy) -> Result<CleanupOutcome, CleanupError> {
    let matches = list_matching(directory, &policy.pattern)?;
    let total = matches.len();

    let (kept, expired) = split_retained(matches, policy.keep);

    if expired.is_empty() {
        tracing::debug!(
            "No snapshots to prune in {} ({} matching '{}', keep {})",
            directory.display(),
            total,
            policy.pattern,
            policy.keep
        );
        return Ok(CleanupOutcome::default());
    }

    let outcome = delete_all(&expired);

    tracing::info!(
        "Pruned {} of {} '{}' snapshots in {}, kept {}",
        outcome.deleted,
        total,
        policy.pattern,
        directory.display(),
        kept.len()
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    /// Create a file and pin its mtime to a synthetic value
    fn write_snapshot(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"snapshot").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        filetime::set_file_mtime(&path, FileTime::from_system_time(mtime)).unwrap();
        path
    }

    fn matching_names(dir: &Path, pattern: &str) -> Vec<String> {
        let mut names: Vec<String> = list_matching(dir, pattern)
            .unwrap()
            .into_iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_prune_keeps_newest_two() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "toptraded_sol_1.yaml", 500);
        write_snapshot(dir.path(), "toptraded_sol_2.yaml", 400);
        write_snapshot(dir.path(), "toptraded_sol_3.yaml", 300);
        write_snapshot(dir.path(), "toptraded_sol_4.yaml", 200);
        write_snapshot(dir.path(), "toptraded_sol_5.yaml", 100);

        let policy = RetentionPolicy::new("toptraded_*", 2);
        let outcome = prune(dir.path(), &policy).unwrap();

        assert_eq!(outcome.deleted, 3);
        assert!(outcome.is_clean());
        assert_eq!(
            matching_names(dir.path(), "toptraded_*"),
            vec!["toptraded_sol_4.yaml", "toptraded_sol_5.yaml"]
        );
    }

    #[test]
    fn test_prune_ignores_non_matching_files() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "toptraded_a.yaml", 300);
        write_snapshot(dir.path(), "toptraded_b.yaml", 200);
        write_snapshot(dir.path(), "toptraded_c.yaml", 100);
        write_snapshot(dir.path(), "holders_report.yaml", 400);

        let policy = RetentionPolicy::new("toptraded_*", 1);
        let outcome = prune(dir.path(), &policy).unwrap();

        assert_eq!(outcome.deleted, 2);
        assert!(dir.path().join("holders_report.yaml").exists());
        assert!(dir.path().join("toptraded_c.yaml").exists());
    }

    #[test]
    fn test_prune_below_retention_is_noop() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "toptraded_a.yaml", 100);
        write_snapshot(dir.path(), "toptraded_b.yaml", 200);

        let policy = RetentionPolicy::new("toptraded_*", 2);
        let outcome = prune(dir.path(), &policy).unwrap();

        assert_eq!(outcome.deleted, 0);
        assert_eq!(matching_names(dir.path(), "toptraded_*").len(), 2);
    }

    #[test]
    fn test_prune_empty_directory_is_noop() {
        let dir = tempdir().unwrap();

        let policy = RetentionPolicy::default();
        let outcome = prune(dir.path(), &policy).unwrap();

        assert_eq!(outcome.deleted, 0);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_prune_keep_zero_deletes_all_matches() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "toptraded_a.yaml", 100);
        write_snapshot(dir.path(), "toptraded_b.yaml", 200);
        write_snapshot(dir.path(), "other.txt", 50);

        let policy = RetentionPolicy::new("toptraded_*", 0);
        let outcome = prune(dir.path(), &policy).unwrap();

        assert_eq!(outcome.deleted, 2);
        assert!(matching_names(dir.path(), "toptraded_*").is_empty());
        assert!(dir.path().join("other.txt").exists());
    }

    #[test]
    fn test_prune_missing_directory_fails_without_side_effects() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let policy = RetentionPolicy::default();
        let result = prune(&missing, &policy);

        assert!(matches!(
            result.unwrap_err(),
            CleanupError::DirectoryNotFound(_)
        ));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "toptraded_a.yaml", 400);
        write_snapshot(dir.path(), "toptraded_b.yaml", 300);
        write_snapshot(dir.path(), "toptraded_c.yaml", 200);
        write_snapshot(dir.path(), "toptraded_d.yaml", 100);

        let policy = RetentionPolicy::new("toptraded_*", 2);

        let first = prune(dir.path(), &policy).unwrap();
        assert_eq!(first.deleted, 2);
        let after_first = matching_names(dir.path(), "toptraded_*");

        let second = prune(dir.path(), &policy).unwrap();
        assert_eq!(second.deleted, 0);
        assert_eq!(matching_names(dir.path(), "toptraded_*"), after_first);
    }

    #[test]
    fn test_prune_skips_subdirectories() {
        let dir = tempdir().unwrap();
        write_snapshot(dir.path(), "toptraded_a.yaml", 100);
        fs::create_dir(dir.path().join("toptraded_archive")).unwrap();

        let policy = RetentionPolicy::new("toptraded_*", 0);
        let outcome = prune(dir.path(), &policy).unwrap();

        assert_eq!(outcome.deleted, 1);
        assert!(dir.path().join("toptraded_archive").is_dir());
    }

    #[test]
    fn test_list_matching_reads_real_mtimes() {
        let dir = tempdir().unwrap();
        // Written out of mtime order on purpose
        write_snapshot(dir.path(), "toptraded_newest.yaml", 10);
        write_snapshot(dir.path(), "toptraded_oldest.yaml", 1000);
        write_snapshot(dir.path(), "toptraded_middle.yaml", 500);

        let files = list_matching(dir.path(), "toptraded_*").unwrap();
        let (kept, _) = split_retained(files, 1);

        assert_eq!(
            kept[0].path.file_name().unwrap().to_string_lossy(),
            "toptraded_newest.yaml"
        );
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let dir = tempdir().unwrap();
        let policy = RetentionPolicy::new("toptraded_[", 2);

        let result = prune(dir.path(), &policy);
        assert!(matches!(
            result.unwrap_err(),
            CleanupError::InvalidPattern { .. }
        ));
    }
}
