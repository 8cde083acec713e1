//! Retention Policy
//!
//! Keep-newest-N selection over snapshot files. The policy itself is pure
//! data and the keep/expire split is a pure function over an in-memory
//! listing, so ordering rules are testable without a filesystem.

use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

/// Default filename pattern for analysis snapshots
pub const DEFAULT_SNAPSHOT_PATTERN: &str = "toptraded_*";

/// Default number of snapshots to retain
pub const DEFAULT_KEEP: usize = 2;

/// A keep-newest-N retention rule for one filename pattern
#[derive(Debug, Clone, Serialize)]
pub struct RetentionPolicy {
    /// Shell-glob filename pattern identifying snapshot files
    pub pattern: String,
    /// Number of most-recently-modified matches to keep
    pub keep: usize,
}

impl RetentionPolicy {
    /// Create a policy keeping the `keep` newest files matching `pattern`
    pub fn new(pattern: impl Into<String>, keep: usize) -> Self {
        Self {
            pattern: pattern.into(),
            keep,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_PATTERN, DEFAULT_KEEP)
    }
}

/// One snapshot file as seen during a single pruning pass.
///
/// Nothing here outlives the pass; the listing is recomputed from the
/// directory on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime, size: u64) -> Self {
        Self {
            path: path.into(),
            modified,
            size,
        }
    }
}

/// Split a listing into the files to keep and the files that have expired.
///
/// Files are ordered most-recently-modified first; equal mtimes are broken
/// by ascending path so repeated runs over the same directory state select
/// the same survivors. The first `keep` entries are retained, the remainder
/// expire. A listing of `keep` or fewer files expires nothing.
pub fn split_retained(
    mut files: Vec<SnapshotFile>,
    keep: usize,
) -> (Vec<SnapshotFile>, Vec<SnapshotFile>) {
    files.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.path.cmp(&b.path))
    });

    if files.len() <= keep {
        return (files, Vec::new());
    }

    let expired = files.split_off(keep);
    (files, expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snap(name: &str, secs_after_epoch: u64) -> SnapshotFile {
        SnapshotFile::new(
            PathBuf::from(name),
            SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch),
            100,
        )
    }

    #[test]
    fn test_keeps_newest_n() {
        let files = vec![
            snap("toptraded_a.yaml", 100),
            snap("toptraded_b.yaml", 300),
            snap("toptraded_c.yaml", 200),
            snap("toptraded_d.yaml", 400),
            snap("toptraded_e.yaml", 50),
        ];

        let (kept, expired) = split_retained(files, 2);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].path, PathBuf::from("toptraded_d.yaml"));
        assert_eq!(kept[1].path, PathBuf::from("toptraded_b.yaml"));

        assert_eq!(expired.len(), 3);
        assert_eq!(expired[0].path, PathBuf::from("toptraded_c.yaml"));
        assert_eq!(expired[1].path, PathBuf::from("toptraded_a.yaml"));
        assert_eq!(expired[2].path, PathBuf::from("toptraded_e.yaml"));
    }

    #[test]
    fn test_count_at_or_below_keep_expires_nothing() {
        let files = vec![snap("a", 1), snap("b", 2)];
        let (kept, expired) = split_retained(files, 2);
        assert_eq!(kept.len(), 2);
        assert!(expired.is_empty());

        let files = vec![snap("a", 1)];
        let (kept, expired) = split_retained(files, 2);
        assert_eq!(kept.len(), 1);
        assert!(expired.is_empty());
    }

    #[test]
    fn test_empty_listing() {
        let (kept, expired) = split_retained(Vec::new(), 2);
        assert!(kept.is_empty());
        assert!(expired.is_empty());
    }

    #[test]
    fn test_keep_zero_expires_all() {
        let files = vec![snap("a", 1), snap("b", 2), snap("c", 3)];
        let (kept, expired) = split_retained(files, 0);
        assert!(kept.is_empty());
        assert_eq!(expired.len(), 3);
    }

    #[test]
    fn test_mtime_ties_broken_by_ascending_path() {
        let files = vec![snap("c", 100), snap("a", 100), snap("b", 100)];

        let (kept, expired) = split_retained(files, 2);

        assert_eq!(kept[0].path, PathBuf::from("a"));
        assert_eq!(kept[1].path, PathBuf::from("b"));
        assert_eq!(expired[0].path, PathBuf::from("c"));
    }

    #[test]
    fn test_selection_is_stable_across_runs() {
        let files = vec![
            snap("b", 100),
            snap("a", 100),
            snap("d", 200),
            snap("c", 200),
        ];

        let (kept_once, _) = split_retained(files, 2);
        // A second pass over the survivors must keep exactly the same set.
        let (kept_twice, expired_twice) = split_retained(kept_once.clone(), 2);

        assert_eq!(kept_once, kept_twice);
        assert!(expired_twice.is_empty());
    }
}
