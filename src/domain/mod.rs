//! Domain Layer - Core cleanup logic for the SoLab keeper
//!
//! This module contains pure retention logic and the filesystem cleanup
//! routines with no service-manager dependencies. All process lifecycle
//! interactions happen through the ports layer.
//!
//! - `retention`: keep-newest-N policy and the pure keep/expire split
//! - `pruner`: bounded-retention snapshot deletion, best-effort per file
//! - `sweeper`: unconditional temp-file removal
//! - `run_log`: persistent timestamped log of keeper actions

pub mod pruner;
pub mod retention;
pub mod run_log;
pub mod sweeper;

pub use pruner::{list_matching, prune, CleanupError, CleanupOutcome, DeleteFailure};
pub use retention::{
    split_retained, RetentionPolicy, SnapshotFile, DEFAULT_KEEP, DEFAULT_SNAPSHOT_PATTERN,
};
pub use run_log::RunLog;
pub use sweeper::sweep;
