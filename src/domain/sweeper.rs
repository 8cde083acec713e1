//! Temp Sweeper
//!
//! Unconditional removal of temporary files left behind by the analysis
//! bot. Unlike the pruner there is no retention: every regular file
//! matching any of the configured patterns is deleted. Patterns are
//! independent and a pattern matching nothing is success, not an error.

use std::path::Path;

use super::pruner::{delete_all, list_matching, CleanupError, CleanupOutcome};

/// Delete all regular files in `directory` matching each pattern in order.
///
/// Counts and per-file failures accumulate across patterns; a failed
/// deletion under one pattern never stops the remaining patterns.
pub fn sweep(directory: &Path, patterns: &[String]) -> Result<CleanupOutcome, CleanupError> {
    let mut outcome = CleanupOutcome::default();

    for pattern in patterns {
        let matches = list_matching(directory, pattern)?;
        if matches.is_empty() {
            continue;
        }

        tracing::debug!(
            "Sweeping {} '{}' file(s) from {}",
            matches.len(),
            pattern,
            directory.display()
        );
        outcome.merge(delete_all(&matches));
    }

    if outcome.deleted > 0 {
        tracing::info!(
            "Swept {} temp file(s) from {}",
            outcome.deleted,
            directory.display()
        );
    }

    Ok(outcome)
}
