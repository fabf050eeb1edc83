// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Working-directory scope.
//!
//! The CVS client resolves its targets against the process working
//! directory, so several working-copy operations must run from inside
//! (or from the parent of) the checkout. `in_dir` saves the current
//! directory, enters the target, runs the wrapped operation, and
//! restores the original directory on every exit path, including panics.
//!
//! The working directory is process-global state: callers interleaving
//! operations on different checkouts must do so from a single thread.

use std::path::Path;

use crate::error::ExecError;

/// Run `f` with the process working directory set to `dir`, restoring
/// the previous directory afterwards regardless of outcome.
pub fn in_dir<T, E, F>(dir: &Path, f: F) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E>,
    E: From<ExecError>,
{
    let scope_err = |source| ExecError::DirectoryScope {
        dir: dir.to_path_buf(),
        source,
    };
    let previous = std::env::current_dir().map_err(scope_err)?;
    std::env::set_current_dir(dir).map_err(scope_err)?;
    let _restore = scopeguard::guard(previous, |previous| {
        let _ = std::env::set_current_dir(previous);
    });
    f()
}
