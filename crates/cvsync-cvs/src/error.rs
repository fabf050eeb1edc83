// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for working-copy operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for working-copy operations
pub type Result<T> = std::result::Result<T, CvsError>;

/// Errors that can occur while managing a CVS working copy.
///
/// No operation retries internally; every failure propagates to the
/// sync driver, which owns retry/abort decisions for the cycle.
#[derive(Debug, Error)]
pub enum CvsError {
    /// An external invocation exited nonzero (outside the tolerated
    /// diff status) or could not be spawned.
    #[error(transparent)]
    Exec(#[from] cvsync_exec::ExecError),

    /// Local file deletion, copy, or traversal failure.
    #[error("filesystem operation failed on {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stage commit message: {0}")]
    CommitMessage(std::io::Error),

    /// Construction-time context resolution failure.
    #[error(transparent)]
    Config(#[from] cvsync_config::ConfigError),

    #[error("checkout path {0} has no parent directory")]
    InvalidCheckoutPath(PathBuf),
}

impl CvsError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Filesystem { path, source }
    }
}
