// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Context resolution for cvsync.
//!
//! A working copy is bound to a (repository, branch, user) triple; this
//! crate answers the four questions the manager asks about that triple:
//! where the CVS module lives, where the branch checkout belongs on
//! disk, which connection root the user reaches the repository with, and
//! where the repository's command log goes.

pub mod config;
pub mod error;

pub use config::{Config, RepositoryConfig};
pub use error::{ConfigError, Result};

use std::path::PathBuf;

/// Context-provider seam between configuration and the working-copy
/// manager. Implemented by [`Config`] in production and by fixtures in
/// tests.
pub trait SyncContext {
    /// CVS module path inside the repository.
    fn cvs_location(&self, repo: &str) -> Result<String>;

    /// Per-branch checkout directory. Each branch gets its own checkout
    /// because switching branches in place is slow and unreliable.
    fn checkout_dir(&self, repo: &str, branch: &str) -> Result<PathBuf>;

    /// Connection root (CVSROOT string) for the repository, resolved for
    /// one user. May embed credentials or host information.
    fn cvs_root(&self, repo: &str, user: &str) -> Result<String>;

    /// Command-log destination for the repository, one log per repo.
    fn log_path(&self, repo: &str) -> Result<PathBuf>;
}
