// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The per-branch CVS working-copy manager.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use cvsync_config::SyncContext;
use cvsync_exec::{scope, CommandLog, CommandRunner};

use crate::error::{CvsError, Result};
use crate::{fsutil, CVS_METADATA_DIR};

/// `cvs diff` reports "differences found" through this exit status; it
/// carries a result, not an error.
const DIFFERENCES_FOUND: i32 = 1;

/// Rewrite applied by [`CvsCheckout::disable_log_keyword`]: the revision
/// log marker becomes an inert placeholder so keyword expansion cannot
/// churn file content between tools.
const LOG_KEYWORD_REWRITE: &str = r"s/\$Log.*\$/OldLog:/g";

/// One CVS working copy, bound to one (repository, branch, user) triple.
///
/// Checkout and export address the repository through the connection
/// root resolved at construction; every other operation runs inside the
/// checkout, where the CVS client reads the root back out of its own
/// `CVS/` metadata. Directory-scoped operations use the process working
/// directory, so interleave operations on different checkouts from a
/// single thread only.
pub struct CvsCheckout {
    location: String,
    path: PathBuf,
    base_name: String,
    branch: String,
    root: String,
    log: CommandLog,
    runner: Box<dyn CommandRunner>,
}

impl CvsCheckout {
    /// Resolve the context for (repo, branch, user) and open the
    /// repository command log at its configured path.
    pub fn new(
        ctx: &dyn SyncContext,
        runner: Box<dyn CommandRunner>,
        repo: &str,
        branch: &str,
        user: &str,
    ) -> Result<Self> {
        let log_path = ctx.log_path(repo)?;
        let log = CommandLog::append_to_file(&log_path).map_err(CvsError::filesystem(log_path))?;
        Self::with_log(ctx, runner, log, repo, branch, user)
    }

    /// Like [`CvsCheckout::new`] but with an injected log sink.
    pub fn with_log(
        ctx: &dyn SyncContext,
        runner: Box<dyn CommandRunner>,
        log: CommandLog,
        repo: &str,
        branch: &str,
        user: &str,
    ) -> Result<Self> {
        let path = ctx.checkout_dir(repo, branch)?;
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CvsError::InvalidCheckoutPath(path.clone()))?;
        Ok(Self {
            location: ctx.cvs_location(repo)?,
            root: ctx.cvs_root(repo, user)?,
            path,
            base_name,
            branch: branch.to_string(),
            log,
            runner,
        })
    }

    /// Checkout directory for this branch.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Branch tag this working copy tracks.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Connection root override for the commands that address the
    /// repository directly. Applied to the child process only.
    fn cvs_env(&self) -> [(&str, &str); 1] {
        [("CVSROOT", self.root.as_str())]
    }

    /// Materialize the branch content into `target_dir` with keyword
    /// expansion disabled and no `CVS/` metadata. Retains no checkout
    /// state; `target_dir`'s parent must exist.
    pub fn export(&self, target_dir: &Path) -> Result<()> {
        info!(dir = %target_dir.display(), branch = %self.branch, "exporting branch content");
        let target = target_dir.display().to_string();
        self.runner.run(
            &self.log,
            "cvs",
            &[
                "export",
                "-kk",
                "-d",
                &target,
                "-r",
                &self.branch,
                &self.location,
            ],
            &self.cvs_env(),
        )?;
        Ok(())
    }

    /// Create the checkout directory as a live working copy tracking the
    /// branch, keyword expansion disabled. The path must not pre-exist;
    /// its parent must.
    pub fn checkout(&self) -> Result<()> {
        info!(path = %self.path.display(), branch = %self.branch, "checking out branch");
        let parent = self
            .path
            .parent()
            .ok_or_else(|| CvsError::InvalidCheckoutPath(self.path.clone()))?;
        scope::in_dir(parent, || {
            self.runner.run(
                &self.log,
                "cvs",
                &[
                    "checkout",
                    "-kk",
                    "-d",
                    &self.base_name,
                    "-r",
                    &self.branch,
                    &self.location,
                ],
                &self.cvs_env(),
            )?;
            Ok(())
        })
    }

    /// All file paths under the checkout, relative, excluding `CVS`
    /// metadata directories at every level.
    pub fn list_content_files(&self) -> Result<Vec<String>> {
        fsutil::walk_content_files(&self.path)
    }

    /// Replace the revision-log keyword marker in each named file with
    /// an inert placeholder, in place. Files without the marker are left
    /// byte-for-byte unchanged.
    pub fn disable_log_keyword(&self, files: &[&str]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        scope::in_dir(&self.path, || {
            let mut args = vec!["-i", "-r", LOG_KEYWORD_REWRITE];
            args.extend_from_slice(files);
            self.runner.run(&self.log, "sed", &args, &[])?;
            Ok(())
        })
    }

    /// Produce a diff report into the command log. CVS signals
    /// "differences found" with a nonzero exit status, which is a
    /// result here, not a failure; unrelated failure statuses still
    /// error.
    pub fn info_diff(&self) -> Result<()> {
        scope::in_dir(&self.path, || {
            self.runner.run_tolerating(
                &self.log,
                "cvs",
                &["diff"],
                &[],
                &[DIFFERENCES_FOUND],
            )?;
            Ok(())
        })
    }

    /// Pull remote changes into the working copy, including new
    /// directories.
    pub fn update(&self) -> Result<()> {
        debug!(path = %self.path.display(), "updating working copy");
        scope::in_dir(&self.path, || {
            self.runner.run(&self.log, "cvs", &["update", "-d"], &[])?;
            Ok(())
        })
    }

    /// Remove each named file from disk, then mark all of them removed
    /// in CVS with a single batched call. An empty list is a no-op.
    ///
    /// The two steps are not atomic: a crash between them leaves the
    /// file absent from disk but still tracked, requiring manual
    /// reconciliation.
    pub fn delete_files(&self, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        debug!(count = names.len(), "deleting files from working copy");
        scope::in_dir(&self.path, || {
            for name in names {
                std::fs::remove_file(name).map_err(CvsError::filesystem(self.path.join(name)))?;
            }
            let mut args = vec!["remove"];
            args.extend_from_slice(names);
            self.runner.run(&self.log, "cvs", &args, &[])?;
            Ok(())
        })
    }

    /// Copy each named file from `source_dir` into the checkout at the
    /// same relative location. Call [`CvsCheckout::add_files`] afterwards
    /// for files being added rather than updated; this method does not
    /// decide which is which.
    pub fn copy_files(&self, source_dir: &Path, names: &[&str]) -> Result<()> {
        fsutil::copy_files(source_dir, &self.path, names)
    }

    /// Register each named directory with CVS, ensuring every ancestor
    /// is registered first. A directory whose `CVS/` metadata already
    /// exists is skipped, so re-invocation is a no-op.
    pub fn add_directories(&self, names: &[&str]) -> Result<()> {
        scope::in_dir(&self.path, || {
            for name in names {
                self.add_directory(name)?;
            }
            Ok(())
        })
    }

    // Runs with the checkout as the working directory.
    fn add_directory(&self, name: &str) -> Result<()> {
        if let Some(parent) = parent_component(name) {
            if !Path::new(parent).join(CVS_METADATA_DIR).exists() {
                self.add_directory(parent)?;
            }
        }
        if !Path::new(name).join(CVS_METADATA_DIR).exists() {
            // CVS registers existing directories only.
            std::fs::create_dir_all(name).map_err(CvsError::filesystem(self.path.join(name)))?;
            self.runner.run(&self.log, "cvs", &["add", name], &[])?;
        }
        Ok(())
    }

    /// Register each named file with CVS with keyword expansion
    /// disabled. Parent directories must already be registered. An
    /// empty list is a no-op.
    pub fn add_files(&self, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        scope::in_dir(&self.path, || {
            let mut args = vec!["add", "-kk"];
            args.extend_from_slice(names);
            self.runner.run(&self.log, "cvs", &args, &[])?;
            Ok(())
        })
    }

    /// Commit pending changes to the branch, recursively, reading the
    /// message from a scoped temporary file. The file is removed when
    /// this returns, on success and on failure alike.
    pub fn commit(&self, message: &str) -> Result<()> {
        info!(branch = %self.branch, "committing working copy");
        scope::in_dir(&self.path, || {
            let mut message_file = tempfile::Builder::new()
                .suffix(".cvsync")
                .tempfile()
                .map_err(CvsError::CommitMessage)?;
            message_file
                .write_all(message.as_bytes())
                .map_err(CvsError::CommitMessage)?;
            message_file.flush().map_err(CvsError::CommitMessage)?;

            let message_path = message_file.path().display().to_string();
            self.runner.run(
                &self.log,
                "cvs",
                &["commit", "-r", &self.branch, "-R", "-F", &message_path],
                &[],
            )?;
            Ok(())
        })
    }
}

fn parent_component(name: &str) -> Option<&str> {
    name.rsplit_once('/')
        .map(|(parent, _)| parent)
        .filter(|parent| !parent.is_empty())
}
