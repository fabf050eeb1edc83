// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for external-command execution

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for execution operations
pub type Result<T> = std::result::Result<T, ExecError>;

/// Errors that can occur while running an external command
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program does not exist on PATH.
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited nonzero (outside any tolerated set).
    /// Carries the rendered command line and its captured output so the
    /// caller can log or abort without re-running anything.
    #[error("command failed with exit status {status}: {command}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },

    /// Killed by a signal, so there is no exit status to inspect.
    #[error("command terminated by signal: {command}")]
    Terminated { command: String },

    #[error("cannot enter directory {dir}: {source}")]
    DirectoryScope {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write command log: {0}")]
    Log(#[from] std::io::Error),
}
