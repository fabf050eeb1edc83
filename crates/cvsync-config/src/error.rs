// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for context resolution

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading configuration or resolving a
/// (repository, branch, user) context
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown repository: {0}")]
    UnknownRepository(String),

    /// Repository and branch names become path components under the
    /// checkout root, so separators and dot-names are rejected.
    #[error("invalid name {0:?}: must be a single path component")]
    InvalidName(String),

    #[error("could not determine config directory")]
    NoConfigDir,
}
