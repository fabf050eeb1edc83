// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TOML-backed configuration and the production [`SyncContext`]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::SyncContext;

/// Placeholder substituted with the requesting username in connection
/// root templates.
const USER_PLACEHOLDER: &str = "${user}";

/// One configured CVS repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    /// CVS module path inside the repository
    pub location: String,

    /// Connection root template; `${user}` is replaced with the
    /// requesting username
    pub root: String,
}

/// Top-level cvsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Base directory holding one checkout directory per (repo, branch)
    pub checkout_dir: PathBuf,

    /// Directory holding one command log per repository
    pub log_dir: PathBuf,

    /// Configured repositories by name
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// Platform default config path: `<config dir>/cvsync/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("cvsync").join("config.toml"))
    }

    fn repository(&self, repo: &str) -> Result<&RepositoryConfig> {
        self.repositories
            .get(repo)
            .ok_or_else(|| ConfigError::UnknownRepository(repo.to_string()))
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Names used as path components must actually be single components.
fn validate_component(name: &str) -> Result<&str> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..");
    if bad {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(name)
}

impl SyncContext for Config {
    fn cvs_location(&self, repo: &str) -> Result<String> {
        Ok(self.repository(repo)?.location.clone())
    }

    fn checkout_dir(&self, repo: &str, branch: &str) -> Result<PathBuf> {
        // Resolving an unknown repository fails even though the path
        // could be formed without the lookup.
        self.repository(repo)?;
        Ok(self
            .checkout_dir
            .join(validate_component(repo)?)
            .join(validate_component(branch)?))
    }

    fn cvs_root(&self, repo: &str, user: &str) -> Result<String> {
        let template = &self.repository(repo)?.root;
        Ok(template.replace(USER_PLACEHOLDER, user))
    }

    fn log_path(&self, repo: &str) -> Result<PathBuf> {
        self.repository(repo)?;
        Ok(self
            .log_dir
            .join(format!("{}.log", validate_component(repo)?)))
    }
}
