// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! cvsync CLI - command-line driver for per-branch CVS working copies
//!
//! Each subcommand resolves the (repository, branch, user) context from
//! the configuration file, builds a working-copy manager over the real
//! shell runner, and invokes exactly one operation. Diff computation and
//! sequencing of add/delete calls across a sync cycle belong to the
//! caller, not to this binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use cvsync_config::Config;
use cvsync_cvs::CvsCheckout;
use cvsync_exec::ShellRunner;
use cvsync_logging::{CliLogLevel, LogFormat};

#[derive(Parser)]
#[command(name = "cvsync", about = "Sync external snapshots into CVS branch checkouts", version)]
pub struct Cli {
    /// Path to the configuration file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log verbosity level
    #[arg(long, global = true, value_enum, default_value_t = CliLogLevel::Info)]
    pub log_level: CliLogLevel,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plaintext)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Context shared by every subcommand: which working copy to touch.
#[derive(Args, Clone, Debug)]
pub struct TargetArgs {
    /// Repository name from the configuration file
    #[arg(long)]
    pub repo: String,

    /// Branch tag the working copy tracks
    #[arg(long)]
    pub branch: String,

    /// Username used to resolve the connection root
    #[arg(long, env = "USER")]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the branch working copy
    Checkout {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Materialize branch content into a directory, without CVS metadata
    Export {
        #[command(flatten)]
        target: TargetArgs,
        /// Destination directory; its parent must exist
        #[arg(long)]
        to: PathBuf,
    },
    /// Pull remote changes into the working copy
    Update {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Write a diff report into the repository command log
    Diff {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// List content files in the working copy, one per line
    ListFiles {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Commit pending changes to the branch
    Commit {
        #[command(flatten)]
        target: TargetArgs,
        /// Commit message
        #[arg(long, short)]
        message: String,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = load_config(self.config.as_deref())?;
        match self.command {
            Commands::Checkout { target } => {
                let checkout = manager(&config, &target)?;
                if let Some(parent) = checkout.path().parent() {
                    // The manager requires the parent to exist; creating
                    // it is this driver's half of the contract.
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                checkout.checkout()?;
                Ok(())
            }
            Commands::Export { target, to } => {
                manager(&config, &target)?.export(&to)?;
                Ok(())
            }
            Commands::Update { target } => {
                manager(&config, &target)?.update()?;
                Ok(())
            }
            Commands::Diff { target } => {
                manager(&config, &target)?.info_diff()?;
                Ok(())
            }
            Commands::ListFiles { target } => {
                for file in manager(&config, &target)?.list_content_files()? {
                    println!("{}", file);
                }
                Ok(())
            }
            Commands::Commit { target, message } => {
                manager(&config, &target)?.commit(&message)?;
                Ok(())
            }
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    debug!(config = %path.display(), "loading configuration");
    Config::load(&path).with_context(|| format!("loading configuration from {}", path.display()))
}

fn manager(config: &Config, target: &TargetArgs) -> anyhow::Result<CvsCheckout> {
    Ok(CvsCheckout::new(
        config,
        Box::new(ShellRunner::new()),
        &target.repo,
        &target.branch,
        &target.user,
    )?)
}
