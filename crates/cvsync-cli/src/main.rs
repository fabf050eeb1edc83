// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use clap::Parser;
use cvsync_cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cvsync_logging::init("cvsync", cli.log_level.into(), cli.log_format)?;
    cli.run()
}
