// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command runner trait and the blocking shell implementation.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{ExecError, Result};
use crate::log::CommandLog;

/// Seam between the working-copy manager and the processes it spawns.
///
/// Every invocation names its program and argument vector explicitly and
/// carries its environment overrides with it; the overrides are applied
/// to the child process only, never to this process. Exit codes listed
/// in `tolerated` are returned instead of raised, which is how callers
/// express "this nonzero status carries a result, not an error".
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, appending the transcript to `log`.
    /// Returns the exit status, which is zero or a member of `tolerated`.
    fn run_tolerating(
        &self,
        log: &CommandLog,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        tolerated: &[i32],
    ) -> Result<i32>;

    /// Run a command that must succeed.
    fn run(&self, log: &CommandLog, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<()> {
        self.run_tolerating(log, program, args, env, &[]).map(|_| ())
    }
}

/// Production runner: spawns the command synchronously and blocks until
/// it exits. The child inherits this process's working directory, which
/// is what the directory-scope helper relies on.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    /// Whether `program` can be spawned at all. Mirrors the availability
    /// probes used for optional external tools.
    pub fn is_available(program: &str) -> bool {
        Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

impl CommandRunner for ShellRunner {
    fn run_tolerating(
        &self,
        log: &CommandLog,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        tolerated: &[i32],
    ) -> Result<i32> {
        let command = render_command(program, args);
        debug!(command = %command, "running external command");
        log.record_invocation(&command)?;

        let output = Command::new(program)
            .args(args)
            .envs(env.iter().copied())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExecError::NotFound(program.to_string())
                } else {
                    ExecError::Spawn {
                        program: program.to_string(),
                        source: e,
                    }
                }
            })?;

        log.record_output(&output.stdout)?;
        log.record_output(&output.stderr)?;

        match output.status.code() {
            Some(0) => Ok(0),
            Some(code) if tolerated.contains(&code) => {
                debug!(command = %command, status = code, "tolerated nonzero exit");
                Ok(code)
            }
            Some(code) => {
                let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
                captured.push_str(&String::from_utf8_lossy(&output.stderr));
                Err(ExecError::CommandFailed {
                    command,
                    status: code,
                    output: captured,
                })
            }
            None => Err(ExecError::Terminated { command }),
        }
    }
}
