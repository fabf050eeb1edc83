// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-repository command transcript sink.
//!
//! Every external invocation made on behalf of a repository is recorded
//! here: a header line naming the command, followed by the child's
//! captured output. The sink is opaque to the working-copy manager; it
//! only ever appends.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Append-only transcript of the commands run for one repository.
pub struct CommandLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl CommandLog {
    /// Open (or create) a log file in append mode, creating parent
    /// directories as needed.
    pub fn append_to_file(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }

    /// Wrap an arbitrary writer. Used by tests and by callers that
    /// already own a sink.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    /// Record the command line about to run.
    pub fn record_invocation(&self, command: &str) -> io::Result<()> {
        let mut sink = self.sink.lock().unwrap();
        writeln!(sink, "+ {}", command)?;
        sink.flush()
    }

    /// Append captured child output verbatim.
    pub fn record_output(&self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut sink = self.sink.lock().unwrap();
        sink.write_all(bytes)?;
        if !bytes.ends_with(b"\n") {
            sink.write_all(b"\n")?;
        }
        sink.flush()
    }
}
