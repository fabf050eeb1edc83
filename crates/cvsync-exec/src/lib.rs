// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! External-command execution for cvsync.
//!
//! This crate provides the process-invocation seam the working-copy
//! manager runs the CVS client (and sed) through: a [`CommandRunner`]
//! trait with a blocking [`ShellRunner`] implementation, a per-repository
//! [`CommandLog`] transcript sink, and the working-directory scope helper
//! used by operations that the CVS client expects to run from inside a
//! checkout.

pub mod error;
pub mod log;
pub mod runner;
pub mod scope;

pub use error::{ExecError, Result};
pub use log::CommandLog;
pub use runner::{CommandRunner, ShellRunner};

/// In-memory command logs for tests
pub mod test_support {
    use std::sync::{Arc, Mutex};

    use crate::log::CommandLog;

    /// Shared byte buffer that a [`CommandLog`] can write into, so tests
    /// can assert on the transcript a runner produced.
    #[derive(Clone, Default)]
    pub struct LogBuffer {
        bytes: Arc<Mutex<Vec<u8>>>,
    }

    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        pub fn new() -> Self {
            Self::default()
        }

        /// A log that appends into this buffer.
        pub fn log(&self) -> CommandLog {
            CommandLog::from_writer(BufferWriter(self.bytes.clone()))
        }

        /// Everything logged so far, lossily decoded.
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
        }
    }
}
