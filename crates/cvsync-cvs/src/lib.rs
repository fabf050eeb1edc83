// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! CVS working-copy management for cvsync.
//!
//! One [`CvsCheckout`] corresponds to exactly one (repository, branch)
//! pair, because CVS switches branches slowly and unreliably; each
//! branch therefore gets its own checkout directory. The manager holds
//! only paths and strings — all durable state lives in the filesystem
//! tree and in CVS's own per-directory `CVS/` metadata.
//!
//! The sync driver computes added/changed/removed sets externally and
//! applies them through this crate in a fixed order per cycle: checkout
//! (first run) or update, enumerate content, copy changed files,
//! register directories (parents first), register added files, remove
//! deleted files, commit. The manager never infers adds or removes.

pub mod checkout;
pub mod error;
pub mod fsutil;

pub use checkout::CvsCheckout;
pub use error::{CvsError, Result};

/// Name of the metadata directory the CVS client maintains inside every
/// tracked directory. Always excluded from content enumeration.
pub const CVS_METADATA_DIR: &str = "CVS";
