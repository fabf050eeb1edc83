// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Filesystem helpers shared by the working-copy manager: the
//! CVS-pruning content walk and the generic recursive file copy.

use std::fs;
use std::path::Path;

use crate::error::{CvsError, Result};
use crate::CVS_METADATA_DIR;

/// All file paths under `root`, relative, `/`-separated, with `CVS`
/// metadata directories pruned at every level. Sorted so the caller's
/// diff against a snapshot is deterministic.
pub fn walk_content_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    walk_into(root, "", &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_into(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(CvsError::filesystem(dir))?;
    for entry in entries {
        let entry = entry.map_err(CvsError::filesystem(dir))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        let file_type = entry.file_type().map_err(CvsError::filesystem(entry.path()))?;
        if file_type.is_dir() {
            if name == CVS_METADATA_DIR {
                continue;
            }
            walk_into(&entry.path(), &relative, out)?;
        } else {
            out.push(relative);
        }
    }
    Ok(())
}

/// Copy each named file from `src_root` into `dst_root` at the same
/// relative location, creating destination directories as needed.
pub fn copy_files(src_root: &Path, dst_root: &Path, names: &[&str]) -> Result<()> {
    for name in names {
        let src = src_root.join(name);
        let dst = dst_root.join(name);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(CvsError::filesystem(parent))?;
        }
        fs::copy(&src, &dst).map_err(CvsError::filesystem(src))?;
    }
    Ok(())
}
