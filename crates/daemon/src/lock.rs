// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive PID lock file for the watchdog.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to acquire lock at {path}: watchdog already running?")]
    Held { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Held for the lifetime of the daemon; the flock is released on drop and
/// the file removed best-effort.
pub struct LockFile {
    // NOTE(lifetime): held to maintain the exclusive flock; released on drop
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn acquire(path: PathBuf) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file =
            OpenOptions::new().create(true).write(true).truncate(false).open(&path)?;
        file.try_lock_exclusive().map_err(|_| LockError::Held { path: path.clone() })?;

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()?;

        Ok(Self { file, path })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        // flock is released with the descriptor; the file itself is advisory
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
