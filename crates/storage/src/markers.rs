// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small coordination markers kept as plain files.
//!
//! Each marker is rewritten whole via temp-file-plus-rename, so readers in
//! other processes see either the old contents or the new, never a torn
//! write. A corrupt marker is treated as absent (fail-open) and cleared.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ovs_core::{sanitize_name, PendingNudge};

use crate::Result;

/// Atomically replace `path` with `bytes`.
///
/// The temp name carries the writer's pid so concurrent writers in separate
/// processes never collide on the staging file.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let tmp = path.with_file_name(format!("{}.{}.tmp", file_name, std::process::id()));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

fn read_optional(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Per-recipient pending-nudge markers under `pending-nudges/`.
#[derive(Debug, Clone)]
pub struct PendingNudges {
    dir: PathBuf,
}

impl PendingNudges {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn marker_path(&self, recipient: &str) -> PathBuf {
        self.dir.join(sanitize_name(recipient))
    }

    /// Overwrites any existing marker; only the latest nudge matters.
    pub fn write(&self, recipient: &str, nudge: &PendingNudge) -> Result<()> {
        let bytes = serde_json::to_vec(nudge)?;
        write_atomic(&self.marker_path(recipient), &bytes)?;
        Ok(())
    }

    /// Read and remove the marker in one step.
    pub fn read_and_clear(&self, recipient: &str) -> Result<Option<PendingNudge>> {
        let path = self.marker_path(recipient);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        // Remove before parsing; a corrupt marker must not wedge the poll loop.
        let _ = std::fs::remove_file(&path);
        match serde_json::from_slice(&bytes) {
            Ok(nudge) => Ok(Some(nudge)),
            Err(e) => {
                tracing::warn!(recipient, error = %e, "discarding corrupt nudge marker");
                Ok(None)
            }
        }
    }

    /// Read without clearing (status surfaces only).
    pub fn peek(&self, recipient: &str) -> Result<Option<PendingNudge>> {
        let Some(bytes) = read_optional(&self.marker_path(recipient))? else {
            return Ok(None);
        };
        Ok(serde_json::from_slice(&bytes).ok())
    }
}

/// Mapping from agent name to last mail-check epoch millis, rewritten whole
/// on every update.
#[derive(Debug, Clone)]
pub struct MailCheckState {
    path: PathBuf,
}

impl MailCheckState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<HashMap<String, u64>> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(HashMap::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt mail-check state");
                Ok(HashMap::new())
            }
        }
    }

    pub fn last_check(&self, agent: &str) -> Result<Option<u64>> {
        Ok(self.load()?.get(agent).copied())
    }

    pub fn record_check(&self, agent: &str, now_ms: u64) -> Result<()> {
        let mut map = self.load()?;
        map.insert(agent.to_string(), now_ms);
        write_atomic(&self.path, &serde_json::to_vec(&map)?)?;
        Ok(())
    }
}

/// Single file holding the active run id (trimmed; empty means none).
#[derive(Debug, Clone)]
pub struct CurrentRun {
    path: PathBuf,
}

impl CurrentRun {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn get(&self) -> Result<Option<String>> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(None);
        };
        let id = String::from_utf8_lossy(&bytes).trim().to_string();
        Ok(if id.is_empty() { None } else { Some(id) })
    }

    pub fn set(&self, run_id: &str) -> Result<()> {
        write_atomic(&self.path, run_id.trim().as_bytes())?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The most-recent run id for which the completion notification fired.
/// This marker is the only hard dedup boundary for run-complete.
#[derive(Debug, Clone)]
pub struct RunCompleteMarker {
    path: PathBuf,
}

impl RunCompleteMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn last_notified(&self) -> Result<Option<String>> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(None);
        };
        let id = String::from_utf8_lossy(&bytes).trim().to_string();
        Ok(if id.is_empty() { None } else { Some(id) })
    }

    pub fn record(&self, run_id: &str) -> Result<()> {
        write_atomic(&self.path, run_id.trim().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "markers_tests.rs"]
mod tests;
