// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contractual state layout under `<project_root>/.overstory/`.

use std::path::{Path, PathBuf};

/// Resolver for the contractual state directories and marker files.
///
/// Directory names are part of the on-disk contract shared with every
/// observer (dashboard, CLI, workers); only the storage medium inside each
/// directory is implementation-defined.
#[derive(Debug, Clone)]
pub struct StatePaths {
    project_root: PathBuf,
    root: PathBuf,
}

impl StatePaths {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        let project_root = project_root.as_ref().to_path_buf();
        let root = project_root.join(".overstory");
        Self { project_root, root }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn mail_dir(&self) -> PathBuf {
        self.root.join("mail")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.root.join("metrics")
    }

    pub fn merge_queue_dir(&self) -> PathBuf {
        self.root.join("merge-queue")
    }

    pub fn pending_nudges_dir(&self) -> PathBuf {
        self.root.join("pending-nudges")
    }

    pub fn mail_check_state_path(&self) -> PathBuf {
        self.root.join("mail-check-state")
    }

    pub fn current_run_path(&self) -> PathBuf {
        self.root.join("current-run")
    }

    pub fn run_complete_path(&self) -> PathBuf {
        self.root.join("run-complete-notified")
    }

    /// Issue-tracker state directory; probed before each batched query.
    pub fn beads_dir(&self) -> PathBuf {
        self.project_root.join(".beads")
    }

    pub fn watchdog_lock_path(&self) -> PathBuf {
        self.root.join("watchdog.pid")
    }
}
