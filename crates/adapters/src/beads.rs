// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue-tracker ("beads") adapter.
//!
//! One batched status query per watchdog tick. Strictly fail-open: any
//! subprocess failure, parse failure, or timeout yields the empty set, and
//! the query is skipped entirely when the tracker directory is absent.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

const BD_TIMEOUT: Duration = Duration::from_secs(10);

/// Batched external-ticket status capability.
#[async_trait]
pub trait TicketTracker: Clone + Send + Sync + 'static {
    /// Subset of `ids` whose ticket is currently closed. Never fails; an
    /// unreachable tracker reads as "nothing closed".
    async fn closed_ids(&self, ids: &[String]) -> HashSet<String>;
}

#[derive(Debug, Deserialize)]
struct TicketRow {
    id: String,
    status: String,
}

/// Parse `bd list --json` output into the set of closed ticket ids.
fn parse_closed(stdout: &[u8]) -> Option<HashSet<String>> {
    let rows: Vec<TicketRow> = serde_json::from_slice(stdout).ok()?;
    Some(rows.into_iter().filter(|r| r.status == "closed").map(|r| r.id).collect())
}

/// Real adapter shelling out to `bd`.
#[derive(Clone, Debug)]
pub struct BeadsTracker {
    beads_dir: PathBuf,
}

impl BeadsTracker {
    pub fn new(beads_dir: impl Into<PathBuf>) -> Self {
        Self { beads_dir: beads_dir.into() }
    }
}

#[async_trait]
impl TicketTracker for BeadsTracker {
    async fn closed_ids(&self, ids: &[String]) -> HashSet<String> {
        if ids.is_empty() {
            return HashSet::new();
        }
        if !self.beads_dir.exists() {
            return HashSet::new();
        }

        let csv = ids.join(",");
        let result = tokio::time::timeout(
            BD_TIMEOUT,
            Command::new("bd").args(["list", "--all", "--id", &csv, "--json"]).output(),
        )
        .await;

        let output = match result {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(output)) => {
                tracing::warn!(
                    code = ?output.status.code(),
                    "bd list exited non-zero; treating all tickets as open"
                );
                return HashSet::new();
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "bd list failed to spawn; treating all tickets as open");
                return HashSet::new();
            }
            Err(_) => {
                tracing::warn!("bd list timed out; treating all tickets as open");
                return HashSet::new();
            }
        };

        match parse_closed(&output.stdout) {
            Some(closed) => closed,
            None => {
                tracing::warn!("bd list output did not parse; treating all tickets as open");
                HashSet::new()
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeTrackerState {
        closed: HashSet<String>,
        queries: Vec<Vec<String>>,
    }

    /// Fake ticket tracker for tests.
    #[derive(Clone, Default)]
    pub struct FakeTracker {
        inner: Arc<Mutex<FakeTrackerState>>,
    }

    impl FakeTracker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_closed(&self, id: &str) {
            self.inner.lock().closed.insert(id.to_string());
        }

        /// Every batch of ids queried, in order.
        pub fn queries(&self) -> Vec<Vec<String>> {
            self.inner.lock().queries.clone()
        }
    }

    #[async_trait]
    impl TicketTracker for FakeTracker {
        async fn closed_ids(&self, ids: &[String]) -> HashSet<String> {
            let mut state = self.inner.lock();
            state.queries.push(ids.to_vec());
            ids.iter().filter(|id| state.closed.contains(*id)).cloned().collect()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTracker;

#[cfg(test)]
#[path = "beads_tests.rs"]
mod tests;
