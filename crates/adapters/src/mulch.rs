// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Learning-store ("mulch") adapter.
//!
//! Failure records are fire-and-forget: a broken or missing `mulch` binary
//! must never abort a watchdog tick.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

const MULCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One structured entry for the learning store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Record type (e.g. "failure").
    pub record_type: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_bead: Option<String>,
}

/// Fire-and-forget learning-store capability.
#[async_trait]
pub trait LearningStore: Clone + Send + Sync + 'static {
    /// Record an entry under `domain`. Failures are swallowed.
    async fn record(&self, domain: &str, record: &FailureRecord);
}

/// Real adapter shelling out to `mulch record`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MulchAdapter;

impl MulchAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LearningStore for MulchAdapter {
    async fn record(&self, domain: &str, record: &FailureRecord) {
        let tags = record.tags.join(",");
        let mut cmd = Command::new("mulch");
        cmd.args(["record", domain, "--type", &record.record_type])
            .args(["--description", &record.description])
            .args(["--tags", &tags]);
        if let Some(bead) = &record.evidence_bead {
            cmd.args(["--evidence-bead", bead]);
        }

        match tokio::time::timeout(MULCH_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {}
            Ok(Ok(output)) => {
                tracing::warn!(
                    domain,
                    code = ?output.status.code(),
                    "mulch record exited non-zero; entry dropped"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(domain, error = %e, "mulch record failed to spawn; entry dropped");
            }
            Err(_) => {
                tracing::warn!(domain, "mulch record timed out; entry dropped");
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

    /// Fake learning store recording entries for tests.
    #[derive(Clone, Default)]
    pub struct FakeLearningStore {
        inner: Arc<Mutex<Vec<(String, FailureRecord)>>>,
    }

    impl FakeLearningStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn records(&self) -> Vec<(String, FailureRecord)> {
            self.inner.lock().clone()
        }
    }

    #[async_trait]
    impl LearningStore for FakeLearningStore {
        async fn record(&self, domain: &str, record: &FailureRecord) {
            self.inner.lock().push((domain.to_string(), record.clone()));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLearningStore;
