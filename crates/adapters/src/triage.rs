// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI-triage collaborator: consulted at escalation level 2 before the
//! ladder reaches forced termination.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::{AdapterError, Result};

const TRIAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Verdict on a deeply-stalled agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageVerdict {
    /// Deliver a recovery nudge and keep waiting.
    Retry,
    /// Kill the session now.
    Terminate,
    /// Grant more time; no action this tick.
    Extend,
}

impl TriageVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::Terminate => "terminate",
            Self::Extend => "extend",
        }
    }
}

impl fmt::Display for TriageVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriageVerdict {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "retry" => Ok(Self::Retry),
            "terminate" => Ok(Self::Terminate),
            "extend" => Ok(Self::Extend),
            other => Err(format!("unknown triage verdict: {}", other)),
        }
    }
}

/// Context handed to the triage collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct TriageRequest {
    pub agent_name: String,
    pub project_root: PathBuf,
    pub last_activity: u64,
}

/// Triage capability.
#[async_trait]
pub trait Triage: Clone + Send + Sync + 'static {
    async fn assess(&self, request: &TriageRequest) -> Result<TriageVerdict>;
}

/// Real triage adapter: runs a configured command with the request as JSON
/// on stdin and reads the verdict from the first line of stdout.
#[derive(Clone, Debug)]
pub struct CommandTriage {
    command: String,
}

impl CommandTriage {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

#[async_trait]
impl Triage for CommandTriage {
    async fn assess(&self, request: &TriageRequest) -> Result<TriageVerdict> {
        let payload = serde_json::to_vec(request).map_err(|e| AdapterError::CommandFailed {
            what: "triage",
            detail: format!("encode request: {e}"),
        })?;

        let mut child = Command::new(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await?;
        }

        let output = tokio::time::timeout(TRIAGE_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| AdapterError::Timeout { what: "triage" })??;

        if !output.status.success() {
            return Err(AdapterError::CommandFailed {
                what: "triage",
                detail: format!("exit code {:?}", output.status.code()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let verdict_line = stdout.lines().next().unwrap_or("").trim();
        verdict_line.parse().map_err(|detail| AdapterError::CommandFailed { what: "triage", detail })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeTriageState {
        verdict: Option<TriageVerdict>,
        requests: Vec<TriageRequest>,
    }

    /// Fake triage with a scripted verdict.
    #[derive(Clone, Default)]
    pub struct FakeTriage {
        inner: Arc<Mutex<FakeTriageState>>,
    }

    impl FakeTriage {
        pub fn returning(verdict: TriageVerdict) -> Self {
            let fake = Self::default();
            fake.inner.lock().verdict = Some(verdict);
            fake
        }

        /// A fake with no scripted verdict errors on every call.
        pub fn failing() -> Self {
            Self::default()
        }

        pub fn requests(&self) -> Vec<TriageRequest> {
            self.inner.lock().requests.clone()
        }
    }

    #[async_trait]
    impl Triage for FakeTriage {
        async fn assess(&self, request: &TriageRequest) -> Result<TriageVerdict> {
            let mut state = self.inner.lock();
            state.requests.push(request.clone());
            state.verdict.ok_or(AdapterError::CommandFailed {
                what: "triage",
                detail: "no scripted verdict".to_string(),
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTriage;

#[cfg(test)]
#[path = "triage_tests.rs"]
mod tests;
