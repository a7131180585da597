// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-multiplexer adapter.
//!
//! Session names are sanitized before reaching tmux, every invocation is
//! time-bounded, and all operations are safe to call on a dead session.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use ovs_core::sanitize_name;

use crate::{AdapterError, Result};

const TMUX_TIMEOUT: Duration = Duration::from_secs(5);

/// Opaque terminal-multiplexer capability.
#[async_trait]
pub trait TerminalMux: Clone + Send + Sync + 'static {
    /// Create a detached session running `command` in `cwd`; returns the
    /// pane's process id.
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        env: &HashMap<String, String>,
    ) -> Result<u32>;

    /// Probe liveness. `Ok(false)` is a successful probe of a dead session;
    /// `Err` means the probe itself failed and nothing can be concluded.
    async fn is_alive(&self, name: &str) -> Result<bool>;

    /// Best-effort kill of the session and its process tree. Idempotent;
    /// killing a dead session is not an error.
    async fn kill_session(&self, name: &str) -> Result<()>;

    /// Inject literal keys followed by Enter. Callers must prefer the nudge
    /// marker side-band for attention signals; this is reserved for paths
    /// that own the recipient's terminal.
    async fn send_keys(&self, name: &str, keys: &str) -> Result<()>;
}

/// Real tmux adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, what: &'static str, args: &[&str]) -> Result<std::process::Output> {
        let output = tokio::time::timeout(TMUX_TIMEOUT, Command::new("tmux").args(args).output())
            .await
            .map_err(|_| AdapterError::Timeout { what })??;
        Ok(output)
    }
}

#[async_trait]
impl TerminalMux for TmuxAdapter {
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        env: &HashMap<String, String>,
    ) -> Result<u32> {
        let name = sanitize_name(name);
        let cwd_str = cwd.to_string_lossy();

        let mut cmd = Command::new("tmux");
        cmd.args(["new-session", "-d", "-s", name.as_str(), "-c", cwd_str.as_ref(), command]);
        // Strip the enclosing tmux client's context so a session created from
        // inside tmux does not trip the server's nested-session refusal.
        cmd.env_remove("TMUX").env_remove("TMUX_PANE");
        for (key, value) in env {
            cmd.env(key, value);
        }

        let output = tokio::time::timeout(TMUX_TIMEOUT, cmd.output())
            .await
            .map_err(|_| AdapterError::Timeout { what: "tmux new-session" })??;
        if !output.status.success() {
            return Err(AdapterError::CommandFailed {
                what: "tmux new-session",
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let output = self
            .run("tmux display-message", &["display-message", "-p", "-t", &name, "#{pane_pid}"])
            .await?;
        let pid = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<u32>()
            .map_err(|e| AdapterError::CommandFailed {
                what: "tmux display-message",
                detail: format!("bad pane_pid: {e}"),
            })?;
        Ok(pid)
    }

    async fn is_alive(&self, name: &str) -> Result<bool> {
        let name = sanitize_name(name);
        let output = self.run("tmux has-session", &["has-session", "-t", &name]).await?;
        Ok(output.status.success())
    }

    async fn kill_session(&self, name: &str) -> Result<()> {
        let name = sanitize_name(name);
        // kill-session takes the pane process tree down with the server-side
        // pane; a missing session is already the desired end state.
        let _ = self.run("tmux kill-session", &["kill-session", "-t", &name]).await;
        Ok(())
    }

    async fn send_keys(&self, name: &str, keys: &str) -> Result<()> {
        let name = sanitize_name(name);
        let output = self.run("tmux send-keys", &["send-keys", "-t", &name, keys, "Enter"]).await?;
        if !output.status.success() {
            return Err(AdapterError::CommandFailed {
                what: "tmux send-keys",
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct CreateCall {
        pub name: String,
        pub cwd: PathBuf,
        pub command: String,
    }

    #[derive(Default)]
    struct FakeMuxState {
        alive: HashSet<String>,
        probe_failures: HashSet<String>,
        created: Vec<CreateCall>,
        killed: Vec<String>,
        sent: Vec<(String, String)>,
    }

    /// Fake terminal multiplexer for tests.
    #[derive(Clone, Default)]
    pub struct FakeTerminalMux {
        inner: Arc<Mutex<FakeMuxState>>,
    }

    impl FakeTerminalMux {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_alive(&self, name: &str, alive: bool) {
            let mut state = self.inner.lock();
            if alive {
                state.alive.insert(name.to_string());
            } else {
                state.alive.remove(name);
            }
        }

        /// Make `is_alive(name)` return an error (probe failure).
        pub fn fail_probe(&self, name: &str) {
            self.inner.lock().probe_failures.insert(name.to_string());
        }

        pub fn killed(&self) -> Vec<String> {
            self.inner.lock().killed.clone()
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.inner.lock().sent.clone()
        }

        pub fn created(&self) -> Vec<CreateCall> {
            self.inner.lock().created.clone()
        }
    }

    #[async_trait]
    impl TerminalMux for FakeTerminalMux {
        async fn create_session(
            &self,
            name: &str,
            cwd: &Path,
            command: &str,
            _env: &HashMap<String, String>,
        ) -> Result<u32> {
            let mut state = self.inner.lock();
            state.alive.insert(name.to_string());
            state.created.push(CreateCall {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
                command: command.to_string(),
            });
            Ok(4242)
        }

        async fn is_alive(&self, name: &str) -> Result<bool> {
            let state = self.inner.lock();
            if state.probe_failures.contains(name) {
                return Err(AdapterError::Timeout { what: "tmux has-session" });
            }
            Ok(state.alive.contains(name))
        }

        async fn kill_session(&self, name: &str) -> Result<()> {
            let mut state = self.inner.lock();
            state.alive.remove(name);
            state.killed.push(name.to_string());
            Ok(())
        }

        async fn send_keys(&self, name: &str, keys: &str) -> Result<()> {
            self.inner.lock().sent.push((name.to_string(), keys.to_string()));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTerminalMux;

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
