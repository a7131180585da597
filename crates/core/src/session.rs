// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session records: identity, worktree, terminal handle, lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

crate::define_id! {
    /// Unique session row identifier.
    pub struct SessionId("ses-");
}

/// The role an agent plays; determines message templates and group rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Scout,
    Builder,
    Reviewer,
    Lead,
    Merger,
    Coordinator,
    Supervisor,
    /// Reserved for the dashboard's observer agent. Never spawned by the
    /// coordination core but must be excluded from run-completion accounting.
    Monitor,
}

impl Capability {
    /// Persistent capabilities stay alive across runs and are excluded from
    /// run-completion accounting and `@workers` broadcast fan-out.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Coordinator | Self::Monitor | Self::Supervisor)
    }

    /// Capabilities whose long-poll mail wait also wakes on a pending nudge.
    pub fn wakes_on_nudge(&self) -> bool {
        matches!(self, Self::Coordinator | Self::Lead)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Builder => "builder",
            Self::Reviewer => "reviewer",
            Self::Lead => "lead",
            Self::Merger => "merger",
            Self::Coordinator => "coordinator",
            Self::Supervisor => "supervisor",
            Self::Monitor => "monitor",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scout" => Ok(Self::Scout),
            "builder" => Ok(Self::Builder),
            "reviewer" => Ok(Self::Reviewer),
            "lead" => Ok(Self::Lead),
            "merger" => Ok(Self::Merger),
            "coordinator" => Ok(Self::Coordinator),
            "supervisor" => Ok(Self::Supervisor),
            "monitor" => Ok(Self::Monitor),
            other => Err(format!("unknown capability: {}", other)),
        }
    }
}

/// Lifecycle state of an agent session.
///
/// `Completed` and `Zombie` are terminal: nothing transitions out of them
/// except a deliberate reset on reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Booting,
    Working,
    Completed,
    Stalled,
    Zombie,
}

impl AgentState {
    /// The single predicate behind both `SessionStore::get_active()` and the
    /// watchdog's non-terminal iteration.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Booting | Self::Working | Self::Stalled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Zombie)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booting => "booting",
            Self::Working => "working",
            Self::Completed => "completed",
            Self::Stalled => "stalled",
            Self::Zombie => "zombie",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booting" => Ok(Self::Booting),
            "working" => Ok(Self::Working),
            "completed" => Ok(Self::Completed),
            "stalled" => Ok(Self::Stalled),
            "zombie" => Ok(Self::Zombie),
            other => Err(format!("unknown agent state: {}", other)),
        }
    }
}

/// Durable record of one spawned agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub id: SessionId,
    /// Unique across all rows; the addressing key for mail and nudges.
    pub agent_name: String,
    pub capability: Capability,
    pub worktree_path: PathBuf,
    pub branch_name: String,
    /// External ticket id; empty when the session has no ticket.
    #[serde(default)]
    pub bead_id: String,
    /// Opaque terminal-multiplexer session handle.
    pub tmux_session: String,
    pub state: AgentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Name of the spawning agent; `None` for top-level sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_agent: Option<String>,
    /// 0 = top of the hierarchy. `parent_agent == None` implies `depth == 0`.
    #[serde(default)]
    pub depth: u32,
    /// Groups sessions belonging to one batch of work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub started_at: u64,
    pub last_activity: u64,
    /// 0–3; non-zero only while stalled (reset on recovery and on terminal
    /// transitions).
    #[serde(default)]
    pub escalation_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stalled_since: Option<u64>,
}

impl AgentSession {
    /// A freshly-spawned session in `Booting` state.
    pub fn new(agent_name: impl Into<String>, capability: Capability, now_ms: u64) -> Self {
        Self {
            id: SessionId::new(),
            agent_name: agent_name.into(),
            capability,
            worktree_path: PathBuf::new(),
            branch_name: String::new(),
            bead_id: String::new(),
            tmux_session: String::new(),
            state: AgentState::Booting,
            pid: None,
            parent_agent: None,
            depth: 0,
            run_id: None,
            started_at: now_ms,
            last_activity: now_ms,
            escalation_level: 0,
            stalled_since: None,
        }
    }

    /// Age of the last observed activity, saturating at zero.
    pub fn activity_age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
