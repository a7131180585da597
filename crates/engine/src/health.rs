// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure health evaluation: recorded state + terminal liveness + activity
//! age → action and next state.

use ovs_core::{AgentSession, AgentState};

use crate::{EngineError, Result};

/// Watchdog timing thresholds. `zombie_ms` must exceed `stale_ms`.
#[derive(Debug, Clone, Copy)]
pub struct WatchdogThresholds {
    /// Activity age at which a session is considered quiet.
    pub stale_ms: u64,
    /// Activity age marking a deep stall; the ladder decides termination.
    pub zombie_ms: u64,
    /// Elapsed time per escalation-ladder step.
    pub nudge_interval_ms: u64,
    /// Consult the AI-triage collaborator at ladder level 2.
    pub triage_enabled: bool,
}

impl Default for WatchdogThresholds {
    fn default() -> Self {
        Self {
            stale_ms: 5 * 60 * 1000,
            zombie_ms: 20 * 60 * 1000,
            nudge_interval_ms: 60 * 1000,
            triage_enabled: false,
        }
    }
}

impl WatchdogThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.zombie_ms <= self.stale_ms {
            return Err(EngineError::InvalidThresholds(format!(
                "zombie_ms ({}) must exceed stale_ms ({})",
                self.zombie_ms, self.stale_ms
            )));
        }
        if self.nudge_interval_ms == 0 {
            return Err(EngineError::InvalidThresholds("nudge_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}

/// What the watchdog should do with a session this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthAction {
    None,
    Escalate,
    Terminate,
    /// Recorded state conflicts with observed reality; surface to the
    /// operator but do not auto-resurrect.
    Investigate,
}

/// Result of one health evaluation.
#[derive(Debug, Clone)]
pub struct HealthVerdict {
    pub action: HealthAction,
    pub new_state: AgentState,
    /// Set whenever observable state disagrees with the stored state.
    pub reconciliation_note: Option<String>,
}

/// Evaluate one non-completed session against observed terminal liveness.
///
/// Observable state is ground truth: a dead terminal means termination
/// regardless of recorded state, and an alive terminal behind a recorded
/// zombie is surfaced rather than trusted.
pub fn evaluate_health(
    session: &AgentSession,
    terminal_alive: bool,
    now_ms: u64,
    thresholds: &WatchdogThresholds,
) -> HealthVerdict {
    if !terminal_alive {
        if session.state == AgentState::Zombie {
            // Record already matches reality.
            return HealthVerdict {
                action: HealthAction::None,
                new_state: AgentState::Zombie,
                reconciliation_note: None,
            };
        }
        return HealthVerdict {
            action: HealthAction::Terminate,
            new_state: AgentState::Zombie,
            reconciliation_note: Some(format!(
                "terminal {} dead while session recorded {}",
                session.tmux_session, session.state
            )),
        };
    }

    if session.state == AgentState::Zombie {
        return HealthVerdict {
            action: HealthAction::Investigate,
            new_state: AgentState::Zombie,
            reconciliation_note: Some(format!(
                "terminal {} alive but session recorded zombie",
                session.tmux_session
            )),
        };
    }

    let age = session.activity_age_ms(now_ms);

    if age >= thresholds.zombie_ms {
        // Deep stall: the escalation ladder decides termination.
        return HealthVerdict {
            action: HealthAction::Escalate,
            new_state: session.state,
            reconciliation_note: None,
        };
    }

    if age >= thresholds.stale_ms {
        let new_state = match session.state {
            AgentState::Booting | AgentState::Working => AgentState::Stalled,
            other => other,
        };
        return HealthVerdict {
            action: HealthAction::Escalate,
            new_state,
            reconciliation_note: None,
        };
    }

    // Healthy: fresh activity lifts booting and stalled back to working.
    HealthVerdict {
        action: HealthAction::None,
        new_state: AgentState::Working,
        reconciliation_note: None,
    }
}

/// Ladder level expected after `elapsed` ms of continuous stall, capped
/// at the terminal level 3.
pub fn expected_escalation_level(stalled_since: u64, now_ms: u64, nudge_interval_ms: u64) -> u8 {
    let elapsed = now_ms.saturating_sub(stalled_since);
    let level = elapsed / nudge_interval_ms.max(1);
    level.min(3) as u8
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
