// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn active_and_terminal_partition_states() {
    for state in
        [AgentState::Booting, AgentState::Working, AgentState::Completed, AgentState::Stalled, AgentState::Zombie]
    {
        assert_ne!(state.is_active(), state.is_terminal(), "{state} must be exactly one of active/terminal");
    }
}

#[test]
fn state_parse_display_roundtrip() {
    for state in
        [AgentState::Booting, AgentState::Working, AgentState::Completed, AgentState::Stalled, AgentState::Zombie]
    {
        assert_eq!(state.as_str().parse::<AgentState>().unwrap(), state);
    }
    assert!("running".parse::<AgentState>().is_err());
}

#[test]
fn capability_parse_display_roundtrip() {
    for cap in [
        Capability::Scout,
        Capability::Builder,
        Capability::Reviewer,
        Capability::Lead,
        Capability::Merger,
        Capability::Coordinator,
        Capability::Supervisor,
        Capability::Monitor,
    ] {
        assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
    }
    assert!("welder".parse::<Capability>().is_err());
}

#[test]
fn persistent_capabilities() {
    assert!(Capability::Coordinator.is_persistent());
    assert!(Capability::Monitor.is_persistent());
    assert!(Capability::Supervisor.is_persistent());
    assert!(!Capability::Builder.is_persistent());
    assert!(!Capability::Scout.is_persistent());
}

#[test]
fn wake_on_nudge_roles() {
    assert!(Capability::Coordinator.wakes_on_nudge());
    assert!(Capability::Lead.wakes_on_nudge());
    assert!(!Capability::Builder.wakes_on_nudge());
    assert!(!Capability::Merger.wakes_on_nudge());
}

#[test]
fn new_session_starts_booting_at_depth_zero() {
    let s = AgentSession::new("builder-1", Capability::Builder, 1_000);
    assert_eq!(s.state, AgentState::Booting);
    assert_eq!(s.depth, 0);
    assert!(s.parent_agent.is_none());
    assert_eq!(s.started_at, 1_000);
    assert_eq!(s.last_activity, 1_000);
    assert_eq!(s.escalation_level, 0);
    assert!(s.stalled_since.is_none());
}

#[test]
fn activity_age_saturates() {
    let s = AgentSession::new("builder-1", Capability::Builder, 5_000);
    assert_eq!(s.activity_age_ms(8_000), 3_000);
    assert_eq!(s.activity_age_ms(1_000), 0);
}

#[test]
fn session_serde_roundtrip() {
    let mut s = AgentSession::new("scout-2", Capability::Scout, 42);
    s.bead_id = "ovs-abc".to_string();
    s.run_id = Some("run-7".to_string());
    s.parent_agent = Some("coordinator".to_string());
    s.depth = 1;

    let json = serde_json::to_string(&s).unwrap();
    let back: AgentSession = serde_json::from_str(&json).unwrap();
    assert_eq!(back.agent_name, "scout-2");
    assert_eq!(back.capability, Capability::Scout);
    assert_eq!(back.run_id.as_deref(), Some("run-7"));
    assert_eq!(back.depth, 1);
}
