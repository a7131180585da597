// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ovs_core::Capability;
use proptest::prelude::*;

const STALE: u64 = 5 * 60 * 1000;
const ZOMBIE: u64 = 20 * 60 * 1000;

fn thresholds() -> WatchdogThresholds {
    WatchdogThresholds {
        stale_ms: STALE,
        zombie_ms: ZOMBIE,
        nudge_interval_ms: 60_000,
        triage_enabled: false,
    }
}

fn session_with(state: AgentState, last_activity: u64) -> AgentSession {
    let mut s = AgentSession::new("builder-1", Capability::Builder, last_activity);
    s.state = state;
    s.tmux_session = "ovs-builder-1".to_string();
    s
}

#[test]
fn dead_terminal_terminates_any_non_terminal_state() {
    for state in [AgentState::Booting, AgentState::Working, AgentState::Stalled] {
        let s = session_with(state, 1_000);
        let v = evaluate_health(&s, false, 1_000, &thresholds());
        assert_eq!(v.action, HealthAction::Terminate, "{state}");
        assert_eq!(v.new_state, AgentState::Zombie);
        assert!(v.reconciliation_note.is_some());
    }
}

#[test]
fn dead_terminal_with_recorded_zombie_is_quiet() {
    let s = session_with(AgentState::Zombie, 1_000);
    let v = evaluate_health(&s, false, 1_000, &thresholds());
    assert_eq!(v.action, HealthAction::None);
    assert_eq!(v.new_state, AgentState::Zombie);
    assert!(v.reconciliation_note.is_none());
}

#[test]
fn alive_terminal_with_recorded_zombie_investigates() {
    let s = session_with(AgentState::Zombie, 1_000);
    let v = evaluate_health(&s, true, 1_000, &thresholds());
    assert_eq!(v.action, HealthAction::Investigate);
    // investigate holds current state; no auto-resurrection
    assert_eq!(v.new_state, AgentState::Zombie);
    assert!(v.reconciliation_note.unwrap().contains("alive"));
}

#[test]
fn fresh_activity_is_healthy_and_lifts_to_working() {
    for state in [AgentState::Booting, AgentState::Working, AgentState::Stalled] {
        let s = session_with(state, 100_000);
        let v = evaluate_health(&s, true, 100_000 + STALE - 1, &thresholds());
        assert_eq!(v.action, HealthAction::None, "{state}");
        assert_eq!(v.new_state, AgentState::Working);
    }
}

#[test]
fn quiet_working_session_stalls() {
    let s = session_with(AgentState::Working, 100_000);
    let v = evaluate_health(&s, true, 100_000 + STALE, &thresholds());
    assert_eq!(v.action, HealthAction::Escalate);
    assert_eq!(v.new_state, AgentState::Stalled);
}

#[test]
fn quiet_booting_session_stalls() {
    let s = session_with(AgentState::Booting, 100_000);
    let v = evaluate_health(&s, true, 100_000 + STALE + 1, &thresholds());
    assert_eq!(v.action, HealthAction::Escalate);
    assert_eq!(v.new_state, AgentState::Stalled);
}

#[test]
fn already_stalled_session_keeps_escalating() {
    let s = session_with(AgentState::Stalled, 100_000);
    let v = evaluate_health(&s, true, 100_000 + STALE + 1, &thresholds());
    assert_eq!(v.action, HealthAction::Escalate);
    assert_eq!(v.new_state, AgentState::Stalled);
}

#[test]
fn deep_stall_escalates_without_state_change() {
    for state in [AgentState::Booting, AgentState::Working, AgentState::Stalled] {
        let s = session_with(state, 100_000);
        let v = evaluate_health(&s, true, 100_000 + ZOMBIE, &thresholds());
        assert_eq!(v.action, HealthAction::Escalate, "{state}");
        assert_eq!(v.new_state, state);
    }
}

#[test]
fn thresholds_validation() {
    assert!(thresholds().validate().is_ok());

    let mut bad = thresholds();
    bad.zombie_ms = bad.stale_ms;
    assert!(bad.validate().is_err());

    let mut bad = thresholds();
    bad.nudge_interval_ms = 0;
    assert!(bad.validate().is_err());
}

#[test]
fn expected_level_steps_by_interval() {
    let interval = 60_000;
    assert_eq!(expected_escalation_level(0, 0, interval), 0);
    assert_eq!(expected_escalation_level(0, 59_999, interval), 0);
    assert_eq!(expected_escalation_level(0, 60_000, interval), 1);
    assert_eq!(expected_escalation_level(0, 121_000, interval), 2);
    assert_eq!(expected_escalation_level(0, 181_000, interval), 3);
    // capped at 3
    assert_eq!(expected_escalation_level(0, 10 * 60_000, interval), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The ladder level is monotone in elapsed time and capped at 3.
    #[test]
    fn level_is_monotone_and_capped(
        stalled_since in 0u64..1_000_000,
        a in 0u64..10_000_000,
        b in 0u64..10_000_000,
        interval in 1u64..600_000,
    ) {
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        let level_early = expected_escalation_level(stalled_since, stalled_since + early, interval);
        let level_late = expected_escalation_level(stalled_since, stalled_since + late, interval);
        prop_assert!(level_early <= level_late);
        prop_assert!(level_late <= 3);
    }

    /// Dead terminals always zombie; alive non-zombie sessions never
    /// produce Terminate.
    #[test]
    fn terminate_only_on_dead_terminal(
        state_idx in 0usize..3,
        age in 0u64..10_000_000,
        alive in any::<bool>(),
    ) {
        let state = [AgentState::Booting, AgentState::Working, AgentState::Stalled][state_idx];
        let s = session_with(state, 1_000_000);
        let v = evaluate_health(&s, alive, 1_000_000 + age, &thresholds());
        if alive {
            prop_assert_ne!(v.action, HealthAction::Terminate);
        } else {
            prop_assert_eq!(v.action, HealthAction::Terminate);
            prop_assert_eq!(v.new_state, AgentState::Zombie);
        }
    }
}
