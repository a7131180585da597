// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn open_store() -> (tempfile::TempDir, SessionStore) {
    let dir = tempdir().unwrap();
    let store = SessionStore::open(dir.path().join("sessions")).unwrap();
    (dir, store)
}

fn session(name: &str, state: AgentState) -> AgentSession {
    let mut s = AgentSession::new(name, Capability::Builder, 1_000);
    s.state = state;
    s
}

#[test]
fn upsert_and_get_by_name() {
    let (_dir, store) = open_store();
    let mut s = session("builder-1", AgentState::Booting);
    s.bead_id = "ovs-12".to_string();
    s.run_id = Some("run-a".to_string());
    store.upsert(&s).unwrap();

    let got = store.get_by_name("builder-1").unwrap().unwrap();
    assert_eq!(got.agent_name, "builder-1");
    assert_eq!(got.bead_id, "ovs-12");
    assert_eq!(got.run_id.as_deref(), Some("run-a"));
    assert_eq!(got.state, AgentState::Booting);

    assert!(store.get_by_name("nobody").unwrap().is_none());
}

#[test]
fn upsert_replaces_by_agent_name() {
    let (_dir, store) = open_store();
    store.upsert(&session("builder-1", AgentState::Booting)).unwrap();

    let mut replacement = session("builder-1", AgentState::Working);
    replacement.branch_name = "ovs/builder-1".to_string();
    store.upsert(&replacement).unwrap();

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].state, AgentState::Working);
    assert_eq!(all[0].branch_name, "ovs/builder-1");
}

#[test]
fn get_by_run_filters() {
    let (_dir, store) = open_store();
    let mut a = session("builder-1", AgentState::Working);
    a.run_id = Some("run-a".to_string());
    let mut b = session("scout-1", AgentState::Working);
    b.run_id = Some("run-b".to_string());
    let c = session("coordinator", AgentState::Working);
    store.upsert(&a).unwrap();
    store.upsert(&b).unwrap();
    store.upsert(&c).unwrap();

    let run_a = store.get_by_run("run-a").unwrap();
    assert_eq!(run_a.len(), 1);
    assert_eq!(run_a[0].agent_name, "builder-1");
}

#[test]
fn get_active_excludes_terminal_states() {
    let (_dir, store) = open_store();
    store.upsert(&session("a", AgentState::Booting)).unwrap();
    store.upsert(&session("b", AgentState::Working)).unwrap();
    store.upsert(&session("c", AgentState::Stalled)).unwrap();
    store.upsert(&session("d", AgentState::Completed)).unwrap();
    store.upsert(&session("e", AgentState::Zombie)).unwrap();

    let active: Vec<String> =
        store.get_active().unwrap().into_iter().map(|s| s.agent_name).collect();
    assert_eq!(active, vec!["a", "b", "c"]);
}

#[test]
fn update_state_to_terminal_clears_escalation() {
    let (_dir, store) = open_store();
    let mut s = session("builder-1", AgentState::Stalled);
    s.escalation_level = 2;
    s.stalled_since = Some(500);
    store.upsert(&s).unwrap();

    store.update_state("builder-1", AgentState::Zombie).unwrap();

    let got = store.get_by_name("builder-1").unwrap().unwrap();
    assert_eq!(got.state, AgentState::Zombie);
    assert_eq!(got.escalation_level, 0);
    assert!(got.stalled_since.is_none());
}

#[test]
fn update_state_non_terminal_keeps_escalation() {
    let (_dir, store) = open_store();
    let mut s = session("builder-1", AgentState::Stalled);
    s.escalation_level = 1;
    s.stalled_since = Some(500);
    store.upsert(&s).unwrap();

    store.update_state("builder-1", AgentState::Stalled).unwrap();

    let got = store.get_by_name("builder-1").unwrap().unwrap();
    assert_eq!(got.escalation_level, 1);
    assert_eq!(got.stalled_since, Some(500));
}

#[test]
fn update_unknown_session_is_not_found() {
    let (_dir, store) = open_store();
    let err = store.update_state("ghost", AgentState::Working).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[test]
fn update_last_activity() {
    let (_dir, store) = open_store();
    store.upsert(&session("builder-1", AgentState::Working)).unwrap();
    store.update_last_activity("builder-1", 9_999).unwrap();
    let got = store.get_by_name("builder-1").unwrap().unwrap();
    assert_eq!(got.last_activity, 9_999);
}

#[test]
fn update_escalation() {
    let (_dir, store) = open_store();
    store.upsert(&session("builder-1", AgentState::Stalled)).unwrap();
    store.update_escalation("builder-1", 3, Some(1_234)).unwrap();
    let got = store.get_by_name("builder-1").unwrap().unwrap();
    assert_eq!(got.escalation_level, 3);
    assert_eq!(got.stalled_since, Some(1_234));
}

#[test]
fn heartbeat_lifts_booting_and_stalled_to_working() {
    let (_dir, store) = open_store();
    store.upsert(&session("a", AgentState::Booting)).unwrap();
    store.upsert(&session("b", AgentState::Stalled)).unwrap();
    store.upsert(&session("c", AgentState::Completed)).unwrap();

    store.record_heartbeat("a", 2_000).unwrap();
    store.record_heartbeat("b", 2_000).unwrap();
    store.record_heartbeat("c", 2_000).unwrap();

    assert_eq!(store.get_by_name("a").unwrap().unwrap().state, AgentState::Working);
    assert_eq!(store.get_by_name("b").unwrap().unwrap().state, AgentState::Working);
    // Terminal states are never resurrected by a heartbeat.
    assert_eq!(store.get_by_name("c").unwrap().unwrap().state, AgentState::Completed);
    assert_eq!(store.get_by_name("a").unwrap().unwrap().last_activity, 2_000);
}

#[test]
fn heartbeat_for_unknown_agent_is_noop() {
    let (_dir, store) = open_store();
    store.record_heartbeat("outsider", 1_000).unwrap();
}

#[test]
fn concurrent_opens_share_state() {
    let dir = tempdir().unwrap();
    let store_a = SessionStore::open(dir.path().join("sessions")).unwrap();
    let store_b = SessionStore::open(dir.path().join("sessions")).unwrap();

    store_a.upsert(&session("builder-1", AgentState::Working)).unwrap();
    let seen = store_b.get_by_name("builder-1").unwrap();
    assert!(seen.is_some());
}
