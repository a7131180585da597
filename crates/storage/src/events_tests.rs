// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ovs_core::event_types;
use tempfile::tempdir;

fn open_store() -> (tempfile::TempDir, EventStore) {
    let dir = tempdir().unwrap();
    let store = EventStore::open(dir.path().join("events")).unwrap();
    (dir, store)
}

#[test]
fn append_and_read_back() {
    let (_dir, store) = open_store();
    let event = StructuredEvent::new("builder-1", event_types::WATCHDOG_ESCALATE)
        .with_run_id("run-a")
        .with_level(EventLevel::Warn)
        .with_data(serde_json::json!({"level": 2}));
    store.append(&event, 1_000).unwrap();

    let rows = store.recent(10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event.agent_name, "builder-1");
    assert_eq!(rows[0].event.event_type, event_types::WATCHDOG_ESCALATE);
    assert_eq!(rows[0].event.level, EventLevel::Warn);
    assert_eq!(rows[0].event.data["level"], 2);
    assert_eq!(rows[0].created_at, 1_000);
}

#[test]
fn recent_is_newest_first() {
    let (_dir, store) = open_store();
    for i in 0..3u64 {
        store
            .append(&StructuredEvent::new(format!("agent-{i}"), "tick"), i)
            .unwrap();
    }
    let rows = store.recent(2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].event.agent_name, "agent-2");
    assert_eq!(rows[1].event.agent_name, "agent-1");
}

#[test]
fn by_run_and_by_type_filter() {
    let (_dir, store) = open_store();
    store
        .append(&StructuredEvent::new("a", event_types::RUN_COMPLETE).with_run_id("run-1"), 1)
        .unwrap();
    store
        .append(&StructuredEvent::new("b", event_types::RECONCILE_NOTE).with_run_id("run-2"), 2)
        .unwrap();

    let run_1 = store.by_run("run-1").unwrap();
    assert_eq!(run_1.len(), 1);
    assert_eq!(run_1[0].event.agent_name, "a");

    let completes = store.by_type(event_types::RUN_COMPLETE).unwrap();
    assert_eq!(completes.len(), 1);

    assert!(store.by_type("nothing").unwrap().is_empty());
}
