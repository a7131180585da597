// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_closed_filters_by_status() {
    let json = br#"[
        {"id": "ovs-1", "status": "closed"},
        {"id": "ovs-2", "status": "open"},
        {"id": "ovs-3", "status": "in-progress"},
        {"id": "ovs-4", "status": "closed"}
    ]"#;
    let closed = parse_closed(json).unwrap();
    assert_eq!(closed.len(), 2);
    assert!(closed.contains("ovs-1"));
    assert!(closed.contains("ovs-4"));
}

#[test]
fn parse_closed_rejects_garbage() {
    assert!(parse_closed(b"not json").is_none());
    assert!(parse_closed(b"{\"id\":\"x\"}").is_none());
}

#[test]
fn parse_closed_empty_list() {
    assert!(parse_closed(b"[]").unwrap().is_empty());
}

#[tokio::test]
async fn real_tracker_skips_when_dir_absent() {
    let tracker = BeadsTracker::new("/nonexistent/beads/dir");
    let closed = tracker.closed_ids(&["ovs-1".to_string()]).await;
    assert!(closed.is_empty());
}

#[tokio::test]
async fn real_tracker_skips_empty_id_batch() {
    let tracker = BeadsTracker::new("/");
    assert!(tracker.closed_ids(&[]).await.is_empty());
}

#[tokio::test]
async fn fake_tracker_answers_and_records() {
    let tracker = FakeTracker::new();
    tracker.set_closed("ovs-2");

    let closed = tracker.closed_ids(&["ovs-1".to_string(), "ovs-2".to_string()]).await;
    assert_eq!(closed.len(), 1);
    assert!(closed.contains("ovs-2"));

    assert_eq!(tracker.queries(), vec![vec!["ovs-1".to_string(), "ovs-2".to_string()]]);
}
