// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

#[tokio::test]
async fn fake_tracks_liveness() {
    let mux = FakeTerminalMux::new();
    assert!(!mux.is_alive("ovs-builder-1").await.unwrap());

    mux.set_alive("ovs-builder-1", true);
    assert!(mux.is_alive("ovs-builder-1").await.unwrap());

    mux.kill_session("ovs-builder-1").await.unwrap();
    assert!(!mux.is_alive("ovs-builder-1").await.unwrap());
    assert_eq!(mux.killed(), vec!["ovs-builder-1"]);
}

#[tokio::test]
async fn fake_create_marks_alive_and_records() {
    let mux = FakeTerminalMux::new();
    let pid = mux
        .create_session("ovs-scout-1", &PathBuf::from("/tmp/wt"), "claude", &Default::default())
        .await
        .unwrap();
    assert_eq!(pid, 4242);
    assert!(mux.is_alive("ovs-scout-1").await.unwrap());
    assert_eq!(mux.created().len(), 1);
    assert_eq!(mux.created()[0].command, "claude");
}

#[tokio::test]
async fn fake_probe_failure_is_an_error_not_dead() {
    let mux = FakeTerminalMux::new();
    mux.set_alive("a", true);
    mux.fail_probe("a");
    assert!(mux.is_alive("a").await.is_err());
}

#[tokio::test]
async fn fake_kill_is_idempotent() {
    let mux = FakeTerminalMux::new();
    mux.kill_session("ghost").await.unwrap();
    mux.kill_session("ghost").await.unwrap();
    assert_eq!(mux.killed().len(), 2);
}

#[tokio::test]
async fn fake_send_keys_records() {
    let mux = FakeTerminalMux::new();
    mux.send_keys("a", "hello").await.unwrap();
    assert_eq!(mux.sent(), vec![("a".to_string(), "hello".to_string())]);
}
