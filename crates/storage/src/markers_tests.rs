// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn nudge_write_read_clear() {
    let dir = tempdir().unwrap();
    let nudges = PendingNudges::new(dir.path().join("pending-nudges"));

    assert!(nudges.read_and_clear("builder-1").unwrap().is_none());

    let nudge = PendingNudge::new("watchdog", "mail", 1_000).with_subject("check your inbox");
    nudges.write("builder-1", &nudge).unwrap();

    let got = nudges.read_and_clear("builder-1").unwrap().unwrap();
    assert_eq!(got.from, "watchdog");
    assert_eq!(got.subject, "check your inbox");

    // cleared on read
    assert!(nudges.read_and_clear("builder-1").unwrap().is_none());
}

#[test]
fn newer_nudge_overwrites_older() {
    let dir = tempdir().unwrap();
    let nudges = PendingNudges::new(dir.path().join("pending-nudges"));

    nudges.write("a", &PendingNudge::new("x", "first", 1)).unwrap();
    nudges.write("a", &PendingNudge::new("y", "second", 2)).unwrap();

    let got = nudges.read_and_clear("a").unwrap().unwrap();
    assert_eq!(got.from, "y");
    assert_eq!(got.reason, "second");
}

#[test]
fn nudge_peek_does_not_clear() {
    let dir = tempdir().unwrap();
    let nudges = PendingNudges::new(dir.path().join("pending-nudges"));
    nudges.write("a", &PendingNudge::new("x", "r", 1)).unwrap();

    assert!(nudges.peek("a").unwrap().is_some());
    assert!(nudges.peek("a").unwrap().is_some());
    assert!(nudges.read_and_clear("a").unwrap().is_some());
    assert!(nudges.peek("a").unwrap().is_none());
}

#[test]
fn nudge_recipient_name_is_sanitized() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("pending-nudges");
    let nudges = PendingNudges::new(&root);
    nudges.write("../escape", &PendingNudge::new("x", "r", 1)).unwrap();

    // marker stays inside the directory under the sanitized name
    assert!(root.join(".._escape").exists());
    assert!(nudges.read_and_clear("../escape").unwrap().is_some());
}

#[test]
fn corrupt_nudge_marker_is_discarded() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("pending-nudges");
    let nudges = PendingNudges::new(&root);
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("a"), b"not json").unwrap();

    assert!(nudges.read_and_clear("a").unwrap().is_none());
    assert!(!root.join("a").exists(), "corrupt marker must be cleared");
}

#[test]
fn mail_check_state_roundtrip() {
    let dir = tempdir().unwrap();
    let state = MailCheckState::new(dir.path().join("mail-check-state"));

    assert!(state.last_check("a").unwrap().is_none());

    state.record_check("a", 1_000).unwrap();
    state.record_check("b", 2_000).unwrap();
    state.record_check("a", 3_000).unwrap();

    assert_eq!(state.last_check("a").unwrap(), Some(3_000));
    assert_eq!(state.last_check("b").unwrap(), Some(2_000));
    assert_eq!(state.load().unwrap().len(), 2);
}

#[test]
fn corrupt_mail_check_state_resets_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mail-check-state");
    std::fs::write(&path, b"{broken").unwrap();
    let state = MailCheckState::new(&path);
    assert!(state.load().unwrap().is_empty());
}

#[test]
fn current_run_get_set_clear() {
    let dir = tempdir().unwrap();
    let run = CurrentRun::new(dir.path().join("current-run"));

    assert!(run.get().unwrap().is_none());
    run.set("run-42").unwrap();
    assert_eq!(run.get().unwrap().as_deref(), Some("run-42"));
    run.clear().unwrap();
    assert!(run.get().unwrap().is_none());
    run.clear().unwrap(); // idempotent
}

#[test]
fn current_run_trims_whitespace() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("current-run");
    std::fs::write(&path, "  run-7\n").unwrap();
    let run = CurrentRun::new(&path);
    assert_eq!(run.get().unwrap().as_deref(), Some("run-7"));

    std::fs::write(&path, "   \n").unwrap();
    assert!(run.get().unwrap().is_none());
}

#[test]
fn run_complete_marker_records_latest() {
    let dir = tempdir().unwrap();
    let marker = RunCompleteMarker::new(dir.path().join("run-complete-notified"));

    assert!(marker.last_notified().unwrap().is_none());
    marker.record("run-1").unwrap();
    assert_eq!(marker.last_notified().unwrap().as_deref(), Some("run-1"));
    marker.record("run-2").unwrap();
    assert_eq!(marker.last_notified().unwrap().as_deref(), Some("run-2"));
}
