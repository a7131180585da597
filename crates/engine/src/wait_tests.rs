// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::broker::SendRequest;
use ovs_adapters::FakeNudgeSender;
use ovs_core::SystemClock;
use ovs_storage::{EventStore, MailCheckState, MailStore, SessionStore};
use tempfile::tempdir;

struct Fixture {
    _dir: tempfile::TempDir,
    broker: MailBroker<SystemClock, FakeNudgeSender>,
    nudges: PendingNudges,
    cancel_path: PathBuf,
}

fn setup() -> Fixture {
    let dir = tempdir().unwrap();
    let broker = MailBroker::new(
        MailStore::open(dir.path().join("mail")).unwrap(),
        SessionStore::open(dir.path().join("sessions")).unwrap(),
        EventStore::open(dir.path().join("events")).unwrap(),
        MailCheckState::new(dir.path().join("mail-check-state")),
        FakeNudgeSender::new(),
        SystemClock,
    );
    let nudges = PendingNudges::new(dir.path().join("pending-nudges"));
    let cancel_path = dir.path().join("cancel");
    Fixture { _dir: dir, broker, nudges, cancel_path }
}

fn fast_options() -> MailWaitOptions {
    MailWaitOptions {
        timeout_ms: 2_000,
        initial_poll_ms: 10,
        max_poll_ms: 50,
        backoff: 1.5,
        cancel_file: None,
        wake_on_pending_nudge: false,
    }
}

#[tokio::test]
async fn returns_immediately_when_mail_is_waiting() {
    let f = setup();
    f.broker.send(SendRequest::new("coordinator", "lead-1").subject("go")).await.unwrap();

    let outcome = wait_for_mail(&f.broker, &f.nudges, "lead-1", &fast_options()).await.unwrap();
    match outcome {
        MailWaitOutcome::Message { messages, nudge } => {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].subject, "go");
            assert!(nudge.is_none());
        }
        other => panic!("expected Message, got {other:?}"),
    }
}

#[tokio::test]
async fn wakes_on_mail_sent_mid_wait() {
    let f = setup();
    let broker = f.broker.clone();
    let sender = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        broker.send(SendRequest::new("a", "lead-1").subject("late")).await.unwrap();
    });

    let outcome = wait_for_mail(&f.broker, &f.nudges, "lead-1", &fast_options()).await.unwrap();
    sender.await.unwrap();
    assert!(matches!(outcome, MailWaitOutcome::Message { .. }));
}

#[tokio::test]
async fn wakes_on_nudge_for_coordination_roles() {
    let f = setup();
    let mut options = fast_options();
    options.wake_on_pending_nudge = true;

    let nudges = f.nudges.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        nudges
            .write("coordinator", &ovs_core::PendingNudge::new("builder-1", "worker_done", 1))
            .unwrap();
    });

    let outcome =
        wait_for_mail(&f.broker, &f.nudges, "coordinator", &options).await.unwrap();
    writer.await.unwrap();
    match outcome {
        MailWaitOutcome::Nudged { nudge } => {
            assert_eq!(nudge.from, "builder-1");
            assert_eq!(nudge.reason, "worker_done");
        }
        other => panic!("expected Nudged, got {other:?}"),
    }
    // the marker was cleared by the wait
    assert!(f.nudges.peek("coordinator").unwrap().is_none());
}

#[tokio::test]
async fn nudge_is_ignored_for_non_waking_roles() {
    let f = setup();
    f.nudges.write("builder-1", &ovs_core::PendingNudge::new("x", "r", 1)).unwrap();

    let mut options = fast_options();
    options.timeout_ms = 100;
    let outcome = wait_for_mail(&f.broker, &f.nudges, "builder-1", &options).await.unwrap();

    assert!(matches!(outcome, MailWaitOutcome::Timeout));
    // marker untouched
    assert!(f.nudges.peek("builder-1").unwrap().is_some());
}

#[tokio::test]
async fn times_out_with_no_mail() {
    let f = setup();
    let mut options = fast_options();
    options.timeout_ms = 80;

    let started = std::time::Instant::now();
    let outcome = wait_for_mail(&f.broker, &f.nudges, "lead-1", &options).await.unwrap();
    assert!(matches!(outcome, MailWaitOutcome::Timeout));
    assert!(started.elapsed() >= std::time::Duration::from_millis(80));
}

#[tokio::test]
async fn cancel_file_stops_the_wait() {
    let f = setup();
    let mut options = fast_options();
    options.cancel_file = Some(f.cancel_path.clone());

    let cancel_path = f.cancel_path.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;
        std::fs::write(&cancel_path, b"").unwrap();
    });

    let outcome = wait_for_mail(&f.broker, &f.nudges, "lead-1", &options).await.unwrap();
    writer.await.unwrap();
    assert!(matches!(outcome, MailWaitOutcome::Cancelled));
}

#[tokio::test]
async fn message_and_nudge_in_same_iteration_returns_message_with_nudge() {
    let f = setup();
    f.nudges.write("coordinator", &ovs_core::PendingNudge::new("b", "r", 1)).unwrap();
    f.broker.send(SendRequest::new("b", "coordinator").subject("both")).await.unwrap();

    let mut options = fast_options();
    options.wake_on_pending_nudge = true;
    let outcome =
        wait_for_mail(&f.broker, &f.nudges, "coordinator", &options).await.unwrap();
    match outcome {
        MailWaitOutcome::Message { messages, nudge } => {
            assert_eq!(messages.len(), 1);
            assert!(nudge.is_some());
        }
        other => panic!("expected Message, got {other:?}"),
    }
}
