// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn message(subject: &str) -> MailMessage {
    MailMessage {
        id: MailId::new(),
        from: "coordinator".to_string(),
        to: "builder-1".to_string(),
        subject: subject.to_string(),
        body: "body".to_string(),
        priority: Priority::Normal,
        mail_type: MessageType::Status,
        thread_id: None,
        payload: None,
        read: false,
        created_at: 1_000,
    }
}

#[test]
fn priority_parse_display_roundtrip() {
    for p in [Priority::Low, Priority::Normal, Priority::High, Priority::Urgent] {
        assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
    }
    assert!("critical".parse::<Priority>().is_err());
}

#[test]
fn message_type_parse_display_roundtrip() {
    for t in [
        MessageType::Status,
        MessageType::Question,
        MessageType::Result,
        MessageType::Error,
        MessageType::WorkerDone,
        MessageType::MergeReady,
        MessageType::Merged,
        MessageType::MergeFailed,
        MessageType::Escalation,
        MessageType::HealthCheck,
        MessageType::Dispatch,
        MessageType::Assign,
    ] {
        assert_eq!(t.as_str().parse::<MessageType>().unwrap(), t);
    }
    assert!("gossip".parse::<MessageType>().is_err());
}

#[test]
fn nudge_worthy_priorities() {
    assert!(Priority::High.triggers_nudge());
    assert!(Priority::Urgent.triggers_nudge());
    assert!(!Priority::Normal.triggers_nudge());
    assert!(!Priority::Low.triggers_nudge());
}

#[test]
fn nudge_worthy_types() {
    for t in [
        MessageType::WorkerDone,
        MessageType::MergeReady,
        MessageType::Error,
        MessageType::Escalation,
        MessageType::MergeFailed,
    ] {
        assert!(t.triggers_nudge(), "{t} must trigger a nudge");
    }
    for t in [MessageType::Status, MessageType::Question, MessageType::Merged, MessageType::Dispatch] {
        assert!(!t.triggers_nudge(), "{t} must not trigger a nudge");
    }
}

#[test]
fn message_nudge_combines_priority_and_type() {
    let mut msg = message("hello");
    assert!(!msg.triggers_nudge());
    msg.priority = Priority::Urgent;
    assert!(msg.triggers_nudge());
    msg.priority = Priority::Low;
    msg.mail_type = MessageType::MergeFailed;
    assert!(msg.triggers_nudge());
}

#[test]
fn reply_subject_prefixes_once() {
    let msg = message("need review");
    assert_eq!(msg.reply_subject(), "Re: need review");

    let reply = message("Re: need review");
    assert_eq!(reply.reply_subject(), "Re: need review");
}

#[test]
fn reply_thread_roots_at_original() {
    let msg = message("a");
    assert_eq!(msg.reply_thread(), msg.id);

    let mut threaded = message("b");
    let root = MailId::new();
    threaded.thread_id = Some(root);
    assert_eq!(threaded.reply_thread(), root);
}

#[test]
fn mail_type_serializes_as_type_field() {
    let msg = message("x");
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "status");
    assert_eq!(json["priority"], "normal");
}
