// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ovs_core::{MailId, MessageType, Priority};

fn message() -> MailMessage {
    MailMessage {
        id: MailId::from_string("msg-abc"),
        from: "coordinator".to_string(),
        to: "builder-1".to_string(),
        subject: "need status".to_string(),
        body: "how is it going?".to_string(),
        priority: Priority::High,
        mail_type: MessageType::Question,
        thread_id: Some(MailId::from_string("msg-root")),
        payload: None,
        read: false,
        created_at: SystemClock.epoch_ms(),
    }
}

#[test]
fn zero_timestamp_renders_dash() {
    assert_eq!(format_time_ago(0), "-");
}

#[test]
fn fresh_timestamp_renders_seconds() {
    let rendered = format_time_ago(SystemClock.epoch_ms());
    assert!(rendered.ends_with('s'), "got {rendered}");
}

#[test]
fn message_line_carries_id_type_and_subject() {
    let line = format_message_line(&message());
    assert!(line.contains("msg-abc"));
    assert!(line.contains("[question/high]"));
    assert!(line.contains("need status"));
}

#[test]
fn full_message_includes_thread_and_body() {
    let full = format_message_full(&message());
    assert!(full.contains("From: coordinator"));
    assert!(full.contains("To: builder-1"));
    assert!(full.contains("Thread: msg-root"));
    assert!(full.contains("how is it going?"));
}
