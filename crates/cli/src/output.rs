// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;

use ovs_core::{format_elapsed, Clock, MailMessage, SystemClock};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a timestamp as relative age (e.g., "5s", "2m", "1h", "3d").
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    let now_ms = SystemClock.epoch_ms();
    format_elapsed(now_ms.saturating_sub(epoch_ms) / 1000)
}

/// One-line inbox rendering: `id  from  [type/priority]  subject (age)`.
pub fn format_message_line(message: &MailMessage) -> String {
    format!(
        "{}  {:>12}  [{}/{}]  {} ({})",
        message.id,
        message.from,
        message.mail_type,
        message.priority,
        message.subject,
        format_time_ago(message.created_at),
    )
}

/// Full message rendering for `mail get` and `mail check`.
pub fn format_message_full(message: &MailMessage) -> String {
    let mut out = String::new();
    out.push_str(&format!("From: {}\n", message.from));
    out.push_str(&format!("To: {}\n", message.to));
    out.push_str(&format!("Subject: {}\n", message.subject));
    out.push_str(&format!(
        "Type: {} / {} ({})\n",
        message.mail_type,
        message.priority,
        format_time_ago(message.created_at)
    ));
    if let Some(thread) = &message.thread_id {
        out.push_str(&format!("Thread: {}\n", thread));
    }
    out.push('\n');
    out.push_str(&message.body);
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
