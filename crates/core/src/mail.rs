// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-agent mail messages.
//!
//! Messages are immutable once sent except for the `read` flag. Group
//! addresses (`@all`, `@workers`, `@<capability>`) are never stored; the
//! broker expands them to individual recipients at send time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id! {
    /// Short opaque mail message token.
    pub struct MailId("msg-");
}

/// Delivery priority. High and urgent sends also write a pending-nudge
/// marker for the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn triggers_nudge(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Message type: semantic kinds plus the coordination protocol vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Status,
    Question,
    Result,
    Error,
    WorkerDone,
    MergeReady,
    Merged,
    MergeFailed,
    Escalation,
    HealthCheck,
    Dispatch,
    Assign,
}

impl MessageType {
    /// Protocol types that always write a pending-nudge marker on send.
    pub fn triggers_nudge(&self) -> bool {
        matches!(
            self,
            Self::WorkerDone | Self::MergeReady | Self::Error | Self::Escalation | Self::MergeFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Question => "question",
            Self::Result => "result",
            Self::Error => "error",
            Self::WorkerDone => "worker_done",
            Self::MergeReady => "merge_ready",
            Self::Merged => "merged",
            Self::MergeFailed => "merge_failed",
            Self::Escalation => "escalation",
            Self::HealthCheck => "health_check",
            Self::Dispatch => "dispatch",
            Self::Assign => "assign",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(Self::Status),
            "question" => Ok(Self::Question),
            "result" => Ok(Self::Result),
            "error" => Ok(Self::Error),
            "worker_done" => Ok(Self::WorkerDone),
            "merge_ready" => Ok(Self::MergeReady),
            "merged" => Ok(Self::Merged),
            "merge_failed" => Ok(Self::MergeFailed),
            "escalation" => Ok(Self::Escalation),
            "health_check" => Ok(Self::HealthCheck),
            "dispatch" => Ok(Self::Dispatch),
            "assign" => Ok(Self::Assign),
            other => Err(format!("unknown message type: {}", other)),
        }
    }
}

/// One durable mail message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: MailId,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub mail_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<MailId>,
    /// Opaque encoded structured data (JSON text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub read: bool,
    pub created_at: u64,
}

impl MailMessage {
    /// Whether this message's priority or type demands an auto-nudge marker.
    pub fn triggers_nudge(&self) -> bool {
        self.priority.triggers_nudge() || self.mail_type.triggers_nudge()
    }

    /// Subject for a reply, prefixing `Re: ` exactly once.
    pub fn reply_subject(&self) -> String {
        if self.subject.starts_with("Re: ") {
            self.subject.clone()
        } else {
            format!("Re: {}", self.subject)
        }
    }

    /// Thread id a reply should carry: the original's thread, or the
    /// original itself as thread root.
    pub fn reply_thread(&self) -> MailId {
        self.thread_id.unwrap_or(self.id)
    }
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
