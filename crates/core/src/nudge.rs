// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-nudge marker payload.
//!
//! Nudges are out-of-band attention signals: one marker file per recipient,
//! read and cleared on the recipient's next inbox poll. Writing keystrokes
//! into a worker's terminal mid-tool-call corrupts its input, so priority
//! signals always travel through this side-band instead.

use crate::mail::MailId;
use serde::{Deserialize, Serialize};

/// Marker file contents. A new marker for the same recipient overwrites any
/// prior one; only the latest matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingNudge {
    pub from: String,
    pub reason: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MailId>,
    pub created_at: u64,
}

impl PendingNudge {
    pub fn new(from: impl Into<String>, reason: impl Into<String>, created_at: u64) -> Self {
        Self {
            from: from.into(),
            reason: reason.into(),
            subject: String::new(),
            message_id: None,
            created_at,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_message_id(mut self, id: MailId) -> Self {
        self.message_id = Some(id);
        self
    }
}
