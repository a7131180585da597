// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured coordination events.
//!
//! Every observable action in the coordination core emits one of these into
//! the append-only events store. Writes are fire-and-forget from the
//! watchdog's perspective.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known event type names.
pub mod event_types {
    pub const BEAD_CLOSED_AUTOCOMPLETE: &str = "bead_closed_autocomplete";
    pub const RUN_COMPLETE: &str = "run_complete";
    pub const WATCHDOG_TERMINATE: &str = "watchdog_terminate";
    pub const WATCHDOG_ESCALATE: &str = "watchdog_escalate";
    pub const RECONCILE_NOTE: &str = "reconcile_note";
    pub const MAIL_SENT: &str = "mail_sent";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown event level: {}", other)),
        }
    }
}

/// One structured event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub agent_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_duration_ms: Option<u64>,
    pub level: EventLevel,
    /// Encoded structured payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl StructuredEvent {
    pub fn new(agent_name: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            run_id: None,
            agent_name: agent_name.into(),
            session_id: None,
            event_type: event_type.into(),
            tool_name: None,
            tool_args: None,
            tool_duration_ms: None,
            level: EventLevel::Info,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
