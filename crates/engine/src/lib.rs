// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Overstory coordination core.
//!
//! Four cooperating pieces over the durable stores:
//!
//! - [`broker::MailBroker`]: send/check/reply with group fan-out, auto-nudge
//!   markers, and the session heartbeat side effect.
//! - [`wait`]: the cooperative long-poll used by coordination agents.
//! - [`watchdog::Watchdog`]: periodic reconciliation of recorded session
//!   state against observable reality, with a progressive escalation ladder.
//! - [`run_complete`]: the one-shot run-completion detector.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod groups;
pub mod health;
pub mod run_complete;
pub mod wait;
pub mod watchdog;

pub use broker::{MailBroker, SendRequest};
pub use groups::{Address, GroupAddress};
pub use health::{evaluate_health, HealthAction, HealthVerdict, WatchdogThresholds};
pub use wait::{wait_for_mail, MailWaitOptions, MailWaitOutcome};
pub use watchdog::{HealthReport, HealthSink, NoopHealthSink, TickSummary, Watchdog};

use thiserror::Error;

/// Errors from coordination-core operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] ovs_storage::StorageError),

    #[error(transparent)]
    Adapter(#[from] ovs_adapters::AdapterError),

    #[error("unknown group address: {0}")]
    UnknownGroup(String),

    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
