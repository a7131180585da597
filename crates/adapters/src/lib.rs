// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-collaborator adapters for the Overstory coordination core.
//!
//! Every collaborator is a capability trait with a real implementation that
//! shells out (time-bounded, fail-open where the contract demands it) and a
//! fake that records calls for tests. The watchdog and broker only ever see
//! the traits.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod beads;
mod mulch;
mod nudge;
mod tmux;
mod triage;

pub use beads::{BeadsTracker, TicketTracker};
pub use mulch::{FailureRecord, LearningStore, MulchAdapter};
pub use nudge::{MarkerNudgeSender, NudgeOutcome, NudgeRequest, NudgeSender, DEFAULT_NUDGE_DEBOUNCE_MS};
pub use tmux::{TerminalMux, TmuxAdapter};
pub use triage::{CommandTriage, Triage, TriageRequest, TriageVerdict};

#[cfg(any(test, feature = "test-support"))]
pub use beads::FakeTracker;
#[cfg(any(test, feature = "test-support"))]
pub use mulch::FakeLearningStore;
#[cfg(any(test, feature = "test-support"))]
pub use nudge::FakeNudgeSender;
#[cfg(any(test, feature = "test-support"))]
pub use tmux::FakeTerminalMux;
#[cfg(any(test, feature = "test-support"))]
pub use triage::FakeTriage;

use thiserror::Error;

/// Errors from adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{what} timed out")]
    Timeout { what: &'static str },

    #[error("{what} failed: {detail}")]
    CommandFailed { what: &'static str, detail: String },

    #[error(transparent)]
    Storage(#[from] ovs_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
