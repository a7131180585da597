// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nudge sender: the out-of-band attention signal.
//!
//! Delivery writes a per-recipient marker file that the recipient reads on
//! its next inbox poll, never keystrokes into the recipient's terminal,
//! which would corrupt a tool call in progress. A recipient that checked
//! its mail inside the debounce window is considered attentive and is not
//! re-nudged unless the caller forces delivery.

use async_trait::async_trait;

use ovs_core::{Clock, MailId, PendingNudge};
use ovs_storage::{MailCheckState, PendingNudges};

use crate::Result;

/// Recipients that checked mail within this window are not re-nudged
/// (unless forced).
pub const DEFAULT_NUDGE_DEBOUNCE_MS: u64 = 60_000;

/// One nudge to deliver.
#[derive(Debug, Clone)]
pub struct NudgeRequest {
    pub recipient: String,
    pub from: String,
    pub reason: String,
    pub subject: String,
    pub message_id: Option<MailId>,
    /// Bypass the mail-check debounce window.
    pub force: bool,
}

/// Delivery outcome; `reason` explains a skipped delivery.
#[derive(Debug, Clone)]
pub struct NudgeOutcome {
    pub delivered: bool,
    pub reason: Option<String>,
}

impl NudgeOutcome {
    fn delivered() -> Self {
        Self { delivered: true, reason: None }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self { delivered: false, reason: Some(reason.into()) }
    }
}

/// Nudge-delivery capability.
#[async_trait]
pub trait NudgeSender: Clone + Send + Sync + 'static {
    async fn deliver(&self, request: &NudgeRequest) -> Result<NudgeOutcome>;
}

/// Real sender backed by the pending-nudge markers and the mail-check
/// debounce state.
#[derive(Clone)]
pub struct MarkerNudgeSender<C: Clock> {
    nudges: PendingNudges,
    check_state: MailCheckState,
    debounce_ms: u64,
    clock: C,
}

impl<C: Clock> MarkerNudgeSender<C> {
    pub fn new(nudges: PendingNudges, check_state: MailCheckState, clock: C) -> Self {
        Self { nudges, check_state, debounce_ms: DEFAULT_NUDGE_DEBOUNCE_MS, clock }
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }
}

#[async_trait]
impl<C: Clock> NudgeSender for MarkerNudgeSender<C> {
    async fn deliver(&self, request: &NudgeRequest) -> Result<NudgeOutcome> {
        let now = self.clock.epoch_ms();

        if !request.force {
            if let Some(last) = self.check_state.last_check(&request.recipient)? {
                let age = now.saturating_sub(last);
                if age < self.debounce_ms {
                    return Ok(NudgeOutcome::skipped(format!(
                        "recipient checked mail {age}ms ago (debounce {}ms)",
                        self.debounce_ms
                    )));
                }
            }
        }

        let mut nudge = PendingNudge::new(&request.from, &request.reason, now)
            .with_subject(&request.subject);
        if let Some(id) = request.message_id {
            nudge = nudge.with_message_id(id);
        }
        self.nudges.write(&request.recipient, &nudge)?;
        Ok(NudgeOutcome::delivered())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake nudge sender recording requests for tests.
    #[derive(Clone, Default)]
    pub struct FakeNudgeSender {
        inner: Arc<Mutex<Vec<NudgeRequest>>>,
    }

    impl FakeNudgeSender {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn deliveries(&self) -> Vec<NudgeRequest> {
            self.inner.lock().clone()
        }
    }

    #[async_trait]
    impl NudgeSender for FakeNudgeSender {
        async fn deliver(&self, request: &NudgeRequest) -> Result<NudgeOutcome> {
            self.inner.lock().push(request.clone());
            Ok(NudgeOutcome::delivered())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNudgeSender;

#[cfg(test)]
#[path = "nudge_tests.rs"]
mod tests;
