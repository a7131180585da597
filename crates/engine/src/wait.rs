// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative long-poll for inbox mail.
//!
//! Producers are separate processes, so there is no in-memory event to wait
//! on: the loop polls the store with bounded backoff. Cancellation is
//! polite: the cancel file is only checked between sleeps, so worst-case
//! cancellation latency is one poll interval.

use std::path::PathBuf;
use std::time::Duration;

use ovs_adapters::NudgeSender;
use ovs_core::{Clock, MailMessage, PendingNudge};
use ovs_storage::PendingNudges;

use crate::broker::MailBroker;
use crate::Result;

pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_INITIAL_POLL_MS: u64 = 1_000;
pub const DEFAULT_MAX_POLL_MS: u64 = 10_000;
pub const DEFAULT_BACKOFF: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct MailWaitOptions {
    pub timeout_ms: u64,
    pub initial_poll_ms: u64,
    pub max_poll_ms: u64,
    /// Poll-interval growth factor; clamped to ≥ 1.
    pub backoff: f64,
    /// When this file exists the wait returns `Cancelled`.
    pub cancel_file: Option<PathBuf>,
    /// Wake on a pending nudge (coordinator and lead capabilities).
    pub wake_on_pending_nudge: bool,
}

impl Default for MailWaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            initial_poll_ms: DEFAULT_INITIAL_POLL_MS,
            max_poll_ms: DEFAULT_MAX_POLL_MS,
            backoff: DEFAULT_BACKOFF,
            cancel_file: None,
            wake_on_pending_nudge: false,
        }
    }
}

/// Why the wait returned.
#[derive(Debug)]
pub enum MailWaitOutcome {
    /// Mail arrived (and possibly a nudge cleared in the same iteration).
    Message { messages: Vec<MailMessage>, nudge: Option<PendingNudge> },
    /// A pending nudge woke the wait with no mail.
    Nudged { nudge: PendingNudge },
    Timeout,
    Cancelled,
}

/// Block until mail, nudge, timeout, or cancellation.
///
/// Each iteration checks the inbox (which heartbeats `agent`), so a waiting
/// agent never reads as stalled to the watchdog.
pub async fn wait_for_mail<C: Clock, N: NudgeSender>(
    broker: &MailBroker<C, N>,
    nudges: &PendingNudges,
    agent: &str,
    options: &MailWaitOptions,
) -> Result<MailWaitOutcome> {
    let clock = broker.clock().clone();
    let started = clock.epoch_ms();
    let backoff = options.backoff.max(1.0);
    let mut poll_ms = options.initial_poll_ms.max(1);

    loop {
        if let Some(cancel_file) = &options.cancel_file {
            if cancel_file.exists() {
                return Ok(MailWaitOutcome::Cancelled);
            }
        }

        let nudge = if options.wake_on_pending_nudge {
            nudges.read_and_clear(agent)?
        } else {
            None
        };

        let messages = broker.check(agent).await?;
        if !messages.is_empty() {
            return Ok(MailWaitOutcome::Message { messages, nudge });
        }
        if let Some(nudge) = nudge {
            return Ok(MailWaitOutcome::Nudged { nudge });
        }

        let elapsed = clock.epoch_ms().saturating_sub(started);
        if elapsed >= options.timeout_ms {
            return Ok(MailWaitOutcome::Timeout);
        }
        let remaining = options.timeout_ms - elapsed;

        tokio::time::sleep(Duration::from_millis(poll_ms.min(remaining))).await;
        poll_ms = options
            .max_poll_ms
            .min(options.initial_poll_ms.max((poll_ms as f64 * backoff).floor() as u64));
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
