// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized tick scheduler.
//!
//! One tick runs to completion, then the next is scheduled `interval`
//! later, so ticks never overlap. The first tick fires immediately on start.
//! Shutdown cancels the scheduling, not an in-flight tick: any running tick
//! completes, then the loop exits.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use ovs_engine::TickSummary;

/// Drive `tick` until `shutdown` flips to true.
pub async fn run_scheduler<F, Fut>(
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = TickSummary>,
{
    loop {
        let summary = tick().await;
        tracing::debug!(
            evaluated = summary.sessions_evaluated,
            terminated = summary.terminated,
            escalations = summary.escalations,
            autocompleted = summary.autocompleted,
            "tick complete"
        );
        if let Some(run_id) = &summary.run_completed {
            tracing::info!(run_id = %run_id, "run completion announced");
        }

        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
