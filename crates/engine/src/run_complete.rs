// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-completion detector.
//!
//! When every non-persistent worker in the active run is `completed`, the
//! coordinator gets exactly one notification. The dedup marker is the only
//! hard once-only boundary; every later step is best-effort.

use std::collections::BTreeMap;

use ovs_adapters::NudgeSender;
use ovs_core::{
    event_types, AgentSession, AgentState, Capability, Clock, MessageType, Priority,
    StructuredEvent,
};
use ovs_storage::{CurrentRun, EventStore, RunCompleteMarker, SessionStore};

use crate::broker::{MailBroker, SendRequest};
use crate::watchdog::WATCHDOG_AGENT;
use crate::Result;

/// Recipient of the completion notification.
const COORDINATOR: &str = "coordinator";

/// Borrowed view of everything the detector needs.
pub struct RunCompletionCtx<'a, C: Clock, N: NudgeSender> {
    pub current_run: &'a CurrentRun,
    pub sessions: &'a SessionStore,
    pub marker: &'a RunCompleteMarker,
    pub broker: &'a MailBroker<C, N>,
    pub events: &'a EventStore,
}

/// Check the active run; returns the run id if the notification fired.
pub async fn check_run_complete<C: Clock, N: NudgeSender>(
    ctx: &RunCompletionCtx<'_, C, N>,
) -> Result<Option<String>> {
    let Some(run_id) = ctx.current_run.get()? else {
        return Ok(None);
    };

    let sessions = ctx.sessions.get_by_run(&run_id)?;
    let workers: Vec<&AgentSession> =
        sessions.iter().filter(|s| !s.capability.is_persistent()).collect();
    if workers.is_empty() {
        return Ok(None);
    }
    if workers.iter().any(|w| w.state != AgentState::Completed) {
        return Ok(None);
    }

    // The only hard dedup boundary.
    if ctx.marker.last_notified()?.as_deref() == Some(run_id.as_str()) {
        return Ok(None);
    }

    let (subject, body) = completion_message(&run_id, &workers);
    let request = SendRequest::new(WATCHDOG_AGENT, COORDINATOR)
        .subject(subject)
        .body(body)
        .mail_type(MessageType::Status)
        .priority(Priority::High)
        .force();
    if let Err(e) = ctx.broker.send(request).await {
        tracing::warn!(run_id = %run_id, error = %e, "run-complete notification failed");
    }

    let event = StructuredEvent::new(WATCHDOG_AGENT, event_types::RUN_COMPLETE)
        .with_run_id(&run_id)
        .with_data(serde_json::json!({ "workers": workers.len() }));
    if let Err(e) = ctx.events.append(&event, ctx.broker.clock().epoch_ms()) {
        tracing::warn!(run_id = %run_id, error = %e, "run_complete event dropped");
    }

    if let Err(e) = ctx.marker.record(&run_id) {
        // Worst case this costs one duplicate notification next tick.
        tracing::warn!(run_id = %run_id, error = %e, "run-complete marker write failed");
    }

    tracing::info!(run_id = %run_id, workers = workers.len(), "run complete");
    Ok(Some(run_id))
}

/// Phase-aware completion message: a capability-specific template when the
/// run was uniform, otherwise a summary with a sorted capability breakdown.
fn completion_message(run_id: &str, workers: &[&AgentSession]) -> (String, String) {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for worker in workers {
        *counts.entry(worker.capability.as_str()).or_default() += 1;
    }

    if counts.len() == 1 {
        let n = workers.len();
        let capability = workers[0].capability;
        let subject = format!("run {run_id}: all {}s done", capability.as_str());
        let body = match capability {
            Capability::Scout => format!(
                "All {n} scout(s) finished reconnaissance. Review their findings and \
                 dispatch the build phase."
            ),
            Capability::Builder => format!(
                "All {n} builder(s) finished their tasks. Review results and dispatch \
                 review or merge work."
            ),
            Capability::Reviewer => format!(
                "All {n} reviewer(s) finished. Collect verdicts and dispatch follow-up \
                 or merge work."
            ),
            Capability::Merger => {
                format!("All {n} merge task(s) settled. The run can be closed out.")
            }
            _ => format!("All {n} worker(s) in run {run_id} reached terminal state."),
        };
        return (subject, body);
    }

    let breakdown = counts
        .iter()
        .map(|(capability, n)| format!("{capability}: {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    (
        format!("run {run_id} complete"),
        format!(
            "All {} workers reached terminal state ({breakdown}). Review results and \
             dispatch the next phase or close the run.",
            workers.len()
        ),
    )
}

#[cfg(test)]
#[path = "run_complete_tests.rs"]
mod tests;
