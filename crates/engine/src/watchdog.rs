// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hierarchical watchdog.
//!
//! Each tick reconciles every non-completed session against observable
//! reality (terminal liveness, external-ticket status), applies state
//! transitions, and drives stalled sessions through the escalation ladder:
//! warn → nudge → triage → terminate, advanced by elapsed time.
//!
//! The tick must never take the supervisor down: per-session failures are
//! logged and the remaining sessions still evaluate, external collaborators
//! fail open, and the next tick retries naturally.

use std::path::PathBuf;
use std::sync::Arc;

use ovs_adapters::{
    FailureRecord, LearningStore, NudgeRequest, NudgeSender, TerminalMux, TicketTracker, Triage,
    TriageRequest, TriageVerdict,
};
use ovs_core::{
    event_types, AgentSession, AgentState, Capability, Clock, EventLevel, MessageType, Priority,
    StructuredEvent,
};
use ovs_storage::{
    CurrentRun, EventStore, MetricsStore, RunCompleteMarker, SessionMetrics, SessionOutcome,
    SessionStore,
};

use crate::broker::{MailBroker, SendRequest};
use crate::health::{evaluate_health, expected_escalation_level, HealthAction, WatchdogThresholds};
use crate::run_complete::{check_run_complete, RunCompletionCtx};
use crate::Result;

/// Sender name the watchdog uses on the mail bus.
pub const WATCHDOG_AGENT: &str = "watchdog";

/// Learning-store domain for failure records.
const LEARNING_DOMAIN: &str = "overstory";

/// Operator surface for per-session health observations.
pub trait HealthSink: Send + Sync + 'static {
    fn on_health_check(&self, report: &HealthReport);
}

/// No-op sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHealthSink;

impl HealthSink for NoopHealthSink {
    fn on_health_check(&self, _report: &HealthReport) {}
}

/// One session's observation, handed to the health sink every tick.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub agent_name: String,
    pub capability: Capability,
    pub recorded_state: AgentState,
    pub new_state: AgentState,
    pub action: HealthAction,
    pub terminal_alive: bool,
    pub activity_age_ms: u64,
    pub reconciliation_note: Option<String>,
}

/// Counters from one tick.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    pub sessions_evaluated: usize,
    pub autocompleted: usize,
    pub terminated: usize,
    pub escalations: usize,
    pub investigations: usize,
    /// Run id if the completion notification fired this tick.
    pub run_completed: Option<String>,
}

/// The watchdog and its injected collaborators.
pub struct Watchdog<C, M, T, L, N, A>
where
    C: Clock,
    M: TerminalMux,
    T: TicketTracker,
    L: LearningStore,
    N: NudgeSender,
    A: Triage,
{
    sessions: SessionStore,
    broker: MailBroker<C, N>,
    events: EventStore,
    metrics: MetricsStore,
    current_run: CurrentRun,
    run_marker: RunCompleteMarker,
    mux: M,
    tracker: T,
    learning: L,
    nudge_sender: N,
    triage: Option<A>,
    clock: C,
    thresholds: WatchdogThresholds,
    health_sink: Arc<dyn HealthSink>,
    project_root: PathBuf,
}

impl<C, M, T, L, N, A> Watchdog<C, M, T, L, N, A>
where
    C: Clock,
    M: TerminalMux,
    T: TicketTracker,
    L: LearningStore,
    N: NudgeSender,
    A: Triage,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: SessionStore,
        broker: MailBroker<C, N>,
        events: EventStore,
        metrics: MetricsStore,
        current_run: CurrentRun,
        run_marker: RunCompleteMarker,
        mux: M,
        tracker: T,
        learning: L,
        nudge_sender: N,
        triage: Option<A>,
        clock: C,
        thresholds: WatchdogThresholds,
        project_root: PathBuf,
    ) -> Self {
        Self {
            sessions,
            broker,
            events,
            metrics,
            current_run,
            run_marker,
            mux,
            tracker,
            learning,
            nudge_sender,
            triage,
            clock,
            thresholds,
            health_sink: Arc::new(NoopHealthSink),
            project_root,
        }
    }

    pub fn with_health_sink(mut self, sink: Arc<dyn HealthSink>) -> Self {
        self.health_sink = sink;
        self
    }

    /// One full reconciliation pass. Never fails; every per-session error is
    /// swallowed so the remaining sessions still evaluate and the next tick
    /// retries.
    pub async fn tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();

        let sessions = match self.sessions.get_all() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "session load failed; skipping tick");
                return summary;
            }
        };

        // One batched ticket lookup per tick; fail-open to the empty set.
        let bead_ids: Vec<String> = sessions
            .iter()
            .filter(|s| s.state != AgentState::Completed && !s.bead_id.is_empty())
            .map(|s| s.bead_id.clone())
            .collect();
        let closed_beads = self.tracker.closed_ids(&bead_ids).await;

        for session in sessions.iter().filter(|s| s.state != AgentState::Completed) {
            summary.sessions_evaluated += 1;
            if let Err(e) = self.evaluate_session(session, &closed_beads, &mut summary).await {
                tracing::warn!(
                    agent = %session.agent_name,
                    error = %e,
                    "session evaluation failed; continuing with remaining sessions"
                );
            }
        }

        match check_run_complete(&RunCompletionCtx {
            current_run: &self.current_run,
            sessions: &self.sessions,
            marker: &self.run_marker,
            broker: &self.broker,
            events: &self.events,
        })
        .await
        {
            Ok(run_completed) => summary.run_completed = run_completed,
            Err(e) => tracing::warn!(error = %e, "run-completion check failed"),
        }

        summary
    }

    async fn evaluate_session(
        &self,
        session: &AgentSession,
        closed_beads: &std::collections::HashSet<String>,
        summary: &mut TickSummary,
    ) -> Result<()> {
        let now = self.clock.epoch_ms();

        // Closed external ticket forces completion; no liveness probe or
        // escalation evaluation for this session.
        if !session.bead_id.is_empty() && closed_beads.contains(&session.bead_id) {
            self.sessions.update_state(&session.agent_name, AgentState::Completed)?;
            self.emit_event(
                StructuredEvent::new(&session.agent_name, event_types::BEAD_CLOSED_AUTOCOMPLETE)
                    .with_session_id(session.id.as_str())
                    .with_data(serde_json::json!({ "bead_id": session.bead_id })),
                session.run_id.as_deref(),
            );
            self.record_metrics(session, SessionOutcome::Completed, now);
            summary.autocompleted += 1;
            return Ok(());
        }

        // Observable state is ground truth: probe every tick, recorded
        // zombies included.
        let terminal_alive = match self.mux.is_alive(&session.tmux_session).await {
            Ok(alive) => alive,
            Err(e) => {
                tracing::warn!(
                    agent = %session.agent_name,
                    error = %e,
                    "liveness probe failed; skipping session this tick"
                );
                return Ok(());
            }
        };

        let verdict = evaluate_health(session, terminal_alive, now, &self.thresholds);

        if let Some(note) = &verdict.reconciliation_note {
            self.emit_event(
                StructuredEvent::new(&session.agent_name, event_types::RECONCILE_NOTE)
                    .with_session_id(session.id.as_str())
                    .with_level(EventLevel::Warn)
                    .with_data(serde_json::json!({ "note": note })),
                session.run_id.as_deref(),
            );
        }

        // Apply the state transition; `investigate` holds the current state
        // and `terminate` owns its own zombie write in `terminate_session`.
        if verdict.action != HealthAction::Investigate
            && verdict.action != HealthAction::Terminate
            && verdict.new_state != session.state
        {
            self.sessions.update_state(&session.agent_name, verdict.new_state)?;
        }

        self.health_sink.on_health_check(&HealthReport {
            agent_name: session.agent_name.clone(),
            capability: session.capability,
            recorded_state: session.state,
            new_state: verdict.new_state,
            action: verdict.action,
            terminal_alive,
            activity_age_ms: session.activity_age_ms(now),
            reconciliation_note: verdict.reconciliation_note.clone(),
        });

        match verdict.action {
            HealthAction::None => {
                // Reset-on-recovery invariant.
                if session.stalled_since.is_some() || session.escalation_level > 0 {
                    self.sessions.update_escalation(&session.agent_name, 0, None)?;
                }
            }
            HealthAction::Investigate => {
                summary.investigations += 1;
            }
            HealthAction::Terminate => {
                self.terminate_session(session, "terminal session died", SessionOutcome::Zombie, 0, None)
                    .await;
                summary.terminated += 1;
            }
            HealthAction::Escalate => {
                summary.escalations += 1;
                let terminated = self.run_escalation(session, verdict.new_state, now).await?;
                if terminated {
                    summary.terminated += 1;
                }
            }
        }

        Ok(())
    }

    /// Progressive escalation ladder, advanced by elapsed time over
    /// `stalled_since` rather than by tick count.
    async fn run_escalation(
        &self,
        session: &AgentSession,
        current_state: AgentState,
        now: u64,
    ) -> Result<bool> {
        let Some(stalled_since) = session.stalled_since else {
            // First detection: arm the ladder at level 0 and extend the
            // one-time unread-inbox courtesy.
            self.sessions.update_escalation(&session.agent_name, 0, Some(now))?;
            self.emit_escalation_event(session, 0, now);
            self.first_stall_inbox_courtesy(session).await;
            return Ok(false);
        };

        let expected =
            expected_escalation_level(stalled_since, now, self.thresholds.nudge_interval_ms);
        let increased = expected > session.escalation_level;
        if increased {
            self.sessions.update_escalation(&session.agent_name, expected, Some(stalled_since))?;
        }

        if expected >= 3 {
            self.terminate_session(
                session,
                "progressive escalation reached terminal level",
                SessionOutcome::Terminated,
                0,
                None,
            )
            .await;
            return Ok(true);
        }

        if !increased {
            return Ok(false);
        }
        self.emit_escalation_event(session, expected, now);

        match expected {
            1 => self.nudge_stalled_agent(session, current_state).await,
            2 => {
                if self.thresholds.triage_enabled {
                    return self.run_triage(session).await;
                }
                // Triage disabled: the ladder keeps advancing toward level 3.
            }
            _ => {}
        }
        Ok(false)
    }

    /// Level 1: force-send a low-priority status mail asking the agent to
    /// report in.
    async fn nudge_stalled_agent(&self, session: &AgentSession, current_state: AgentState) {
        let request = SendRequest::new(WATCHDOG_AGENT, &session.agent_name)
            .subject("status check")
            .body(format!(
                "No activity observed from you for a while (state: {current_state}). \
                 Reply with a status update or keep working; continued silence escalates \
                 to triage and then termination."
            ))
            .mail_type(MessageType::Status)
            .priority(Priority::Low)
            .force();
        if let Err(e) = self.broker.send(request).await {
            tracing::warn!(agent = %session.agent_name, error = %e, "escalation nudge failed");
        }
    }

    /// Level 2: consult the triage collaborator.
    async fn run_triage(&self, session: &AgentSession) -> Result<bool> {
        let Some(triage) = &self.triage else {
            return Ok(false);
        };

        let request = TriageRequest {
            agent_name: session.agent_name.clone(),
            project_root: self.project_root.clone(),
            last_activity: session.last_activity,
        };
        match triage.assess(&request).await {
            Ok(TriageVerdict::Terminate) => {
                self.terminate_session(
                    session,
                    "triage verdict: terminate",
                    SessionOutcome::Terminated,
                    1,
                    Some("terminate"),
                )
                .await;
                Ok(true)
            }
            Ok(TriageVerdict::Retry) => {
                let nudge = NudgeRequest {
                    recipient: session.agent_name.clone(),
                    from: WATCHDOG_AGENT.to_string(),
                    reason: "recovery".to_string(),
                    subject: "triage suggests retrying; please pick the task back up".to_string(),
                    message_id: None,
                    force: true,
                };
                if let Err(e) = self.nudge_sender.deliver(&nudge).await {
                    tracing::warn!(agent = %session.agent_name, error = %e, "recovery nudge failed");
                }
                Ok(false)
            }
            Ok(TriageVerdict::Extend) => Ok(false),
            Err(e) => {
                tracing::warn!(agent = %session.agent_name, error = %e, "triage failed; ladder continues");
                Ok(false)
            }
        }
    }

    /// On the very first stalled tick, tell an agent sitting on unread mail
    /// how to check its inbox. Pre-level-1 courtesy; does not advance the
    /// ladder.
    async fn first_stall_inbox_courtesy(&self, session: &AgentSession) {
        let unread = match self.broker.unread_count(&session.agent_name) {
            Ok(unread) => unread,
            Err(e) => {
                tracing::warn!(agent = %session.agent_name, error = %e, "unread count failed");
                return;
            }
        };
        if unread == 0 {
            return;
        }

        let request = NudgeRequest {
            recipient: session.agent_name.clone(),
            from: WATCHDOG_AGENT.to_string(),
            reason: "unread_mail".to_string(),
            subject: format!(
                "{unread} unread message(s) waiting; run `overstory mail check --agent {}`",
                session.agent_name
            ),
            message_id: None,
            force: true,
        };
        if let Err(e) = self.nudge_sender.deliver(&request).await {
            tracing::warn!(agent = %session.agent_name, error = %e, "inbox courtesy nudge failed");
        }
    }

    /// Record failure, kill the terminal, move the session to zombie, and
    /// write the metrics row. Everything here is best-effort: a partial
    /// termination is retried by the next tick's reconciliation.
    async fn terminate_session(
        &self,
        session: &AgentSession,
        reason: &str,
        outcome: SessionOutcome,
        tier: u8,
        triage_suggestion: Option<&str>,
    ) {
        let now = self.clock.epoch_ms();
        tracing::warn!(
            agent = %session.agent_name,
            tmux = %session.tmux_session,
            reason,
            "terminating session"
        );

        let mut tags = vec![
            "watchdog".to_string(),
            format!("tier{tier}"),
            session.capability.as_str().to_string(),
        ];
        if let Some(suggestion) = triage_suggestion {
            tags.push(format!("triage:{suggestion}"));
        }
        let record = FailureRecord {
            record_type: "failure".to_string(),
            description: format!("agent {} terminated: {}", session.agent_name, reason),
            tags,
            evidence_bead: (!session.bead_id.is_empty()).then(|| session.bead_id.clone()),
        };
        self.learning.record(LEARNING_DOMAIN, &record).await;

        let _ = self.mux.kill_session(&session.tmux_session).await;

        if let Err(e) = self.sessions.update_state(&session.agent_name, AgentState::Zombie) {
            tracing::warn!(agent = %session.agent_name, error = %e, "zombie transition failed");
        }

        self.record_metrics(session, outcome, now);
        self.emit_event(
            StructuredEvent::new(&session.agent_name, event_types::WATCHDOG_TERMINATE)
                .with_session_id(session.id.as_str())
                .with_level(EventLevel::Warn)
                .with_data(serde_json::json!({ "reason": reason, "tier": tier })),
            session.run_id.as_deref(),
        );
    }

    fn emit_escalation_event(&self, session: &AgentSession, level: u8, now: u64) {
        self.emit_event(
            StructuredEvent::new(&session.agent_name, event_types::WATCHDOG_ESCALATE)
                .with_session_id(session.id.as_str())
                .with_level(EventLevel::Warn)
                .with_data(serde_json::json!({
                    "level": level,
                    "activity_age_ms": session.activity_age_ms(now),
                })),
            session.run_id.as_deref(),
        );
    }

    fn record_metrics(&self, session: &AgentSession, outcome: SessionOutcome, now: u64) {
        let metrics = SessionMetrics {
            agent_name: session.agent_name.clone(),
            capability: session.capability,
            run_id: session.run_id.clone(),
            started_at: session.started_at,
            ended_at: now,
            outcome,
            tokens: None,
            cost_usd: None,
        };
        if let Err(e) = self.metrics.record(&metrics) {
            tracing::warn!(agent = %session.agent_name, error = %e, "metrics row dropped");
        }
    }

    /// Event writes are fire-and-forget from the tick's perspective.
    fn emit_event(&self, mut event: StructuredEvent, run_id: Option<&str>) {
        if event.run_id.is_none() {
            event.run_id = run_id.map(str::to_string);
        }
        if let Err(e) = self.events.append(&event, self.clock.epoch_ms()) {
            tracing::warn!(event_type = %event.event_type, error = %e, "event dropped");
        }
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
