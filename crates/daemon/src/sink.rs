// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health-report sink that surfaces watchdog observations in the daemon log.

use ovs_engine::{HealthAction, HealthReport, HealthSink};

/// Logs every health check; quiet at debug for healthy sessions, warn when
/// the watchdog is about to act.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingHealthSink;

impl HealthSink for TracingHealthSink {
    fn on_health_check(&self, report: &HealthReport) {
        match report.action {
            HealthAction::None => {
                tracing::debug!(
                    agent = %report.agent_name,
                    state = %report.new_state,
                    age_ms = report.activity_age_ms,
                    "healthy"
                );
            }
            HealthAction::Investigate => {
                tracing::warn!(
                    agent = %report.agent_name,
                    state = %report.recorded_state,
                    note = report.reconciliation_note.as_deref().unwrap_or(""),
                    "state conflicts with observed reality"
                );
            }
            HealthAction::Escalate => {
                tracing::warn!(
                    agent = %report.agent_name,
                    state = %report.new_state,
                    age_ms = report.activity_age_ms,
                    "session stalled"
                );
            }
            HealthAction::Terminate => {
                tracing::warn!(
                    agent = %report.agent_name,
                    alive = report.terminal_alive,
                    "session terminal died"
                );
            }
        }
    }
}
