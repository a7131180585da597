// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session outcome metrics: one row per terminated session.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use ovs_core::Capability;

use crate::{column_parse_error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS metrics (
    agent_name   TEXT NOT NULL,
    capability   TEXT NOT NULL,
    run_id       TEXT,
    started_at   INTEGER NOT NULL,
    ended_at     INTEGER NOT NULL,
    outcome      TEXT NOT NULL,
    tokens       INTEGER,
    cost_usd     REAL
);
CREATE INDEX IF NOT EXISTS idx_metrics_run ON metrics(run_id);
";

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed,
    /// Terminal process death observed by the watchdog.
    Zombie,
    /// Killed by the escalation ladder or triage.
    Terminated,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Zombie => "zombie",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionOutcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "zombie" => Ok(Self::Zombie),
            "terminated" => Ok(Self::Terminated),
            other => Err(format!("unknown session outcome: {}", other)),
        }
    }
}

/// One terminated session's record. Token and cost totals are filled in by
/// the spawn path when available; the watchdog records timing and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub agent_name: String,
    pub capability: Capability,
    pub run_id: Option<String>,
    pub started_at: u64,
    pub ended_at: u64,
    pub outcome: SessionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

/// Metrics store backed by one SQLite database under the `metrics` state
/// directory.
#[derive(Clone)]
pub struct MetricsStore {
    conn: Arc<Mutex<Connection>>,
}

impl MetricsStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("store.db"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn record(&self, metrics: &SessionMetrics) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO metrics (agent_name, capability, run_id, started_at, ended_at, \
             outcome, tokens, cost_usd) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                metrics.agent_name,
                metrics.capability.as_str(),
                metrics.run_id,
                metrics.started_at,
                metrics.ended_at,
                metrics.outcome.as_str(),
                metrics.tokens,
                metrics.cost_usd,
            ],
        )?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<SessionMetrics>> {
        self.select("SELECT agent_name, capability, run_id, started_at, ended_at, outcome, \
             tokens, cost_usd FROM metrics ORDER BY ended_at", params![])
    }

    pub fn for_run(&self, run_id: &str) -> Result<Vec<SessionMetrics>> {
        self.select(
            "SELECT agent_name, capability, run_id, started_at, ended_at, outcome, tokens, \
             cost_usd FROM metrics WHERE run_id = ?1 ORDER BY ended_at",
            params![run_id],
        )
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<SessionMetrics>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_metrics)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn row_to_metrics(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionMetrics> {
    let capability: String = row.get(1)?;
    let outcome: String = row.get(5)?;
    Ok(SessionMetrics {
        agent_name: row.get(0)?,
        capability: capability.parse().map_err(|e: String| column_parse_error(1, e))?,
        run_id: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        outcome: outcome.parse().map_err(|e: String| column_parse_error(5, e))?,
        tokens: row.get(6)?,
        cost_usd: row.get(7)?,
    })
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
