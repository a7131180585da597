// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable keyed record of all agent sessions.
//!
//! Keyed by `agent_name`; every update is a single SQL statement so
//! concurrent CLI and watchdog processes see atomic row transitions.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection};

use ovs_core::{AgentSession, AgentState, Capability, SessionId};

use crate::{column_parse_error, Result, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id                TEXT NOT NULL,
    agent_name        TEXT PRIMARY KEY,
    capability        TEXT NOT NULL,
    worktree_path     TEXT NOT NULL,
    branch_name       TEXT NOT NULL,
    bead_id           TEXT NOT NULL DEFAULT '',
    tmux_session      TEXT NOT NULL,
    state             TEXT NOT NULL,
    pid               INTEGER,
    parent_agent      TEXT,
    depth             INTEGER NOT NULL DEFAULT 0,
    run_id            TEXT,
    started_at        INTEGER NOT NULL,
    last_activity     INTEGER NOT NULL,
    escalation_level  INTEGER NOT NULL DEFAULT 0,
    stalled_since     INTEGER
);
CREATE INDEX IF NOT EXISTS idx_sessions_run ON sessions(run_id);
CREATE INDEX IF NOT EXISTS idx_sessions_state ON sessions(state);
";

const COLUMNS: &str = "id, agent_name, capability, worktree_path, branch_name, bead_id, \
     tmux_session, state, pid, parent_agent, depth, run_id, started_at, last_activity, \
     escalation_level, stalled_since";

/// Session store backed by one SQLite database under the `sessions` state
/// directory.
#[derive(Clone)]
pub struct SessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SessionStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("store.db"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Insert or replace by `agent_name`.
    pub fn upsert(&self, session: &AgentSession) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO sessions (id, agent_name, capability, worktree_path, \
             branch_name, bead_id, tmux_session, state, pid, parent_agent, depth, run_id, \
             started_at, last_activity, escalation_level, stalled_since) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                session.id.as_str(),
                session.agent_name,
                session.capability.as_str(),
                session.worktree_path.to_string_lossy().into_owned(),
                session.branch_name,
                session.bead_id,
                session.tmux_session,
                session.state.as_str(),
                session.pid,
                session.parent_agent,
                session.depth,
                session.run_id,
                session.started_at,
                session.last_activity,
                session.escalation_level,
                session.stalled_since,
            ],
        )?;
        Ok(())
    }

    pub fn get_by_name(&self, agent_name: &str) -> Result<Option<AgentSession>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!("SELECT {COLUMNS} FROM sessions WHERE agent_name = ?1"))?;
        let mut rows = stmt.query_map(params![agent_name], row_to_session)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn get_by_run(&self, run_id: &str) -> Result<Vec<AgentSession>> {
        self.select(&format!("SELECT {COLUMNS} FROM sessions WHERE run_id = ?1 ORDER BY started_at, agent_name"), params![run_id])
    }

    pub fn get_all(&self) -> Result<Vec<AgentSession>> {
        self.select(&format!("SELECT {COLUMNS} FROM sessions ORDER BY started_at, agent_name"), params![])
    }

    /// Sessions whose state is booting, working, or stalled.
    pub fn get_active(&self) -> Result<Vec<AgentSession>> {
        self.select(
            &format!(
                "SELECT {COLUMNS} FROM sessions \
                 WHERE state IN ('booting', 'working', 'stalled') ORDER BY started_at, agent_name"
            ),
            params![],
        )
    }

    /// Single-statement state transition.
    ///
    /// A transition into a terminal state also clears `escalation_level` and
    /// `stalled_since` in the same statement, so the reset-on-terminal
    /// invariant holds even under crash between writes.
    pub fn update_state(&self, agent_name: &str, state: AgentState) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions SET \
                 state = ?1, \
                 escalation_level = CASE WHEN ?1 IN ('completed', 'zombie') THEN 0 \
                     ELSE escalation_level END, \
                 stalled_since = CASE WHEN ?1 IN ('completed', 'zombie') THEN NULL \
                     ELSE stalled_since END \
             WHERE agent_name = ?2",
            params![state.as_str(), agent_name],
        )?;
        self.require_row(changed, agent_name)
    }

    pub fn update_last_activity(&self, agent_name: &str, now_ms: u64) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions SET last_activity = ?1 WHERE agent_name = ?2",
            params![now_ms, agent_name],
        )?;
        self.require_row(changed, agent_name)
    }

    pub fn update_escalation(
        &self,
        agent_name: &str,
        level: u8,
        stalled_since: Option<u64>,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions SET escalation_level = ?1, stalled_since = ?2 WHERE agent_name = ?3",
            params![level, stalled_since, agent_name],
        )?;
        self.require_row(changed, agent_name)
    }

    /// Mail activity heartbeat: touch `last_activity` and lift a booting or
    /// stalled session back to working, in one statement.
    pub fn record_heartbeat(&self, agent_name: &str, now_ms: u64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE sessions SET \
                 last_activity = ?1, \
                 state = CASE WHEN state IN ('booting', 'stalled') THEN 'working' ELSE state END \
             WHERE agent_name = ?2",
            params![now_ms, agent_name],
        )?;
        // Unknown senders are fine: not every mail author is a tracked session.
        Ok(())
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<AgentSession>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn require_row(&self, changed: usize, agent_name: &str) -> Result<()> {
        if changed == 0 {
            return Err(StorageError::NotFound { what: "session", id: agent_name.to_string() });
        }
        Ok(())
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<AgentSession> {
    let capability: String = row.get(2)?;
    let state: String = row.get(7)?;
    Ok(AgentSession {
        id: SessionId::from_string(row.get::<_, String>(0)?),
        agent_name: row.get(1)?,
        capability: capability
            .parse::<Capability>()
            .map_err(|e| column_parse_error(2, e))?,
        worktree_path: row.get::<_, String>(3)?.into(),
        branch_name: row.get(4)?,
        bead_id: row.get(5)?,
        tmux_session: row.get(6)?,
        state: state.parse::<AgentState>().map_err(|e| column_parse_error(7, e))?,
        pid: row.get(8)?,
        parent_agent: row.get(9)?,
        depth: row.get(10)?,
        run_id: row.get(11)?,
        started_at: row.get(12)?,
        last_activity: row.get(13)?,
        escalation_level: row.get(14)?,
        stalled_since: row.get(15)?,
    })
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
