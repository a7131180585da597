// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only log of structured coordination events.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection};

use ovs_core::{EventLevel, StructuredEvent};

use crate::{column_parse_error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id           TEXT,
    agent_name       TEXT NOT NULL,
    session_id       TEXT,
    event_type       TEXT NOT NULL,
    tool_name        TEXT,
    tool_args        TEXT,
    tool_duration_ms INTEGER,
    level            TEXT NOT NULL,
    data             TEXT NOT NULL,
    created_at       INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_run ON events(run_id);
CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
";

const COLUMNS: &str = "seq, run_id, agent_name, session_id, event_type, tool_name, tool_args, \
     tool_duration_ms, level, data, created_at";

/// One persisted event with its append sequence.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub seq: u64,
    pub created_at: u64,
    pub event: StructuredEvent,
}

/// Event store backed by one SQLite database under the `events` state
/// directory.
#[derive(Clone)]
pub struct EventStore {
    conn: Arc<Mutex<Connection>>,
}

impl EventStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("store.db"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn append(&self, event: &StructuredEvent, now_ms: u64) -> Result<()> {
        let data = serde_json::to_string(&event.data)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO events (run_id, agent_name, session_id, event_type, tool_name, \
             tool_args, tool_duration_ms, level, data, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                event.run_id,
                event.agent_name,
                event.session_id,
                event.event_type,
                event.tool_name,
                event.tool_args,
                event.tool_duration_ms,
                event.level.as_str(),
                data,
                now_ms,
            ],
        )?;
        Ok(())
    }

    /// Most-recent events, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<EventRow>> {
        self.select(
            &format!("SELECT {COLUMNS} FROM events ORDER BY seq DESC LIMIT {limit}"),
            params![],
        )
    }

    /// Events for one run, in append order.
    pub fn by_run(&self, run_id: &str) -> Result<Vec<EventRow>> {
        self.select(
            &format!("SELECT {COLUMNS} FROM events WHERE run_id = ?1 ORDER BY seq"),
            params![run_id],
        )
    }

    /// Events of one type, in append order.
    pub fn by_type(&self, event_type: &str) -> Result<Vec<EventRow>> {
        self.select(
            &format!("SELECT {COLUMNS} FROM events WHERE event_type = ?1 ORDER BY seq"),
            params![event_type],
        )
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<EventRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_event)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    let level: String = row.get(8)?;
    let data: String = row.get(9)?;
    Ok(EventRow {
        seq: row.get(0)?,
        created_at: row.get(10)?,
        event: StructuredEvent {
            run_id: row.get(1)?,
            agent_name: row.get(2)?,
            session_id: row.get(3)?,
            event_type: row.get(4)?,
            tool_name: row.get(5)?,
            tool_args: row.get(6)?,
            tool_duration_ms: row.get(7)?,
            level: level.parse::<EventLevel>().map_err(|e| column_parse_error(8, e))?,
            data: serde_json::from_str(&data).unwrap_or(serde_json::Value::Null),
        },
    })
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
