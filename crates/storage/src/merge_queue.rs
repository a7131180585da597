// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge-queue entries: branches handed off by workers, consumed by merger
//! agents through the CLI.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::{column_parse_error, Result, StorageError};

ovs_core::define_id! {
    /// Merge-queue entry identifier.
    pub struct MergeId("mrg-");
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS merge_queue (
    id          TEXT PRIMARY KEY,
    branch      TEXT NOT NULL,
    agent_name  TEXT NOT NULL,
    status      TEXT NOT NULL,
    tier        INTEGER,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_merge_status ON merge_queue(status);
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    Queued,
    Merging,
    Merged,
    Failed,
}

impl MergeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Merging => "merging",
            Self::Merged => "merged",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "merging" => Ok(Self::Merging),
            "merged" => Ok(Self::Merged),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown merge status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeEntry {
    pub id: MergeId,
    pub branch: String,
    pub agent_name: String,
    pub status: MergeStatus,
    /// Conflict-resolution tier decided by the merger.
    pub tier: Option<u32>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Merge-queue store backed by one SQLite database under the `merge-queue`
/// state directory.
#[derive(Clone)]
pub struct MergeQueueStore {
    conn: Arc<Mutex<Connection>>,
}

impl MergeQueueStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("store.db"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn enqueue(&self, branch: &str, agent_name: &str, now_ms: u64) -> Result<MergeId> {
        let id = MergeId::new();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO merge_queue (id, branch, agent_name, status, tier, created_at, \
             updated_at) VALUES (?1, ?2, ?3, 'queued', NULL, ?4, ?4)",
            params![id.as_str(), branch, agent_name, now_ms],
        )?;
        Ok(id)
    }

    pub fn update_status(
        &self,
        id: &MergeId,
        status: MergeStatus,
        tier: Option<u32>,
        now_ms: u64,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE merge_queue SET status = ?1, tier = COALESCE(?2, tier), updated_at = ?3 \
             WHERE id = ?4",
            params![status.as_str(), tier, now_ms, id.as_str()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound { what: "merge entry", id: id.as_str().to_string() });
        }
        Ok(())
    }

    pub fn list(&self, status: Option<MergeStatus>) -> Result<Vec<MergeEntry>> {
        let conn = self.conn.lock();
        let sql = "SELECT id, branch, agent_name, status, tier, created_at, updated_at \
                   FROM merge_queue";
        let rows = match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!("{sql} WHERE status = ?1 ORDER BY created_at"))?;
                let rows = stmt.query_map(params![status.as_str()], row_to_entry)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!("{sql} ORDER BY created_at"))?;
                let rows = stmt.query_map(params![], row_to_entry)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    pub fn get(&self, id: &MergeId) -> Result<Option<MergeEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, branch, agent_name, status, tier, created_at, updated_at \
             FROM merge_queue WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id.as_str()], row_to_entry)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<MergeEntry> {
    let status: String = row.get(3)?;
    Ok(MergeEntry {
        id: MergeId::from_string(row.get::<_, String>(0)?),
        branch: row.get(1)?,
        agent_name: row.get(2)?,
        status: status.parse().map_err(|e: String| column_parse_error(3, e))?,
        tier: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
#[path = "merge_queue_tests.rs"]
mod tests;
