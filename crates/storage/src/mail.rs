// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable mail queue between agents.
//!
//! Messages are immutable except for the `read` flag. `check` marks
//! messages read atomically with the fetch, so a message is delivered to
//! exactly one `check` call.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection};

use ovs_core::{MailId, MailMessage, MessageType, Priority};

use crate::{column_parse_error, Result, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS mail (
    id          TEXT PRIMARY KEY,
    sender      TEXT NOT NULL,
    recipient   TEXT NOT NULL,
    subject     TEXT NOT NULL,
    body        TEXT NOT NULL,
    priority    TEXT NOT NULL,
    type        TEXT NOT NULL,
    thread_id   TEXT,
    payload     TEXT,
    read        INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_mail_recipient_read ON mail(recipient, read);
CREATE INDEX IF NOT EXISTS idx_mail_created ON mail(created_at);
";

const COLUMNS: &str =
    "id, sender, recipient, subject, body, priority, type, thread_id, payload, read, created_at";

/// A message to be sent. Individual recipient only; group addresses are
/// expanded by the broker before reaching the store.
#[derive(Debug, Clone)]
pub struct NewMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub mail_type: MessageType,
    pub thread_id: Option<MailId>,
    pub payload: Option<String>,
}

/// Filters for [`MailStore::list`]. `agent` matches either endpoint.
#[derive(Debug, Clone, Default)]
pub struct MailFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub agent: Option<String>,
    pub unread_only: bool,
    pub limit: Option<usize>,
}

/// Deletion spec for [`MailStore::purge`]. At least one field must be set.
#[derive(Debug, Clone, Default)]
pub struct PurgeSpec {
    pub all: bool,
    /// Delete messages created strictly before this epoch-ms cutoff.
    pub before_ms: Option<u64>,
    /// Restrict deletion to messages where this agent is either endpoint.
    pub agent: Option<String>,
}

/// Mail store backed by one SQLite database under the `mail` state
/// directory.
#[derive(Clone)]
pub struct MailStore {
    conn: Arc<Mutex<Connection>>,
}

impl MailStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("store.db"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Persist one message, returning its id.
    pub fn send(&self, mail: NewMail, now_ms: u64) -> Result<MailId> {
        let id = MailId::new();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO mail (id, sender, recipient, subject, body, priority, type, \
             thread_id, payload, read, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)",
            params![
                id.as_str(),
                mail.from,
                mail.to,
                mail.subject,
                mail.body,
                mail.priority.as_str(),
                mail.mail_type.as_str(),
                mail.thread_id.map(|t| t.as_str().to_string()),
                mail.payload,
                now_ms,
            ],
        )?;
        Ok(id)
    }

    /// Unread messages for `agent`, marked read atomically with the fetch.
    pub fn check(&self, agent: &str) -> Result<Vec<MailMessage>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let messages = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {COLUMNS} FROM mail \
                 WHERE recipient = ?1 AND read = 0 ORDER BY created_at, id"
            ))?;
            let rows = stmt.query_map(params![agent], row_to_message)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.execute("UPDATE mail SET read = 1 WHERE recipient = ?1 AND read = 0", params![agent])?;
        tx.commit()?;
        Ok(messages)
    }

    /// Unread messages without marking them read.
    pub fn get_unread(&self, agent: &str) -> Result<Vec<MailMessage>> {
        self.select(
            &format!(
                "SELECT {COLUMNS} FROM mail WHERE recipient = ?1 AND read = 0 \
                 ORDER BY created_at, id"
            ),
            params![agent],
        )
    }

    pub fn unread_count(&self, agent: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM mail WHERE recipient = ?1 AND read = 0",
            params![agent],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn get(&self, id: &MailId) -> Result<Option<MailMessage>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM mail WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id.as_str()], row_to_message)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Idempotent; returns whether the message was already read.
    pub fn mark_read(&self, id: &MailId) -> Result<bool> {
        let conn = self.conn.lock();
        let already: i64 = conn
            .query_row("SELECT read FROM mail WHERE id = ?1", params![id.as_str()], |row| {
                row.get(0)
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::NotFound {
                    what: "message",
                    id: id.as_str().to_string(),
                },
                other => other.into(),
            })?;
        conn.execute("UPDATE mail SET read = 1 WHERE id = ?1", params![id.as_str()])?;
        Ok(already != 0)
    }

    /// Filtered read-only view; never changes read flags.
    pub fn list(&self, filter: &MailFilter) -> Result<Vec<MailMessage>> {
        let mut sql = format!("SELECT {COLUMNS} FROM mail WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(from) = &filter.from {
            args.push(from.clone());
            sql.push_str(&format!(" AND sender = ?{}", args.len()));
        }
        if let Some(to) = &filter.to {
            args.push(to.clone());
            sql.push_str(&format!(" AND recipient = ?{}", args.len()));
        }
        if let Some(agent) = &filter.agent {
            args.push(agent.clone());
            let n = args.len();
            sql.push_str(&format!(" AND (sender = ?{n} OR recipient = ?{n})"));
        }
        if filter.unread_only {
            sql.push_str(" AND read = 0");
        }
        sql.push_str(" ORDER BY created_at DESC, id");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), row_to_message)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete messages matching the spec, returning the number removed.
    pub fn purge(&self, spec: &PurgeSpec) -> Result<usize> {
        if !spec.all && spec.before_ms.is_none() && spec.agent.is_none() {
            return Err(StorageError::Invalid {
                field: "purge",
                value: "requires --all, an age cutoff, or an agent".to_string(),
            });
        }

        let mut sql = "DELETE FROM mail WHERE 1=1".to_string();
        let mut args: Vec<String> = Vec::new();

        if let Some(before) = spec.before_ms {
            if !spec.all {
                args.push(before.to_string());
                sql.push_str(&format!(" AND created_at < ?{}", args.len()));
            }
        }
        if let Some(agent) = &spec.agent {
            args.push(agent.clone());
            let n = args.len();
            sql.push_str(&format!(" AND (sender = ?{n} OR recipient = ?{n})"));
        }

        let conn = self.conn.lock();
        let deleted = conn.execute(&sql, params_from_iter(args.iter()))?;
        Ok(deleted)
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<MailMessage>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_message)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MailMessage> {
    let priority: String = row.get(5)?;
    let mail_type: String = row.get(6)?;
    Ok(MailMessage {
        id: MailId::from_string(row.get::<_, String>(0)?),
        from: row.get(1)?,
        to: row.get(2)?,
        subject: row.get(3)?,
        body: row.get(4)?,
        priority: priority.parse::<Priority>().map_err(|e| column_parse_error(5, e))?,
        mail_type: mail_type.parse::<MessageType>().map_err(|e| column_parse_error(6, e))?,
        thread_id: row.get::<_, Option<String>>(7)?.map(MailId::from_string),
        payload: row.get(8)?,
        read: row.get::<_, i64>(9)? != 0,
        created_at: row.get(10)?,
    })
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
