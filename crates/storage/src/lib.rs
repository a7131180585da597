// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable stores for the Overstory coordination core.
//!
//! Each contractual state directory holds one SQLite database (sessions,
//! mail, events, metrics, merge-queue); the small coordination markers
//! (pending nudges, mail-check debounce, current run, run-complete dedup)
//! are plain files rewritten atomically. Every store may be opened by any
//! number of processes; SQLite WAL mode plus a busy timeout serializes
//! writers.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod events;
mod mail;
mod markers;
mod merge_queue;
mod metrics;
mod paths;
mod sessions;

pub use events::{EventRow, EventStore};
pub use mail::{MailFilter, MailStore, NewMail, PurgeSpec};
pub use markers::{CurrentRun, MailCheckState, PendingNudges, RunCompleteMarker};
pub use merge_queue::{MergeEntry, MergeId, MergeQueueStore, MergeStatus};
pub use metrics::{MetricsStore, SessionMetrics, SessionOutcome};
pub use paths::StatePaths;
pub use sessions::SessionStore;

use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Convert a domain parse failure inside a rusqlite row-mapping closure.
pub(crate) fn column_parse_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        message.into(),
    )
}
