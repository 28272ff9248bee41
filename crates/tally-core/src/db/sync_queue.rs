//! Pending-mutation sync queue
//!
//! Append-only log of mutations that could not be confirmed against the
//! remote store. A later background replayer drains it; only the enqueue
//! side and a minimal read surface live here.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Result;
use crate::models::{timestamp, RecordId};

use super::connection::LocalDatabase;

/// The kind of mutation awaiting remote reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuedOp {
    Create,
    Update,
    Delete,
}

impl QueuedOp {
    /// Database representation of this operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for QueuedOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown queued op: {other}")),
        }
    }
}

/// One pending mutation
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Append-order sequence number
    pub seq: i64,
    pub op: QueuedOp,
    /// Entity table this mutation targets
    pub table: String,
    /// Id of the record at enqueue time (a local id for unsynced creates)
    pub record_id: RecordId,
    /// Full record (create/update) or `{"id": ...}` (delete)
    pub payload: serde_json::Value,
    pub queued_at: Option<DateTime<Utc>>,
}

/// Append-only queue stored next to the entity tables
#[derive(Clone, Copy)]
pub struct SyncQueue<'a> {
    db: &'a LocalDatabase,
}

impl<'a> SyncQueue<'a> {
    /// Create a queue over the given database
    pub const fn new(db: &'a LocalDatabase) -> Self {
        Self { db }
    }

    /// Record a pending mutation, never failing the caller
    ///
    /// The hybrid repository treats enqueue as fire-and-forget: the local
    /// write already succeeded, so a queue failure is logged and dropped
    /// rather than turned into an error the user sees.
    pub fn enqueue(
        &self,
        op: QueuedOp,
        table: &str,
        record_id: &RecordId,
        payload: serde_json::Value,
        queued_at: DateTime<Utc>,
    ) {
        if let Err(error) = self.try_enqueue(op, table, record_id, &payload, queued_at) {
            tracing::warn!(
                "failed to enqueue {} for {table}/{record_id}: {error}",
                op.as_str()
            );
        }
    }

    /// Fallible enqueue, exposed for callers that want the sequence number
    pub fn try_enqueue(
        &self,
        op: QueuedOp,
        table: &str,
        record_id: &RecordId,
        payload: &serde_json::Value,
        queued_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sync_queue (op, table_name, record_id, payload, queued_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    op.as_str(),
                    table,
                    record_id.as_str(),
                    payload.to_string(),
                    queued_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All pending mutations in enqueue order
    pub fn pending(&self) -> Result<Vec<QueueEntry>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, op, table_name, record_id, payload, queued_at
                 FROM sync_queue ORDER BY seq ASC",
            )?;
            let entries = stmt
                .query_map([], Self::parse_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    /// Pending mutations for one record, in enqueue order
    ///
    /// Per-record ordering lets a replayer collapse redundant operations,
    /// e.g. create-then-delete of a never-synced id cancels out.
    pub fn pending_for(&self, table: &str, record_id: &RecordId) -> Result<Vec<QueueEntry>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, op, table_name, record_id, payload, queued_at
                 FROM sync_queue
                 WHERE table_name = ?1 AND record_id = ?2
                 ORDER BY seq ASC",
            )?;
            let entries = stmt
                .query_map(params![table, record_id.as_str()], Self::parse_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    /// Number of pending mutations
    pub fn len(&self) -> Result<usize> {
        self.db.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sync_queue", [], |row| {
                row.get(0)
            })?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove one replayed entry by sequence number
    pub fn remove(&self, seq: i64) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM sync_queue WHERE seq = ?1", params![seq])?;
            Ok(())
        })
    }

    fn parse_entry(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
        let op: String = row.get(1)?;
        let record_id: String = row.get(3)?;
        let payload: String = row.get(4)?;
        let queued_at: String = row.get(5)?;

        Ok(QueueEntry {
            seq: row.get(0)?,
            op: op.parse().map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    "unknown queued op".into(),
                )
            })?,
            table: row.get(2)?,
            record_id: RecordId::from(record_id),
            payload: serde_json::from_str(&payload).map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(error),
                )
            })?,
            queued_at: timestamp::parse(&queued_at),
        })
    }
}
