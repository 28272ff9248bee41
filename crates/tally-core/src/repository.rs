//! Hybrid local/remote repository
//!
//! The single entry point the app layer uses for entity CRUD. Writes go
//! to the local store first (or, for creates, adopt the remote-assigned
//! id), remote calls are best-effort, and unconfirmed remote writes land
//! in the sync queue. A remote failure never fails an operation whose
//! local write succeeded.

use chrono::Utc;
use serde_json::json;

use crate::db::{ListOrder, LocalStore, QueuedOp, SyncQueue};
use crate::dedup::dedup;
use crate::error::{Error, Result};
use crate::models::{RecordId, SyncRecord};
use crate::remote::{RemoteError, RemoteStore};
use crate::state::SyncState;

/// A completed write plus whether it reached the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome<T> {
    pub record: T,
    pub state: SyncState,
}

/// Result of a clear-all: the local portion always completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOutcome {
    /// True only when the remote store confirmed its clear
    pub remote_cleared: bool,
}

/// Orchestrates one entity type across the local and remote stores
pub struct HybridRepository<'a, T, L>
where
    T: SyncRecord,
    L: LocalStore<T>,
{
    local: L,
    remote: Option<&'a dyn RemoteStore<T>>,
    queue: SyncQueue<'a>,
    owner_id: Option<String>,
}

impl<'a, T, L> HybridRepository<'a, T, L>
where
    T: SyncRecord,
    L: LocalStore<T>,
{
    /// Build a repository over a local store, an optional remote, and the
    /// session's sync queue
    pub const fn new(
        local: L,
        remote: Option<&'a dyn RemoteStore<T>>,
        queue: SyncQueue<'a>,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            local,
            remote,
            queue,
            owner_id,
        }
    }

    /// Remote plus owner, present only when both are configured
    fn remote_session(&self) -> Option<(&'a dyn RemoteStore<T>, &str)> {
        match (self.remote, self.owner_id.as_deref()) {
            (Some(remote), Some(owner)) => Some((remote, owner)),
            _ => None,
        }
    }

    fn queue_payload(record: &T) -> serde_json::Value {
        serde_json::to_value(record).unwrap_or_default()
    }

    /// Create a record
    ///
    /// With a reachable remote the create goes remote-first and the
    /// remote-assigned id is adopted locally, so the two stores never
    /// hold different ids for one logical create. Otherwise the record
    /// keeps its client-generated id and, if a remote exists at all, the
    /// create is queued.
    pub async fn add(&self, mut record: T) -> Result<SyncOutcome<T>> {
        record.set_owner_id(self.owner_id.clone());

        let Some((remote, owner)) = self.remote_session() else {
            self.local.put(&record)?;
            return Ok(SyncOutcome {
                record,
                state: SyncState::LocalOnly,
            });
        };

        match remote.create(owner, &record).await {
            Ok(confirmed) => {
                self.local.put(&confirmed)?;
                Ok(SyncOutcome {
                    record: confirmed,
                    state: SyncState::Synced,
                })
            }
            Err(error) => {
                tracing::warn!(
                    "remote create in {} failed, keeping local copy: {error}",
                    T::TABLE
                );
                self.local.put(&record)?;
                self.queue.enqueue(
                    QueuedOp::Create,
                    T::TABLE,
                    record.id(),
                    Self::queue_payload(&record),
                    Utc::now(),
                );
                Ok(SyncOutcome {
                    record,
                    state: SyncState::Pending,
                })
            }
        }
    }

    /// Patch a record
    ///
    /// The local merge happens unconditionally and in caller order; the
    /// remote update is best-effort afterwards. A remote not-found means
    /// the record was created offline and never synced, so the full local
    /// record is pushed as a create instead.
    pub async fn update(&self, id: &RecordId, patch: T::Patch) -> Result<SyncOutcome<T>> {
        let mut record = self
            .local
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let now = Utc::now();
        record.apply_patch(&patch);
        record.touch(now);
        self.local.put(&record)?;

        let Some((remote, owner)) = self.remote_session() else {
            return Ok(SyncOutcome {
                record,
                state: SyncState::LocalOnly,
            });
        };

        let state = match remote.update(owner, id, &patch, now).await {
            Ok(()) => SyncState::Synced,
            Err(error) if error.is_not_found() => {
                tracing::debug!(
                    "{}/{id} missing remotely, creating from local copy",
                    T::TABLE
                );
                match remote.create(owner, &record).await {
                    Ok(confirmed) => {
                        if confirmed.id() == record.id() {
                            SyncState::Synced
                        } else {
                            // The remote insisted on its own id; converge
                            // on it so the id spaces don't fork.
                            self.local.delete(record.id())?;
                            self.local.put(&confirmed)?;
                            record = confirmed;
                            SyncState::Synced
                        }
                    }
                    Err(recovery_error) => {
                        tracing::warn!(
                            "recovery create for {}/{id} failed: {recovery_error}",
                            T::TABLE
                        );
                        self.queue.enqueue(
                            QueuedOp::Create,
                            T::TABLE,
                            record.id(),
                            Self::queue_payload(&record),
                            now,
                        );
                        SyncState::Pending
                    }
                }
            }
            Err(RemoteError::Unavailable(reason)) => {
                tracing::debug!("remote unavailable for {}/{id}: {reason}", T::TABLE);
                self.queue.enqueue(
                    QueuedOp::Update,
                    T::TABLE,
                    record.id(),
                    Self::queue_payload(&record),
                    now,
                );
                SyncState::Pending
            }
            Err(error) => {
                tracing::warn!("remote update of {}/{id} rejected: {error}", T::TABLE);
                SyncState::Pending
            }
        };

        Ok(SyncOutcome { record, state })
    }

    /// Delete a record
    ///
    /// Local deletion is immediate and irrevocable; the remote delete is
    /// best-effort and never raises.
    pub async fn delete(&self, id: &RecordId) -> Result<SyncState> {
        self.local.delete(id)?;

        let Some((remote, owner)) = self.remote_session() else {
            return Ok(SyncState::LocalOnly);
        };

        match remote.delete(owner, id).await {
            Ok(()) => Ok(SyncState::Synced),
            // Nothing existed remotely, so the delete is already complete.
            Err(error) if error.is_not_found() => Ok(SyncState::Synced),
            Err(RemoteError::Unavailable(reason)) => {
                tracing::debug!("remote unavailable for {}/{id}: {reason}", T::TABLE);
                self.queue.enqueue(
                    QueuedOp::Delete,
                    T::TABLE,
                    id,
                    json!({ "id": id.as_str() }),
                    Utc::now(),
                );
                Ok(SyncState::Pending)
            }
            Err(error) => {
                tracing::warn!("remote delete of {}/{id} rejected: {error}", T::TABLE);
                Ok(SyncState::Pending)
            }
        }
    }

    /// Read a single record from the local store
    pub fn get(&self, id: &RecordId) -> Result<Option<T>> {
        self.local.get(id)
    }

    /// All records, deduplicated
    ///
    /// The remote store is the authoritative read path while reachable;
    /// local rows are not merged into a successful remote read. Any
    /// remote failure falls back to the local store.
    pub async fn get_all(&self) -> Result<Vec<T>> {
        if let Some((remote, owner)) = self.remote_session() {
            match remote.fetch_all(owner).await {
                Ok(rows) => return Ok(dedup(rows)),
                Err(error) => {
                    tracing::debug!(
                        "remote read of {} failed, serving local rows: {error}",
                        T::TABLE
                    );
                }
            }
        }

        Ok(dedup(self.local.list_all(ListOrder::CreatedDesc)?))
    }

    /// Clear every record for this session
    ///
    /// The remote clear is attempted first and reported; the local clear
    /// runs regardless of the remote outcome.
    pub async fn clear_all(&self) -> Result<ClearOutcome> {
        let remote_cleared = if let Some((remote, owner)) = self.remote_session() {
            match remote.clear(owner).await {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!("remote clear of {} failed: {error}", T::TABLE);
                    false
                }
            }
        } else {
            false
        };

        self.local.clear()?;
        Ok(ClearOutcome { remote_cleared })
    }
}
