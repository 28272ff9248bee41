//! Per-user session context
//!
//! Owns the local database handle and the remote client for one user
//! identity. There is no process-wide store: switching users means
//! dropping this session and constructing a new one, so two identities'
//! stores are never open for writing in the same logical session.

use std::path::Path;

use crate::db::{LocalDatabase, SyncQueue, TaskStore, UserScope, WeightStore};
use crate::error::Result;
use crate::models::{Task, WeightEntry};
use crate::remote::{HttpRemoteStore, RemoteConfig, RemoteStore};
use crate::repository::HybridRepository;

/// Hybrid repository over the session's task store
pub type TaskRepository<'a> = HybridRepository<'a, Task, TaskStore<'a>>;

/// Hybrid repository over the session's weight store
pub type WeightRepository<'a> = HybridRepository<'a, WeightEntry, WeightStore<'a>>;

/// One user's view of the app: local database plus optional remote
pub struct Session {
    db: LocalDatabase,
    remote: Option<HttpRemoteStore>,
    owner_id: Option<String>,
}

impl Session {
    /// Open a session for an owner identity
    ///
    /// The owner comes from the auth layer and is `None` for anonymous
    /// use. A remote client is only built when the config is complete;
    /// otherwise the session runs local-only.
    pub fn open(
        data_dir: impl AsRef<Path>,
        remote: &RemoteConfig,
        owner_id: Option<String>,
    ) -> Result<Self> {
        let scope = UserScope::for_owner(owner_id.as_deref());
        let db = LocalDatabase::open(data_dir, scope)?;
        let remote = if remote.is_configured() {
            Some(HttpRemoteStore::new(remote)?)
        } else {
            None
        };

        Ok(Self {
            db,
            remote,
            owner_id,
        })
    }

    /// Open a session backed by an in-memory database (useful for testing)
    pub fn open_in_memory(owner_id: Option<String>) -> Result<Self> {
        let scope = UserScope::for_owner(owner_id.as_deref());
        Ok(Self {
            db: LocalDatabase::open_in_memory(scope)?,
            remote: None,
            owner_id,
        })
    }

    /// Task repository bound to this session
    pub fn tasks(&self) -> TaskRepository<'_> {
        HybridRepository::new(
            TaskStore::new(&self.db),
            self.remote
                .as_ref()
                .map(|remote| remote as &dyn RemoteStore<Task>),
            SyncQueue::new(&self.db),
            self.owner_id.clone(),
        )
    }

    /// Weight repository bound to this session
    pub fn weights(&self) -> WeightRepository<'_> {
        HybridRepository::new(
            WeightStore::new(&self.db),
            self.remote
                .as_ref()
                .map(|remote| remote as &dyn RemoteStore<WeightEntry>),
            SyncQueue::new(&self.db),
            self.owner_id.clone(),
        )
    }

    /// The session's pending-mutation queue
    pub const fn sync_queue(&self) -> SyncQueue<'_> {
        SyncQueue::new(&self.db)
    }

    /// The session's local database
    pub const fn database(&self) -> &LocalDatabase {
        &self.db
    }

    /// Owner identity this session is bound to
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskDraft, WeightDraft};
    use crate::state::SyncState;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_anonymous_session_is_local_only() {
        let session = Session::open_in_memory(None).unwrap();

        let outcome = session
            .tasks()
            .add(crate::models::Task::new(TaskDraft::new("Buy milk")))
            .await
            .unwrap();
        assert_eq!(outcome.state, SyncState::LocalOnly);

        let all = session.tasks().get_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_tasks_and_weights_share_one_database() {
        let session = Session::open_in_memory(None).unwrap();

        session
            .tasks()
            .add(crate::models::Task::new(TaskDraft::new("Run")))
            .await
            .unwrap();
        session
            .weights()
            .add(crate::models::WeightEntry::new(WeightDraft {
                kilograms: 70.1,
                recorded_on: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            }))
            .await
            .unwrap();

        assert_eq!(session.tasks().get_all().await.unwrap().len(), 1);
        assert_eq!(session.weights().get_all().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_switching_user_switches_database() {
        let dir = tempdir().unwrap();
        let config = RemoteConfig::default();

        let alice = Session::open(dir.path(), &config, Some("alice".to_string())).unwrap();
        alice
            .tasks()
            .add(crate::models::Task::new(TaskDraft::new("Alice's task")))
            .await
            .unwrap();
        drop(alice);

        let bob = Session::open(dir.path(), &config, Some("bob".to_string())).unwrap();
        assert!(bob.tasks().get_all().await.unwrap().is_empty());

        let alice_again = Session::open(dir.path(), &config, Some("alice".to_string())).unwrap();
        assert_eq!(alice_again.tasks().get_all().await.unwrap().len(), 1);
    }

    #[test]
    fn test_unconfigured_remote_yields_no_client() {
        let session = Session::open_in_memory(Some("u1".to_string())).unwrap();
        assert!(session.remote.is_none());
        assert_eq!(session.owner_id(), Some("u1"));
    }
}
