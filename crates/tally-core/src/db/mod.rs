//! Local durable storage
//!
//! One `SQLite` database per user identity; each entity type gets its own
//! table keyed by id. Nothing in this module touches the network, so
//! every operation works fully offline.

mod connection;
mod migrations;
mod sync_queue;
mod task_store;
mod weight_store;

pub use connection::{LocalDatabase, UserScope};
pub use sync_queue::{QueueEntry, QueuedOp, SyncQueue};
pub use task_store::TaskStore;
pub use weight_store::WeightStore;

use crate::error::Result;
use crate::models::RecordId;

/// Ordering for full-table listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Most recently mutated first
    #[default]
    UpdatedDesc,
    /// Newest first
    CreatedDesc,
}

/// Trait for per-entity local storage operations
///
/// Implementations never fail due to connectivity; the only error class
/// they produce is a genuine local-store failure.
pub trait LocalStore<T>: Send + Sync {
    /// Insert or replace by id
    fn put(&self, record: &T) -> Result<()>;

    /// Fetch a record by id
    fn get(&self, id: &RecordId) -> Result<Option<T>>;

    /// Hard-delete a record by id
    fn delete(&self, id: &RecordId) -> Result<()>;

    /// List every record in the store
    fn list_all(&self, order: ListOrder) -> Result<Vec<T>>;

    /// Remove every record in the store
    fn clear(&self) -> Result<()>;
}
