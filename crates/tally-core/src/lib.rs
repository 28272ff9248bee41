//! tally-core - Core library for Tally
//!
//! The offline-first storage and synchronization layer shared by all
//! Tally interfaces: per-user local durable store, owner-scoped remote
//! store client, the hybrid repository that keeps the two consistent,
//! and the deduplication engine that makes reads safe to render.

pub mod db;
pub mod dedup;
pub mod error;
pub mod models;
pub mod remote;
pub mod repository;
pub mod session;
pub mod state;

pub use error::{Error, Result};
pub use models::{
    Priority, RecordId, Subtask, SyncRecord, Task, TaskDraft, TaskPatch, WeightDraft, WeightEntry,
    WeightPatch,
};
pub use repository::{ClearOutcome, HybridRepository, SyncOutcome};
pub use session::{Session, TaskRepository, WeightRepository};
pub use state::SyncState;
