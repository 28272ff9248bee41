//! Data models for Tally

mod record;
mod task;
pub(crate) mod timestamp;
mod weight;

pub use record::{RecordId, SyncRecord};
pub use task::{Priority, Subtask, Task, TaskDraft, TaskPatch};
pub use weight::{WeightDraft, WeightEntry, WeightPatch};
