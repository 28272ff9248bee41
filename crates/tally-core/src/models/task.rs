//! Task model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::record::{hash_signature, RecordId, SyncRecord};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Database/wire representation of this priority
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A checklist item belonging to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl Subtask {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            done: false,
        }
    }
}

/// A task in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, shared by the local and remote copies
    pub id: RecordId,
    /// Owning user; absent for anonymous sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// One-line description
    pub summary: String,
    /// Completion flag
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Creation timestamp (RFC 3339; lenient on read)
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last mutation timestamp, the last-write-wins tie-breaker
    #[serde(default, with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields supplied by the caller when creating a task
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub summary: String,
    pub priority: Priority,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub subtasks: Vec<Subtask>,
}

impl TaskDraft {
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }
}

/// The mutable fields of a task.
///
/// Only fields set to `Some` change on merge; a field left `None` keeps
/// its current value, so a partial update can never clear data by
/// accident.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
}

impl Task {
    /// Create a new task from a draft with a fresh id and timestamps
    #[must_use]
    pub fn new(draft: TaskDraft) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::generate(),
            owner_id: None,
            summary: draft.summary,
            done: false,
            priority: draft.priority,
            category: draft.category,
            due_date: draft.due_date,
            subtasks: draft.subtasks,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Canonical domain-field rendering for content signatures.
///
/// Subtasks are sorted by title so equivalent checklists in different
/// insertion order still collide.
#[derive(Serialize)]
struct TaskSignature<'a> {
    summary: &'a str,
    done: bool,
    priority: Priority,
    category: Option<&'a str>,
    due_date: Option<NaiveDate>,
    subtasks: Vec<&'a Subtask>,
}

impl SyncRecord for Task {
    const TABLE: &'static str = "tasks";

    type Patch = TaskPatch;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn set_owner_id(&mut self, owner_id: Option<String>) {
        self.owner_id = owner_id;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(summary) = &patch.summary {
            self.summary.clone_from(summary);
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(subtasks) = &patch.subtasks {
            self.subtasks.clone_from(subtasks);
        }
    }

    fn content_signature(&self) -> String {
        let mut subtasks: Vec<&Subtask> = self.subtasks.iter().collect();
        subtasks.sort_by(|a, b| a.title.cmp(&b.title).then(a.done.cmp(&b.done)));

        hash_signature(&TaskSignature {
            summary: &self.summary,
            done: self.done,
            priority: self.priority,
            category: self.category.as_deref(),
            due_date: self.due_date,
            subtasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_task_from_draft() {
        let task = Task::new(TaskDraft::new("Buy milk"));
        assert_eq!(task.summary, "Buy milk");
        assert!(!task.done);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.created_at.is_some());
    }

    #[test]
    fn test_apply_patch_only_touches_supplied_fields() {
        let mut task = Task::new(TaskDraft {
            summary: "Original".to_string(),
            category: Some("home".to_string()),
            ..TaskDraft::default()
        });

        task.apply_patch(&TaskPatch {
            done: Some(true),
            ..TaskPatch::default()
        });

        assert!(task.done);
        assert_eq!(task.summary, "Original");
        assert_eq!(task.category.as_deref(), Some("home"));
    }

    #[test]
    fn test_signature_ignores_identity_and_timestamps() {
        let mut a = Task::new(TaskDraft::new("Pay rent"));
        let mut b = Task::new(TaskDraft::new("Pay rent"));
        b.updated_at = None;
        a.owner_id = Some("u1".to_string());

        assert_ne!(a.id, b.id);
        assert_eq!(a.content_signature(), b.content_signature());
    }

    #[test]
    fn test_signature_normalizes_subtask_order() {
        let mut a = Task::new(TaskDraft::new("Pack"));
        a.subtasks = vec![Subtask::new("socks"), Subtask::new("boots")];
        let mut b = Task::new(TaskDraft::new("Pack"));
        b.subtasks = vec![Subtask::new("boots"), Subtask::new("socks")];

        assert_eq!(a.content_signature(), b.content_signature());
    }

    #[test]
    fn test_signature_differs_on_domain_fields() {
        let a = Task::new(TaskDraft::new("Pay rent"));
        let mut b = Task::new(TaskDraft::new("Pay rent"));
        b.done = true;

        assert_ne!(a.content_signature(), b.content_signature());
    }

    #[test]
    fn test_deserialize_tolerates_bad_timestamps() {
        let task: Task = serde_json::from_str(
            r#"{"id":"t1","summary":"x","updated_at":"garbage"}"#,
        )
        .unwrap();
        assert!(task.updated_at.is_none());
        assert!(task.created_at.is_none());
    }

    #[test]
    fn test_priority_round_trip() {
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            let parsed: Priority = priority.as_str().parse().unwrap();
            assert_eq!(parsed, priority);
        }
        assert!("urgent".parse::<Priority>().is_err());
    }
}
