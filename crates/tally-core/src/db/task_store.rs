//! Task store implementation

use chrono::NaiveDate;
use rusqlite::{params, Row};

use crate::error::Result;
use crate::models::{timestamp, RecordId, Task};

use super::connection::LocalDatabase;
use super::{ListOrder, LocalStore};

/// `SQLite`-backed task storage
#[derive(Clone, Copy)]
pub struct TaskStore<'a> {
    db: &'a LocalDatabase,
}

impl<'a> TaskStore<'a> {
    /// Create a store over the given database
    pub const fn new(db: &'a LocalDatabase) -> Self {
        Self { db }
    }

    /// List tasks in a category, most recently mutated first
    pub fn list_by_category(&self, category: &str) -> Result<Vec<Task>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, summary, done, priority, category, due_date, subtasks, created_at, updated_at
                 FROM tasks
                 WHERE category = ?1
                 ORDER BY updated_at DESC",
            )?;
            let tasks = stmt
                .query_map(params![category], Self::parse_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// List open tasks due on or before a date
    pub fn list_due_by(&self, date: NaiveDate) -> Result<Vec<Task>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, summary, done, priority, category, due_date, subtasks, created_at, updated_at
                 FROM tasks
                 WHERE done = 0 AND due_date IS NOT NULL AND due_date <= ?1
                 ORDER BY due_date ASC",
            )?;
            let tasks = stmt
                .query_map(params![date.to_string()], Self::parse_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Parse a task from a database row
    fn parse_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        let id: String = row.get(0)?;
        let priority: String = row.get(4)?;
        let due_date: Option<String> = row.get(6)?;
        let subtasks_json: String = row.get(7)?;
        let subtasks = serde_json::from_str(&subtasks_json).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;
        let created_at: Option<String> = row.get(8)?;
        let updated_at: Option<String> = row.get(9)?;

        Ok(Task {
            id: RecordId::from(id),
            owner_id: row.get(1)?,
            summary: row.get(2)?,
            done: row.get::<_, i32>(3)? != 0,
            priority: priority.parse().unwrap_or_default(),
            category: row.get(5)?,
            due_date: due_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            subtasks,
            created_at: created_at.as_deref().and_then(timestamp::parse),
            updated_at: updated_at.as_deref().and_then(timestamp::parse),
        })
    }
}

impl LocalStore<Task> for TaskStore<'_> {
    fn put(&self, task: &Task) -> Result<()> {
        let subtasks = serde_json::to_string(&task.subtasks)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tasks
                 (id, owner_id, summary, done, priority, category, due_date, subtasks, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    task.id.as_str(),
                    task.owner_id,
                    task.summary,
                    i32::from(task.done),
                    task.priority.as_str(),
                    task.category,
                    task.due_date.map(|d| d.to_string()),
                    subtasks,
                    task.created_at.map(|ts| ts.to_rfc3339()),
                    task.updated_at.map(|ts| ts.to_rfc3339()),
                ],
            )?;
            Ok(())
        })
    }

    fn get(&self, id: &RecordId) -> Result<Option<Task>> {
        self.db.with_conn(|conn| {
            let result = conn.query_row(
                "SELECT id, owner_id, summary, done, priority, category, due_date, subtasks, created_at, updated_at
                 FROM tasks WHERE id = ?1",
                params![id.as_str()],
                Self::parse_task,
            );

            match result {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn delete(&self, id: &RecordId) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })
    }

    fn list_all(&self, order: ListOrder) -> Result<Vec<Task>> {
        let sql = match order {
            ListOrder::UpdatedDesc => {
                "SELECT id, owner_id, summary, done, priority, category, due_date, subtasks, created_at, updated_at
                 FROM tasks ORDER BY updated_at DESC"
            }
            ListOrder::CreatedDesc => {
                "SELECT id, owner_id, summary, done, priority, category, due_date, subtasks, created_at, updated_at
                 FROM tasks ORDER BY created_at DESC"
            }
        };

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let tasks = stmt
                .query_map([], Self::parse_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    fn clear(&self) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM tasks", [])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserScope;
    use crate::models::{Priority, Subtask, TaskDraft};
    use pretty_assertions::assert_eq;

    fn setup() -> LocalDatabase {
        LocalDatabase::open_in_memory(UserScope::Anonymous).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let db = setup();
        let store = TaskStore::new(&db);

        let mut task = Task::new(TaskDraft::new("Buy milk"));
        task.subtasks = vec![Subtask::new("check fridge")];
        store.put(&task).unwrap();

        let fetched = store.get(&task.id).unwrap().unwrap();
        assert_eq!(fetched, task);
    }

    #[test]
    fn test_put_replaces_by_id() {
        let db = setup();
        let store = TaskStore::new(&db);

        let mut task = Task::new(TaskDraft::new("Original"));
        store.put(&task).unwrap();

        task.summary = "Replaced".to_string();
        store.put(&task).unwrap();

        let all = store.list_all(ListOrder::UpdatedDesc).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].summary, "Replaced");
    }

    #[test]
    fn test_get_missing_is_none() {
        let db = setup();
        let store = TaskStore::new(&db);
        assert!(store.get(&RecordId::from("nope")).unwrap().is_none());
    }

    #[test]
    fn test_delete_is_hard() {
        let db = setup();
        let store = TaskStore::new(&db);

        let task = Task::new(TaskDraft::new("To delete"));
        store.put(&task).unwrap();
        store.delete(&task.id).unwrap();

        assert!(store.get(&task.id).unwrap().is_none());
        assert!(store.list_all(ListOrder::UpdatedDesc).unwrap().is_empty());

        // Deleting again is a no-op, not an error
        store.delete(&task.id).unwrap();
    }

    #[test]
    fn test_list_by_category() {
        let db = setup();
        let store = TaskStore::new(&db);

        let mut chores = Task::new(TaskDraft::new("Vacuum"));
        chores.category = Some("home".to_string());
        store.put(&chores).unwrap();

        let mut work = Task::new(TaskDraft::new("Email"));
        work.category = Some("work".to_string());
        store.put(&work).unwrap();

        let home = store.list_by_category("home").unwrap();
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].summary, "Vacuum");
    }

    #[test]
    fn test_list_due_by_skips_done_tasks() {
        let db = setup();
        let store = TaskStore::new(&db);
        let due = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let mut open = Task::new(TaskDraft::new("Open"));
        open.due_date = Some(due);
        store.put(&open).unwrap();

        let mut closed = Task::new(TaskDraft::new("Closed"));
        closed.due_date = Some(due);
        closed.done = true;
        store.put(&closed).unwrap();

        let overdue = store.list_due_by(due).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].summary, "Open");
    }

    #[test]
    fn test_clear() {
        let db = setup();
        let store = TaskStore::new(&db);

        store.put(&Task::new(TaskDraft::new("a"))).unwrap();
        store.put(&Task::new(TaskDraft::new("b"))).unwrap();
        store.clear().unwrap();

        assert!(store.list_all(ListOrder::UpdatedDesc).unwrap().is_empty());
    }

    #[test]
    fn test_round_trips_priority_and_dates() {
        let db = setup();
        let store = TaskStore::new(&db);

        let mut task = Task::new(TaskDraft::new("Dentist"));
        task.priority = Priority::High;
        task.due_date = NaiveDate::from_ymd_opt(2024, 9, 15);
        store.put(&task).unwrap();

        let fetched = store.get(&task.id).unwrap().unwrap();
        assert_eq!(fetched.priority, Priority::High);
        assert_eq!(fetched.due_date, task.due_date);
        assert_eq!(fetched.updated_at, task.updated_at);
    }
}
