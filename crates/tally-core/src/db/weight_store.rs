//! Weight entry store implementation

use chrono::NaiveDate;
use rusqlite::{params, Row};

use crate::error::Result;
use crate::models::{timestamp, RecordId, WeightEntry};

use super::connection::LocalDatabase;
use super::{ListOrder, LocalStore};

/// `SQLite`-backed weight entry storage
#[derive(Clone, Copy)]
pub struct WeightStore<'a> {
    db: &'a LocalDatabase,
}

impl<'a> WeightStore<'a> {
    /// Create a store over the given database
    pub const fn new(db: &'a LocalDatabase) -> Self {
        Self { db }
    }

    /// List entries recorded within a date range, oldest first
    pub fn list_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WeightEntry>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, kilograms, recorded_on, created_at, updated_at
                 FROM weight_entries
                 WHERE recorded_on >= ?1 AND recorded_on <= ?2
                 ORDER BY recorded_on ASC",
            )?;
            let entries = stmt
                .query_map(
                    params![start.to_string(), end.to_string()],
                    Self::parse_entry,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    /// Parse a weight entry from a database row
    fn parse_entry(row: &Row<'_>) -> rusqlite::Result<WeightEntry> {
        let id: String = row.get(0)?;
        let recorded_on: String = row.get(3)?;
        let recorded_on =
            NaiveDate::parse_from_str(&recorded_on, "%Y-%m-%d").map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(error),
                )
            })?;
        let created_at: Option<String> = row.get(4)?;
        let updated_at: Option<String> = row.get(5)?;

        Ok(WeightEntry {
            id: RecordId::from(id),
            owner_id: row.get(1)?,
            kilograms: row.get(2)?,
            recorded_on,
            created_at: created_at.as_deref().and_then(timestamp::parse),
            updated_at: updated_at.as_deref().and_then(timestamp::parse),
        })
    }
}

impl LocalStore<WeightEntry> for WeightStore<'_> {
    fn put(&self, entry: &WeightEntry) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO weight_entries
                 (id, owner_id, kilograms, recorded_on, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.id.as_str(),
                    entry.owner_id,
                    entry.kilograms,
                    entry.recorded_on.to_string(),
                    entry.created_at.map(|ts| ts.to_rfc3339()),
                    entry.updated_at.map(|ts| ts.to_rfc3339()),
                ],
            )?;
            Ok(())
        })
    }

    fn get(&self, id: &RecordId) -> Result<Option<WeightEntry>> {
        self.db.with_conn(|conn| {
            let result = conn.query_row(
                "SELECT id, owner_id, kilograms, recorded_on, created_at, updated_at
                 FROM weight_entries WHERE id = ?1",
                params![id.as_str()],
                Self::parse_entry,
            );

            match result {
                Ok(entry) => Ok(Some(entry)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn delete(&self, id: &RecordId) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM weight_entries WHERE id = ?1",
                params![id.as_str()],
            )?;
            Ok(())
        })
    }

    fn list_all(&self, order: ListOrder) -> Result<Vec<WeightEntry>> {
        let sql = match order {
            ListOrder::UpdatedDesc => {
                "SELECT id, owner_id, kilograms, recorded_on, created_at, updated_at
                 FROM weight_entries ORDER BY updated_at DESC"
            }
            ListOrder::CreatedDesc => {
                "SELECT id, owner_id, kilograms, recorded_on, created_at, updated_at
                 FROM weight_entries ORDER BY created_at DESC"
            }
        };

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let entries = stmt
                .query_map([], Self::parse_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    fn clear(&self) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM weight_entries", [])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserScope;
    use crate::models::WeightDraft;
    use pretty_assertions::assert_eq;

    fn setup() -> LocalDatabase {
        LocalDatabase::open_in_memory(UserScope::Anonymous).unwrap()
    }

    fn entry(kilograms: f64, day: u32) -> WeightEntry {
        WeightEntry::new(WeightDraft {
            kilograms,
            recorded_on: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        })
    }

    #[test]
    fn test_put_and_get() {
        let db = setup();
        let store = WeightStore::new(&db);

        let measurement = entry(71.2, 3);
        store.put(&measurement).unwrap();

        let fetched = store.get(&measurement.id).unwrap().unwrap();
        assert_eq!(fetched, measurement);
    }

    #[test]
    fn test_list_between() {
        let db = setup();
        let store = WeightStore::new(&db);

        store.put(&entry(71.0, 1)).unwrap();
        store.put(&entry(70.5, 10)).unwrap();
        store.put(&entry(70.0, 20)).unwrap();

        let window = store
            .list_between(
                NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            )
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].kilograms, 70.5);
    }

    #[test]
    fn test_delete_and_clear() {
        let db = setup();
        let store = WeightStore::new(&db);

        let keep = entry(70.0, 1);
        let gone = entry(71.0, 2);
        store.put(&keep).unwrap();
        store.put(&gone).unwrap();

        store.delete(&gone.id).unwrap();
        assert_eq!(store.list_all(ListOrder::CreatedDesc).unwrap().len(), 1);

        store.clear().unwrap();
        assert!(store.list_all(ListOrder::CreatedDesc).unwrap().is_empty());
    }
}
