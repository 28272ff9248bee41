//! Database connection management

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;

use super::migrations;

/// The user identity a local database is bound to.
///
/// Each identity gets its own database file, so switching users means
/// opening a different database, never sharing one. Anonymous sessions
/// get a dedicated store of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserScope {
    Anonymous,
    User(String),
}

impl UserScope {
    /// Build a scope from an optional owner identity
    #[must_use]
    pub fn for_owner(owner_id: Option<&str>) -> Self {
        match owner_id {
            Some(owner) => Self::User(owner.to_string()),
            None => Self::Anonymous,
        }
    }

    /// Filesystem-safe name for this scope's database file
    #[must_use]
    pub fn file_stem(&self) -> String {
        match self {
            Self::Anonymous => "anonymous".to_string(),
            Self::User(owner) => owner
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '-'
                    }
                })
                .collect(),
        }
    }
}

/// Durable per-user `SQLite` database.
///
/// Holds the single connection handle for the scope. The mutex around it
/// is the only serialization point in the local path; it is held for the
/// duration of one statement, never across an await.
pub struct LocalDatabase {
    conn: Mutex<Connection>,
    scope: UserScope,
}

impl LocalDatabase {
    /// Open the database file for a user scope, creating it if needed
    ///
    /// Runs migrations automatically.
    pub fn open(dir: impl AsRef<Path>, scope: UserScope) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(format!("tally-{}.db", scope.file_stem()));
        let conn = Connection::open(path)?;
        Self::init(conn, scope)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory(scope: UserScope) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, scope)
    }

    fn init(conn: Connection, scope: UserScope) -> Result<Self> {
        // WAL and relaxed fsync are performance pragmas; not every build
        // supports them (in-memory databases have no journal), so failures
        // are ignored.
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            scope,
        })
    }

    /// Run a closure against the connection under the store lock
    pub fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }

    /// The user identity this database is bound to
    pub const fn scope(&self) -> &UserScope {
        &self.scope
    }
}
