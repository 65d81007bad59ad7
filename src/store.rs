//! Persistent user store backed by SQLite.
//!
//! `UserStore` brackets the connection with an explicit open/close lifecycle
//! and bootstraps the schema idempotently on open. Batch writes go through
//! the upsert engine; everything else here is a read-only projection with no
//! invariants of its own.

use crate::decimal::Decimal2;
use crate::error::UpsertError;
use crate::upsert::{self, IngestionBatch};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// How long a writer waits on a locked database before giving up.
///
/// Concurrent invocations against the same store file queue briefly instead
/// of failing immediately; the primary-key constraint does the rest.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    user_id           TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    email             TEXT NOT NULL,
    monthly_income    TEXT NOT NULL,
    credit_score      INTEGER NOT NULL,
    employment_status TEXT NOT NULL,
    age               INTEGER NOT NULL,
    created_at        TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const USER_COLUMNS: &str =
    "user_id, name, email, monthly_income, credit_score, employment_status, age, created_at";

/// Creates the users table if it does not exist yet.
pub(crate) fn bootstrap(conn: &Connection) -> Result<(), UpsertError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// A durable user row as read back from the store.
///
/// Unlike the transient `UserRecord`, this carries the store-assigned
/// `created_at` timestamp, set on first insert and never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub monthly_income: Decimal2,
    pub credit_score: i32,
    pub employment_status: String,
    pub age: i32,
    pub created_at: String,
}

impl StoredUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StoredUser {
            user_id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            monthly_income: row.get(3)?,
            credit_score: row.get(4)?,
            employment_status: row.get(5)?,
            age: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

/// Aggregate snapshot of the store for reporting.
#[derive(Debug, Serialize)]
pub struct StoreStats {
    /// Total number of stored users
    pub user_count: i64,

    /// Most recently created users, newest first
    pub recent_users: Vec<StoredUser>,
}

/// Handle to the SQLite-backed user store.
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Opens (creating if necessary) the store at the given path and
    /// bootstraps the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, UpsertError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        bootstrap(&conn)?;

        debug!("Opened user store at {}", path.as_ref().display());
        Ok(UserStore { conn })
    }

    /// Opens a private in-memory store, mainly useful in tests.
    pub fn open_in_memory() -> Result<Self, UpsertError> {
        let conn = Connection::open_in_memory()?;
        bootstrap(&conn)?;
        Ok(UserStore { conn })
    }

    /// Applies a batch atomically under its conflict policy.
    ///
    /// Returns the count of rows processed (attempted); see the upsert
    /// engine for the processed-versus-changed distinction.
    pub fn apply_batch(&mut self, batch: &IngestionBatch) -> Result<usize, UpsertError> {
        upsert::apply_batch(&mut self.conn, batch)
    }

    /// Looks up a single user by identity.
    pub fn get_user(&self, user_id: &str) -> Result<Option<StoredUser>, UpsertError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS),
                [user_id],
                StoredUser::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Total number of stored users.
    pub fn user_count(&self) -> Result<i64, UpsertError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// The most recently created users, newest first.
    pub fn recent_users(&self, limit: usize) -> Result<Vec<StoredUser>, UpsertError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC, user_id DESC LIMIT ?1",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([limit as i64], StoredUser::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Aggregate snapshot: total count plus the most recent users.
    pub fn stats(&self, recent_limit: usize) -> Result<StoreStats, UpsertError> {
        Ok(StoreStats {
            user_count: self.user_count()?,
            recent_users: self.recent_users(recent_limit)?,
        })
    }

    /// Closes the underlying connection, surfacing any close-time fault.
    pub fn close(self) -> Result<(), UpsertError> {
        self.conn.close().map_err(|(_, e)| UpsertError(e))
    }
}
