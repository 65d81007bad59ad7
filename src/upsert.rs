//! Upsert engine: applies a validated batch to the user store as one
//! atomic transaction under a named conflict policy.
//!
//! Both policies share a single code path; only the conflict clause of the
//! prepared statement differs, so the two behaviors cannot drift apart.

use crate::error::UpsertError;
use crate::record::UserRecord;
use log::debug;
use rusqlite::{params, Connection};
use std::str::FromStr;

/// What happens when an incoming record's `user_id` already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// `UPSERT_MERGE`: overwrite every mutable field with the new row's
    /// values; `created_at` is untouched.
    Merge,

    /// `UPSERT_IGNORE`: silently skip the row, changing nothing.
    Ignore,
}

impl ConflictPolicy {
    fn sql(&self) -> &'static str {
        match self {
            ConflictPolicy::Merge => {
                "INSERT INTO users
                     (user_id, name, email, monthly_income, credit_score, employment_status, age)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                     name = excluded.name,
                     email = excluded.email,
                     monthly_income = excluded.monthly_income,
                     credit_score = excluded.credit_score,
                     employment_status = excluded.employment_status,
                     age = excluded.age"
            }
            ConflictPolicy::Ignore => {
                "INSERT INTO users
                     (user_id, name, email, monthly_income, credit_score, employment_status, age)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO NOTHING"
            }
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Ok(ConflictPolicy::Merge),
            "ignore" => Ok(ConflictPolicy::Ignore),
            other => Err(format!(
                "unknown conflict policy '{}' (expected 'merge' or 'ignore')",
                other
            )),
        }
    }
}

/// The unit of work for one pipeline run.
///
/// An ordered sequence of validated records plus the conflict policy to
/// apply them under and the provenance of the source file. Consumed entirely
/// by the upsert engine and discarded after the notification fires.
#[derive(Debug)]
pub struct IngestionBatch {
    /// Validated records in file order
    pub records: Vec<UserRecord>,

    /// How existing `user_id`s are reconciled
    pub policy: ConflictPolicy,

    /// Object key of the ingested file
    pub source: String,
}

/// Applies a batch inside a single transaction.
///
/// Returns the count of rows *processed* (attempted), not rows changed:
/// under `Ignore` some of the count may have been no-ops. On any storage
/// fault the transaction is rolled back and nothing is applied; dropping
/// the uncommitted `rusqlite` transaction performs the rollback.
pub(crate) fn apply_batch(
    conn: &mut Connection,
    batch: &IngestionBatch,
) -> Result<usize, UpsertError> {
    let tx = conn.transaction()?;

    {
        let mut stmt = tx.prepare(batch.policy.sql())?;

        for record in &batch.records {
            stmt.execute(params![
                record.user_id,
                record.name,
                record.email,
                record.monthly_income,
                record.credit_score,
                record.employment_status,
                record.age,
            ])?;
        }
    }

    tx.commit()?;

    debug!(
        "Committed batch of {} record(s) from '{}' under {:?}",
        batch.records.len(),
        batch.source,
        batch.policy
    );

    Ok(batch.records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal2;
    use crate::store;
    use std::str::FromStr;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        store::bootstrap(&conn).unwrap();
        conn
    }

    fn record(user_id: &str, email: &str, age: i32) -> UserRecord {
        UserRecord {
            user_id: user_id.to_string(),
            name: format!("user {}", user_id),
            email: email.to_string(),
            monthly_income: Decimal2::from_str("1000").unwrap(),
            credit_score: 650,
            employment_status: "employed".to_string(),
            age,
        }
    }

    fn batch(records: Vec<UserRecord>, policy: ConflictPolicy) -> IngestionBatch {
        IngestionBatch {
            records,
            policy,
            source: "uploads/test.csv".to_string(),
        }
    }

    fn stored_age(conn: &Connection, user_id: &str) -> i32 {
        conn.query_row(
            "SELECT age FROM users WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn user_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_policy_parses_from_str() {
        assert_eq!(ConflictPolicy::from_str("merge"), Ok(ConflictPolicy::Merge));
        assert_eq!(
            ConflictPolicy::from_str(" IGNORE "),
            Ok(ConflictPolicy::Ignore)
        );
        assert!(ConflictPolicy::from_str("replace").is_err());
    }

    #[test]
    fn test_merge_overwrites_existing_row() {
        let mut conn = test_conn();

        apply_batch(
            &mut conn,
            &batch(vec![record("u1", "old@x.com", 30)], ConflictPolicy::Merge),
        )
        .unwrap();
        apply_batch(
            &mut conn,
            &batch(vec![record("u1", "new@x.com", 31)], ConflictPolicy::Merge),
        )
        .unwrap();

        assert_eq!(user_count(&conn), 1);
        assert_eq!(stored_age(&conn, "u1"), 31);
    }

    #[test]
    fn test_merge_preserves_created_at() {
        let mut conn = test_conn();

        apply_batch(
            &mut conn,
            &batch(vec![record("u1", "a@x.com", 30)], ConflictPolicy::Merge),
        )
        .unwrap();
        conn.execute(
            "UPDATE users SET created_at = '2001-01-01 00:00:00' WHERE user_id = 'u1'",
            [],
        )
        .unwrap();

        apply_batch(
            &mut conn,
            &batch(vec![record("u1", "b@x.com", 31)], ConflictPolicy::Merge),
        )
        .unwrap();

        let created_at: String = conn
            .query_row(
                "SELECT created_at FROM users WHERE user_id = 'u1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(created_at, "2001-01-01 00:00:00");
        assert_eq!(stored_age(&conn, "u1"), 31);
    }

    #[test]
    fn test_ignore_skips_existing_row() {
        let mut conn = test_conn();

        apply_batch(
            &mut conn,
            &batch(vec![record("u1", "old@x.com", 30)], ConflictPolicy::Ignore),
        )
        .unwrap();
        let count = apply_batch(
            &mut conn,
            &batch(
                vec![record("u1", "new@x.com", 99), record("u2", "b@x.com", 25)],
                ConflictPolicy::Ignore,
            ),
        )
        .unwrap();

        // Count reflects rows attempted, not rows changed.
        assert_eq!(count, 2);
        assert_eq!(stored_age(&conn, "u1"), 30);
        assert_eq!(stored_age(&conn, "u2"), 25);
    }

    #[test]
    fn test_duplicate_id_within_batch_later_wins_under_merge() {
        let mut conn = test_conn();

        let count = apply_batch(
            &mut conn,
            &batch(
                vec![record("u1", "first@x.com", 30), record("u1", "last@x.com", 40)],
                ConflictPolicy::Merge,
            ),
        )
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(user_count(&conn), 1);
        assert_eq!(stored_age(&conn, "u1"), 40);
    }

    #[test]
    fn test_duplicate_id_within_batch_first_wins_under_ignore() {
        let mut conn = test_conn();

        apply_batch(
            &mut conn,
            &batch(
                vec![record("u1", "first@x.com", 30), record("u1", "last@x.com", 40)],
                ConflictPolicy::Ignore,
            ),
        )
        .unwrap();

        assert_eq!(stored_age(&conn, "u1"), 30);
    }

    #[test]
    fn test_storage_fault_rolls_back_whole_batch() {
        let mut conn = test_conn();
        conn.execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON users
             WHEN NEW.user_id = 'boom'
             BEGIN SELECT RAISE(ABORT, 'rejected by trigger'); END",
        )
        .unwrap();

        let result = apply_batch(
            &mut conn,
            &batch(
                vec![record("u1", "a@x.com", 30), record("boom", "b@x.com", 31)],
                ConflictPolicy::Merge,
            ),
        );

        assert!(result.is_err());
        assert_eq!(user_count(&conn), 0);
    }

    #[test]
    fn test_empty_batch_commits_zero() {
        let mut conn = test_conn();
        let count = apply_batch(&mut conn, &batch(vec![], ConflictPolicy::Merge)).unwrap();
        assert_eq!(count, 0);
        assert_eq!(user_count(&conn), 0);
    }
}
