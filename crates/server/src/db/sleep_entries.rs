//! Sleep entry repository for database operations.
//!
//! Every query is scoped by `user_id`; an entry owned by another user is
//! invisible here, so callers cannot distinguish foreign rows from absent ones.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use somnolog_core::{SleepEntryId, UserId};

use super::RepositoryError;
use crate::models::SleepEntry;

/// Database row for a sleep entry.
#[derive(sqlx::FromRow)]
struct SleepEntryRow {
    id: SleepEntryId,
    user_id: UserId,
    date_of_sleep: NaiveDate,
    sleep_time: DateTime<Utc>,
    wake_up_time: DateTime<Utc>,
    duration_in_minutes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SleepEntryRow> for SleepEntry {
    fn from(row: SleepEntryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            date_of_sleep: row.date_of_sleep,
            sleep_time: row.sleep_time,
            wake_up_time: row.wake_up_time,
            duration_in_minutes: row.duration_in_minutes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ENTRY_COLUMNS: &str = "id, user_id, date_of_sleep, sleep_time, wake_up_time, \
                             duration_in_minutes, created_at, updated_at";

/// Repository for sleep entry database operations.
pub struct SleepEntryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SleepEntryRepository<'a> {
    /// Create a new sleep entry repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new entry and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        user_id: UserId,
        date_of_sleep: NaiveDate,
        sleep_time: DateTime<Utc>,
        wake_up_time: DateTime<Utc>,
        duration_in_minutes: i64,
    ) -> Result<SleepEntry, RepositoryError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, SleepEntryRow>(&format!(
            r"
            INSERT INTO sleep_entries
                (user_id, date_of_sleep, sleep_time, wake_up_time,
                 duration_in_minutes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {ENTRY_COLUMNS}
            ",
        ))
        .bind(user_id)
        .bind(date_of_sleep)
        .bind(sleep_time)
        .bind(wake_up_time)
        .bind(duration_in_minutes)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// All entries for a user, most recent night first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<SleepEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, SleepEntryRow>(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM sleep_entries
            WHERE user_id = ?1
            ORDER BY date_of_sleep DESC, sleep_time DESC
            ",
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an entry by ID, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: SleepEntryId,
        user_id: UserId,
    ) -> Result<Option<SleepEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, SleepEntryRow>(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM sleep_entries
            WHERE id = ?1 AND user_id = ?2
            ",
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Persist a merged entry, scoped to its owner.
    ///
    /// Returns `None` if the row vanished between the ownership check and
    /// this write (a concurrent delete).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, entry: &SleepEntry) -> Result<Option<SleepEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, SleepEntryRow>(&format!(
            r"
            UPDATE sleep_entries
            SET date_of_sleep = ?1, sleep_time = ?2, wake_up_time = ?3,
                duration_in_minutes = ?4, updated_at = ?5
            WHERE id = ?6 AND user_id = ?7
            RETURNING {ENTRY_COLUMNS}
            ",
        ))
        .bind(entry.date_of_sleep)
        .bind(entry.sleep_time)
        .bind(entry.wake_up_time)
        .bind(entry.duration_in_minutes)
        .bind(entry.updated_at)
        .bind(entry.id)
        .bind(entry.user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Delete an entry by ID, scoped to its owner.
    ///
    /// # Returns
    ///
    /// Returns `true` if the entry was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        id: SleepEntryId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM sleep_entries
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Entries whose `date_of_sleep` falls in the inclusive range, oldest first.
    ///
    /// The range comparison is against the stored `'YYYY-MM-DD'` strings,
    /// which order lexicographically the same as chronologically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_in_date_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SleepEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, SleepEntryRow>(&format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM sleep_entries
            WHERE user_id = ?1 AND date_of_sleep BETWEEN ?2 AND ?3
            ORDER BY date_of_sleep ASC
            ",
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
