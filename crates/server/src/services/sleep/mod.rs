//! Sleep ledger service.
//!
//! Ownership-scoped CRUD over sleep entries plus the rolling 7-day summary.
//! Every operation takes the owning `UserId`; entries belonging to another
//! user look exactly like missing entries.

mod error;

pub use error::SleepError;

use chrono::{DateTime, Days, Timelike, Utc};
use sqlx::SqlitePool;

use somnolog_core::{SleepEntryId, UserId};

use crate::db::sleep_entries::SleepEntryRepository;
use crate::models::{NewSleepEntry, SleepEntry, SleepPatch, WeeklyStats};

/// Sleep ledger and weekly statistics service.
pub struct SleepService<'a> {
    entries: SleepEntryRepository<'a>,
}

impl<'a> SleepService<'a> {
    /// Create a new sleep service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            entries: SleepEntryRepository::new(pool),
        }
    }

    /// Record a new sleep entry for a user.
    ///
    /// # Errors
    ///
    /// Returns `SleepError::InvalidRange` if the wake-up time is not after
    /// the sleep time.
    pub async fn create(
        &self,
        draft: NewSleepEntry,
        user_id: UserId,
    ) -> Result<SleepEntry, SleepError> {
        if draft.wake_up_time <= draft.sleep_time {
            return Err(SleepError::InvalidRange);
        }

        let duration = duration_in_minutes(draft.sleep_time, draft.wake_up_time);

        let entry = self
            .entries
            .insert(
                user_id,
                draft.date_of_sleep,
                draft.sleep_time,
                draft.wake_up_time,
                duration,
            )
            .await?;

        Ok(entry)
    }

    /// All entries for a user, most recent night first.
    ///
    /// # Errors
    ///
    /// Returns `SleepError::Repository` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<SleepEntry>, SleepError> {
        Ok(self.entries.list_for_user(user_id).await?)
    }

    /// Get one entry, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `SleepError::NotFound` if the entry does not exist or belongs
    /// to another user.
    pub async fn get(
        &self,
        id: SleepEntryId,
        user_id: UserId,
    ) -> Result<SleepEntry, SleepError> {
        self.entries
            .get(id, user_id)
            .await?
            .ok_or(SleepError::NotFound)
    }

    /// Apply a partial update to an entry.
    ///
    /// Patch fields are applied only where present. If either timestamp is
    /// patched, the effective pair is re-validated and the duration
    /// recomputed.
    ///
    /// # Errors
    ///
    /// Returns `SleepError::NotFound` if the entry does not exist or belongs
    /// to another user (including a concurrent delete during the write).
    /// Returns `SleepError::InvalidRange` if the effective wake-up time is
    /// not after the effective sleep time.
    pub async fn update(
        &self,
        id: SleepEntryId,
        user_id: UserId,
        patch: SleepPatch,
    ) -> Result<SleepEntry, SleepError> {
        let mut entry = self.get(id, user_id).await?;

        let new_sleep_time = patch.sleep_time.unwrap_or(entry.sleep_time);
        let new_wake_up_time = patch.wake_up_time.unwrap_or(entry.wake_up_time);

        if patch.sleep_time.is_some() || patch.wake_up_time.is_some() {
            if new_wake_up_time <= new_sleep_time {
                return Err(SleepError::InvalidRange);
            }
            entry.duration_in_minutes = duration_in_minutes(new_sleep_time, new_wake_up_time);
        }

        if let Some(date_of_sleep) = patch.date_of_sleep {
            entry.date_of_sleep = date_of_sleep;
        }
        entry.sleep_time = new_sleep_time;
        entry.wake_up_time = new_wake_up_time;
        entry.updated_at = Utc::now();

        self.entries
            .update(&entry)
            .await?
            .ok_or(SleepError::NotFound)
    }

    /// Delete an entry, scoped to its owner.
    ///
    /// A delete racing a concurrent deletion of the same entry resolves to
    /// ordinary `NotFound`, not a distinct error.
    ///
    /// # Errors
    ///
    /// Returns `SleepError::NotFound` if the entry does not exist or belongs
    /// to another user.
    pub async fn remove(&self, id: SleepEntryId, user_id: UserId) -> Result<(), SleepError> {
        self.get(id, user_id).await?;

        let deleted = self.entries.delete(id, user_id).await?;
        if !deleted {
            return Err(SleepError::NotFound);
        }

        Ok(())
    }

    /// Rolling 7-day summary ending on the calendar day of `now` (UTC).
    ///
    /// Time-of-day averages use a linear mean of minutes-since-midnight with
    /// no wraparound correction; bedtimes straddling midnight deliberately
    /// skew the result. Downstream consumers depend on this exact rule.
    ///
    /// # Errors
    ///
    /// Returns `SleepError::Repository` if the query fails.
    pub async fn weekly_stats(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<WeeklyStats, SleepError> {
        let end_date = now.date_naive();
        let start_date = end_date - Days::new(6);

        let entries = self
            .entries
            .list_in_date_range(user_id, start_date, end_date)
            .await?;

        let total_entries_considered = entries.len();

        if total_entries_considered == 0 {
            return Ok(WeeklyStats {
                average_sleep_duration_minutes: None,
                average_sleep_time: None,
                average_wake_up_time: None,
                start_date,
                end_date,
                total_entries_considered: 0,
            });
        }

        let total_duration_minutes: i64 =
            entries.iter().map(|e| e.duration_in_minutes).sum();

        let mut total_sleep_minutes_from_midnight = 0_i64;
        let mut total_wake_up_minutes_from_midnight = 0_i64;
        for entry in &entries {
            total_sleep_minutes_from_midnight += minutes_from_midnight(entry.sleep_time);
            total_wake_up_minutes_from_midnight += minutes_from_midnight(entry.wake_up_time);
        }

        #[allow(clippy::cast_precision_loss)]
        let count = total_entries_considered as f64;

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let average_sleep_duration_minutes = (total_duration_minutes as f64 / count).round() as i64;

        #[allow(clippy::cast_precision_loss)]
        let average_sleep_time =
            format_minutes_to_hhmm(total_sleep_minutes_from_midnight as f64 / count);
        #[allow(clippy::cast_precision_loss)]
        let average_wake_up_time =
            format_minutes_to_hhmm(total_wake_up_minutes_from_midnight as f64 / count);

        Ok(WeeklyStats {
            average_sleep_duration_minutes: Some(average_sleep_duration_minutes),
            average_sleep_time: Some(average_sleep_time),
            average_wake_up_time: Some(average_wake_up_time),
            start_date,
            end_date,
            total_entries_considered,
        })
    }
}

/// Derived duration: milliseconds between the instants, rounded to minutes.
fn duration_in_minutes(sleep_time: DateTime<Utc>, wake_up_time: DateTime<Utc>) -> i64 {
    let milliseconds = (wake_up_time - sleep_time).num_milliseconds();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    {
        (milliseconds as f64 / 60_000.0).round() as i64
    }
}

/// UTC time-of-day in whole minutes; seconds are ignored.
fn minutes_from_midnight(instant: DateTime<Utc>) -> i64 {
    i64::from(instant.hour()) * 60 + i64::from(instant.minute())
}

/// Format an average minutes-since-midnight value as zero-padded `"HH:MM"`.
///
/// Linear, not circular: the value is used as-is, without wrapping at 24h.
#[allow(clippy::cast_possible_truncation)]
fn format_minutes_to_hhmm(average_minutes: f64) -> String {
    let hours = (average_minutes / 60.0).floor() as i64;
    let minutes = (average_minutes % 60.0).round() as i64;
    format!("{hours:02}:{minutes:02}")
}
