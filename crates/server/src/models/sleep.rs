//! Sleep entry domain types.
//!
//! The serialized field names of [`SleepEntry`] and [`WeeklyStats`] are a
//! compatibility contract with API clients and must not be renamed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use somnolog_core::{SleepEntryId, UserId};

/// One recorded night of sleep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepEntry {
    /// Unique entry ID.
    pub id: SleepEntryId,
    /// Owning user. Immutable after creation.
    pub user_id: UserId,
    /// Calendar date of the sleep night (UTC).
    pub date_of_sleep: NaiveDate,
    /// Instant the user went to sleep.
    pub sleep_time: DateTime<Utc>,
    /// Instant the user woke up.
    pub wake_up_time: DateTime<Utc>,
    /// Derived: `round((wake_up_time - sleep_time) / 60000 ms)`.
    pub duration_in_minutes: i64,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a sleep entry.
#[derive(Debug, Clone)]
pub struct NewSleepEntry {
    /// Calendar date of the sleep night (UTC).
    pub date_of_sleep: NaiveDate,
    /// Instant the user went to sleep.
    pub sleep_time: DateTime<Utc>,
    /// Instant the user woke up.
    pub wake_up_time: DateTime<Utc>,
}

/// Partial update for a sleep entry.
///
/// Each field is applied only when present; absent fields leave the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct SleepPatch {
    /// New calendar date, if changing.
    pub date_of_sleep: Option<NaiveDate>,
    /// New sleep instant, if changing.
    pub sleep_time: Option<DateTime<Utc>>,
    /// New wake-up instant, if changing.
    pub wake_up_time: Option<DateTime<Utc>>,
}

/// Rolling 7-day summary of sleep entries.
///
/// All three averages are `null` when no entries fall inside the window;
/// the window boundaries are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    /// Rounded arithmetic mean of entry durations, in minutes.
    pub average_sleep_duration_minutes: Option<i64>,
    /// Linear mean of sleep times of day, formatted `"HH:MM"`.
    pub average_sleep_time: Option<String>,
    /// Linear mean of wake-up times of day, formatted `"HH:MM"`.
    pub average_wake_up_time: Option<String>,
    /// First calendar day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Last calendar day of the window (inclusive).
    pub end_date: NaiveDate,
    /// Number of entries inside the window.
    pub total_entries_considered: usize,
}
