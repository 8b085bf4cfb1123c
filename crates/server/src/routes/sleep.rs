//! Sleep ledger route handlers.
//!
//! Every handler runs behind [`RequireAuth`]; the extracted principal's user
//! ID is the only ownership scope the service layer ever sees. Request and
//! response bodies use the camelCase field names of the API contract.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use somnolog_core::SleepEntryId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{NewSleepEntry, SleepEntry, SleepPatch, WeeklyStats};
use crate::services::SleepService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body for recording a sleep entry.
///
/// Malformed dates or timestamps are rejected at deserialization with
/// field-level messages before any handler code runs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSleepRequest {
    pub date_of_sleep: NaiveDate,
    pub sleep_time: DateTime<Utc>,
    pub wake_up_time: DateTime<Utc>,
}

/// Body for partially updating a sleep entry.
///
/// Absent fields leave the stored values untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSleepRequest {
    pub date_of_sleep: Option<NaiveDate>,
    pub sleep_time: Option<DateTime<Utc>>,
    pub wake_up_time: Option<DateTime<Utc>>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Record a new sleep entry for the current user.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(body): Json<CreateSleepRequest>,
) -> Result<(StatusCode, Json<SleepEntry>)> {
    let draft = NewSleepEntry {
        date_of_sleep: body.date_of_sleep,
        sleep_time: body.sleep_time,
        wake_up_time: body.wake_up_time,
    };

    let entry = SleepService::new(state.pool())
        .create(draft, principal.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// List the current user's entries, most recent night first.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<Vec<SleepEntry>>> {
    let entries = SleepService::new(state.pool())
        .list(principal.user_id)
        .await?;

    Ok(Json(entries))
}

/// Fetch one entry owned by the current user.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<SleepEntry>> {
    let entry = SleepService::new(state.pool())
        .get(SleepEntryId::new(id), principal.user_id)
        .await?;

    Ok(Json(entry))
}

/// Partially update one entry owned by the current user.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSleepRequest>,
) -> Result<Json<SleepEntry>> {
    let patch = SleepPatch {
        date_of_sleep: body.date_of_sleep,
        sleep_time: body.sleep_time,
        wake_up_time: body.wake_up_time,
    };

    let entry = SleepService::new(state.pool())
        .update(SleepEntryId::new(id), principal.user_id, patch)
        .await?;

    Ok(Json(entry))
}

/// Delete one entry owned by the current user.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    SleepService::new(state.pool())
        .remove(SleepEntryId::new(id), principal.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Rolling 7-day summary for the current user, ending today (UTC).
pub async fn weekly_stats(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<WeeklyStats>> {
    let stats = SleepService::new(state.pool())
        .weekly_stats(principal.user_id, Utc::now())
        .await?;

    Ok(Json(stats))
}
