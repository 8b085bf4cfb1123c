//! Authentication route handlers.
//!
//! Handles signup, login, profile lookup, and logout. Login and logout are
//! the only places that touch the session directly; everything else goes
//! through the [`RequireAuth`] extractor.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::Principal;
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Credentials submitted at login or signup.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Generic message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: Principal,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a new account.
///
/// Duplicate usernames are rejected with 400; the uniqueness check is backed
/// by the store's unique index, so a racing duplicate signup still fails.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let auth = AuthService::new(state.pool());
    let user = auth.register(&body.username, &body.password).await?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Signed up successfully!",
        }),
    ))
}

/// Validate credentials and establish a session.
///
/// A failed session write is a server fault (500), not an authentication
/// failure: the credentials were valid, the session just never materialized.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool());
    let principal = auth
        .validate_credentials(&body.username, &body.password)
        .await?;

    set_current_user(&session, principal.user_id)
        .await
        .map_err(|e| AppError::SessionFault(format!("failed to establish session: {e}")))?;

    tracing::info!(user_id = %principal.user_id, "user logged in");

    Ok(Json(LoginResponse {
        message: "Logged in successfully",
        user: principal,
    }))
}

/// Return the current principal, re-derived from the user store.
pub async fn profile(RequireAuth(principal): RequireAuth) -> Json<Principal> {
    Json(principal)
}

/// Terminate the session.
///
/// Two ordered phases: detach the principal, then destroy the session
/// record. The cookie is cleared by the session layer only after the
/// destroy succeeds; if either phase fails the session state is
/// indeterminate and the client must not assume it was destroyed.
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::SessionFault(format!("logout failed: {e}")))?;

    session
        .flush()
        .await
        .map_err(|e| AppError::SessionFault(format!("session destroy failed: {e}")))?;

    Ok(Json(MessageResponse {
        message: "logged out",
    }))
}
