//! Authentication middleware and extractors.
//!
//! Provides the per-request gate that turns session state into an
//! authenticated [`Principal`], plus helpers to attach and detach the
//! principal reference on login/logout.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use somnolog_core::UserId;

use crate::db::users::UserRepository;
use crate::models::{Principal, session_keys};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// The session stores only the user's ID; the principal is re-derived from
/// the user store on every request, so a credential record deleted after
/// login is discovered lazily here and treated as "not authenticated".
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(principal): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", principal.username)
/// }
/// ```
pub struct RequireAuth(pub Principal);

/// Rejection returned when authentication is required but absent.
///
/// One uniform outcome: never-logged-in, expired sessions, deleted users,
/// and store read failures are indistinguishable to the caller.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "User is not authenticated").into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection)?;

        // Get the serialized principal token (the user ID) from the session
        let user_id: UserId = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        // Re-read the credential store; a user deleted since login is Absent
        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(user.into()))
    }
}

/// Attach the principal reference to the session (login).
///
/// # Errors
///
/// Returns an error if the session cannot be modified; callers must treat
/// this as a server fault, not an authentication failure.
pub async fn set_current_user(
    session: &Session,
    user_id: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user_id).await
}

/// Detach the principal reference from the session (logout hook).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserId>(session_keys::CURRENT_USER).await?;
    Ok(())
}
