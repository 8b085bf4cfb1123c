//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health               - Liveness check (in main)
//! GET  /health/ready         - Readiness check (in main)
//!
//! # Auth
//! POST /auth/signup          - Create an account
//! POST /auth/login           - Login, establishes the session
//! GET  /auth/profile         - Current principal (requires auth)
//! POST /auth/logout          - Logout, destroys the session
//!
//! # Sleep (all require auth)
//! POST   /sleep              - Record a sleep entry
//! GET    /sleep              - List own entries, most recent night first
//! GET    /sleep/stats/weekly - Rolling 7-day summary
//! GET    /sleep/{id}         - Fetch one entry
//! PATCH  /sleep/{id}         - Partially update an entry
//! DELETE /sleep/{id}         - Delete an entry
//! ```

pub mod auth;
pub mod sleep;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/profile", get(auth::profile))
        .route("/logout", post(auth::logout))
}

/// Create the sleep routes router.
pub fn sleep_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(sleep::create).get(sleep::list))
        .route("/stats/weekly", get(sleep::weekly_stats))
        .route(
            "/{id}",
            get(sleep::show).patch(sleep::update).delete(sleep::remove),
        )
}

/// Assemble all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/sleep", sleep_routes())
}
