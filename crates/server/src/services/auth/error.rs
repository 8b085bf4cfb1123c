//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format (signup only).
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] somnolog_core::UsernameError),

    /// Invalid credentials (wrong password or user not found).
    ///
    /// Deliberately covers both cases so callers cannot probe for
    /// account existence.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already taken.
    #[error("username taken")]
    UsernameTaken,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
