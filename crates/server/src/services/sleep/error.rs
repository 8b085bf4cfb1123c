//! Sleep ledger error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during sleep ledger operations.
#[derive(Debug, Error)]
pub enum SleepError {
    /// The wake-up time is not strictly after the sleep time.
    #[error("wake up time must be after sleep time")]
    InvalidRange,

    /// Entry does not exist, or belongs to another user.
    ///
    /// Deliberately one outcome, so ledger access cannot be used to probe
    /// for entries owned by other users.
    #[error("sleep entry not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
