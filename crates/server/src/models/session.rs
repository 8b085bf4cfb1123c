//! Session-related types.
//!
//! Types derived from or referenced by the session for authentication state.

use serde::{Deserialize, Serialize};

use somnolog_core::{UserId, Username};

use crate::models::User;

/// The authenticated identity attached to a request.
///
/// A stripped-down view of a credential record with no hash material. The
/// session itself stores only the `user_id` (see [`session_keys`]); the full
/// principal is re-derived from the user store on every guarded request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// User's database ID.
    pub user_id: UserId,
    /// User's login name.
    pub username: Username,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the logged-in user's ID (the serialized principal token).
    pub const CURRENT_USER: &str = "current_user";
}
