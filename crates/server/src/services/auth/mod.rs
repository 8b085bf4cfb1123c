//! Authentication service.
//!
//! Validates credentials against the user store and registers new users.
//! Session establishment and teardown live in the transport layer (see
//! `routes::auth`); this service only produces the principal they attach.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use somnolog_core::Username;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{Principal, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 100;

/// Characters that count as "special" for the password policy.
const SPECIAL_CHARACTERS: &str = r##"!@#$%^&*()_+-=[]{};':"\|,.<>/?~"##;

/// Authentication service.
///
/// Handles user registration and credential validation.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UsernameTaken` if the username is already registered.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username)?;

        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Validate a username/password pair and return the principal.
    ///
    /// Unknown usernames, malformed usernames, and wrong passwords all
    /// collapse into the same `InvalidCredentials` outcome. The hash
    /// verification itself is the constant-time primitive.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let Ok(username) = Username::parse(username) else {
            return Err(AuthError::InvalidCredentials);
        };

        let (user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(Principal::from(user))
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password cannot be longer than {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one lowercase letter".to_owned(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one uppercase letter".to_owned(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one digit".to_owned(),
        ));
    }

    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one special character".to_owned(),
        ));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    const GOOD_PASSWORD: &str = "Hunter2!Hunter2!";

    #[tokio::test]
    async fn register_then_login() {
        let pool = memory_pool().await;
        let auth = AuthService::new(&pool);

        let user = auth.register("alice", GOOD_PASSWORD).await.expect("register");
        assert_eq!(user.username.as_str(), "alice");

        let principal = auth
            .validate_credentials("alice", GOOD_PASSWORD)
            .await
            .expect("login");
        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.username.as_str(), "alice");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let pool = memory_pool().await;
        let auth = AuthService::new(&pool);
        auth.register("alice", GOOD_PASSWORD).await.expect("register");

        let result = auth.validate_credentials("alice", "Wrong2!Wrong2!x").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_user_is_invalid_credentials() {
        let pool = memory_pool().await;
        let auth = AuthService::new(&pool);

        let result = auth.validate_credentials("nobody", GOOD_PASSWORD).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        // Malformed usernames are indistinguishable from unknown ones.
        let result = auth.validate_credentials("a b", GOOD_PASSWORD).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let pool = memory_pool().await;
        let auth = AuthService::new(&pool);
        auth.register("alice", GOOD_PASSWORD).await.expect("register");

        let result = auth.register("alice", GOOD_PASSWORD).await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn weak_passwords_are_rejected() {
        let pool = memory_pool().await;
        let auth = AuthService::new(&pool);

        for bad in ["Short1!", "nouppercase1!aaa", "NOLOWERCASE1!AAA", "NoDigits!!aaaA", "NoSpecial11aaaA"] {
            let result = auth.register("bob", bad).await;
            assert!(
                matches!(result, Err(AuthError::WeakPassword(_))),
                "expected weak password rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn principal_serializes_with_contract_field_names() {
        use somnolog_core::{UserId, Username};

        let principal = Principal {
            user_id: UserId::new(1),
            username: Username::parse("alice").expect("valid"),
        };
        let json = serde_json::to_value(&principal).expect("serialize");
        assert_eq!(json["userId"], 1);
        assert_eq!(json["username"], "alice");
    }
}
