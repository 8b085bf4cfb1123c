//! Business logic services.

pub mod auth;
pub mod sleep;

pub use auth::AuthService;
pub use sleep::SleepService;
