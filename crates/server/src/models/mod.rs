//! Domain models for the server.

pub mod session;
pub mod sleep;
pub mod user;

pub use session::{Principal, session_keys};
pub use sleep::{NewSleepEntry, SleepEntry, SleepPatch, WeeklyStats};
pub use user::User;
