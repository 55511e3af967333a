//! User domain types.

use chrono::NaiveDateTime;

use family_planner_core::{Email, UserId, Username};

/// A family account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Contact address, unique across accounts.
    pub email: Email,
    /// When the account was created.
    pub created_at: NaiveDateTime,
}

/// A user together with their bcrypt hash, only loaded for credential checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}
