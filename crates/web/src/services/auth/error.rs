//! Authentication error types.

use thiserror::Error;

use family_planner_core::{EmailError, UsernameError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid username.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Username or email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

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

impl AuthError {
    /// Short code carried in `?error=` when redirecting back to a form.
    ///
    /// Returns `None` for server-side failures, which render an error page.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(_) => Some("required"),
            Self::InvalidEmail(_) => Some("invalid_email"),
            Self::InvalidUsername(_) => Some("invalid_username"),
            Self::InvalidCredentials | Self::UserNotFound => Some("credentials"),
            Self::UserAlreadyExists => Some("exists"),
            Self::PasswordMismatch => Some("mismatch"),
            Self::WeakPassword(_) => Some("weak_password"),
            Self::Repository(_) | Self::PasswordHash => None,
        }
    }
}
