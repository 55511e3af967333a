//! Authentication service.
//!
//! Password accounts with bcrypt hashes. Hashing and verification run on the
//! blocking thread pool so a login never stalls the async runtime.

mod error;

pub use error::AuthError;

use bcrypt::{DEFAULT_COST, hash, verify};
use tracing::info;

use family_planner_core::{Email, UserId, Username};

use crate::db::{Pool, RepositoryError, UserRepository};
use crate::models::user::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt only looks at the first 72 bytes of a password.
const MAX_PASSWORD_BYTES: usize = 72;

/// Registration form input.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'f> {
    pub username: &'f str,
    pub email: &'f str,
    pub password: &'f str,
    pub password_confirm: &'f str,
}

/// What a profile update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub email: bool,
    pub password: bool,
}

/// Authentication service.
///
/// Handles registration, login and profile changes.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if any field is blank.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::InvalidEmail` / `InvalidUsername` for malformed input.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn register(&self, form: Registration<'_>) -> Result<User, AuthError> {
        for (field, value) in [
            ("username", form.username),
            ("email", form.email),
            ("password", form.password),
            ("password confirmation", form.password_confirm),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::MissingField(field));
            }
        }

        if form.password != form.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(form.password)?;

        let username = Username::parse(form.username)?;
        let email = Email::parse(form.email)?;
        let password_hash = hash_password(form.password).await?;

        let user = self
            .users
            .create(&username, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown or the
    /// password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .users
            .get_credentials(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash).await?;

        Ok(credentials.user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change the email and/or password of an account.
    ///
    /// Blank values leave the field unchanged. A new password must be
    /// confirmed and meet the registration rules.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email.
    /// Returns `AuthError::UserAlreadyExists` if another account uses the email.
    /// Returns `AuthError::PasswordMismatch` / `WeakPassword` for a bad new password.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        email: Option<&str>,
        new_password: Option<(&str, &str)>,
    ) -> Result<ProfileChanges, AuthError> {
        let email = email
            .filter(|e| !e.trim().is_empty())
            .map(Email::parse)
            .transpose()?;

        let password = new_password.filter(|(password, confirm)| {
            !password.is_empty() || !confirm.is_empty()
        });
        let password_hash = match password {
            Some((password, confirm)) => {
                if password != confirm {
                    return Err(AuthError::PasswordMismatch);
                }
                validate_password(password)?;
                Some(hash_password(password).await?)
            }
            None => None,
        };

        let mut changes = ProfileChanges::default();
        if let Some(email) = email {
            let current = self.get_user(user_id).await?;
            if current.email != email {
                self.users
                    .update_email(user_id, &email)
                    .await
                    .map_err(|e| match e {
                        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                        RepositoryError::NotFound => AuthError::UserNotFound,
                        other => AuthError::Repository(other),
                    })?;
                changes.email = true;
            }
        }
        if let Some(password_hash) = password_hash {
            self.users
                .update_password_hash(user_id, &password_hash)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => AuthError::UserNotFound,
                    other => AuthError::Repository(other),
                })?;
            changes.password = true;
        }

        if changes != ProfileChanges::default() {
            info!(
                user_id = %user_id,
                email_changed = changes.email,
                password_changed = changes.password,
                "Profile updated"
            );
        }
        Ok(changes)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Hash a password with bcrypt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|_| AuthError::PasswordHash)?
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a bcrypt hash.
async fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let matches = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|_| AuthError::PasswordHash)?
        .map_err(|_| AuthError::InvalidCredentials)?;

    if matches {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("correct horse").await.unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("correct horse", &hashed).await.is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hashed).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-bcrypt-hash").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
