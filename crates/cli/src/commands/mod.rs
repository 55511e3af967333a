//! Subcommand implementations.

use secrecy::SecretString;
use thiserror::Error;

use family_planner_core::{UserId, Username, UsernameError};
use family_planner_web::db::{self, Pool, RepositoryError, UserRepository};
use family_planner_web::services::auth::AuthError;
use family_planner_web::services::backup::BackupError;

pub mod backup;
pub mod migrate;
pub mod secret;
pub mod user;

/// Errors reported by any command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("No account with username: {0}")]
    UnknownUser(String),

    #[error("Cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Open the database the commands work on.
async fn connect(database_url: &SecretString) -> Result<Pool, CliError> {
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(database_url).await?)
}

/// Look up an account id by login name.
async fn find_user(pool: &Pool, username: &str) -> Result<UserId, CliError> {
    let parsed = Username::parse(username)?;
    UserRepository::new(pool)
        .get_by_username(&parsed)
        .await?
        .map(|user| user.id)
        .ok_or_else(|| CliError::UnknownUser(username.to_owned()))
}
