//! Database operations for the planner's `SQLite` store.
//!
//! # Tables
//!
//! - `users` - Family accounts
//! - `family_members` - Profiles of people in the family
//! - `transactions`, `budgets` - Money in and out, monthly limits
//! - `shopping_lists`, `shopping_list_items`
//! - `events` - Calendar entries
//! - `goals`, `goal_milestones`
//! - `tower_sessions` - Session storage (owned by the session store)
//!
//! Every query that reads or changes family data takes the owning
//! [`UserId`](family_planner_core::UserId). Rows belonging to another account
//! are indistinguishable from missing rows.
//!
//! # Migrations
//!
//! Migrations live in `crates/web/migrations/` and are embedded into the
//! binary. They run on startup (unless `AUTO_MIGRATE=false`) or via:
//! ```bash
//! cargo run -p family-planner-cli -- migrate
//! ```

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub mod budgets;
pub mod events;
pub mod family;
pub mod goals;
pub mod shopping;
pub mod transactions;
pub mod users;

pub use budgets::BudgetRepository;
pub use events::EventRepository;
pub use family::FamilyRepository;
pub use goals::GoalRepository;
pub use shopping::ShoppingRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;

/// Connection pool type used throughout the crate.
pub type Pool = sqlx::SqlitePool;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }

    /// Wrap a column value that no longer parses into its domain type.
    pub(crate) fn corrupt(column: &str, err: impl std::fmt::Display) -> Self {
        Self::DataCorruption(format!("invalid {column} in database: {err}"))
    }
}

/// Create a `SQLite` connection pool.
///
/// The database file and its parent directory are created when missing.
/// Foreign keys are enforced and the journal runs in WAL mode.
///
/// # Arguments
///
/// * `database_url` - `SQLite` URL (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is malformed, the directory cannot be
/// created, or the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<Pool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    if let Some(parent) = options
        .get_filename()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Apply any pending embedded migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the recorded history does
/// not match the embedded migrations.
pub async fn run_migrations(pool: &Pool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
