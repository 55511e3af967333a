//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! fp-cli migrate
//! DATABASE_URL=sqlite:///var/lib/family-planner/data.db fp-cli migrate
//! ```
//!
//! Migrations are embedded from `crates/web/migrations/`, the same set the
//! server applies on startup when `AUTO_MIGRATE=true`.

use secrecy::SecretString;

use family_planner_web::db;

use super::{CliError, connect};

/// Apply all pending migrations.
pub async fn run(database_url: &SecretString) -> Result<(), CliError> {
    let pool = connect(database_url).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
