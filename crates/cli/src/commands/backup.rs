//! Backup export and import for one account.
//!
//! Files use the same JSON format as the settings page download, so a
//! browser export can be restored here and the other way round.

use std::io::Write;
use std::path::Path;

use secrecy::SecretString;

use family_planner_web::services::backup::{self, ImportSummary};

use super::{CliError, connect, find_user};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Export `username`'s data to `output`, or stdout when `None`.
pub async fn export(
    database_url: &SecretString,
    username: &str,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let pool = connect(database_url).await?;
    let user_id = find_user(&pool, username).await?;

    let now = chrono::Local::now().naive_local();
    let document = backup::export(&pool, user_id, now).await?;
    let body = backup::to_json(&document)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &body).await.map_err(io_error(path))?;
            tracing::info!(bytes = body.len(), path = %path.display(), "Backup written");
        }
        None => {
            let stdout = Path::new("<stdout>");
            let mut handle = std::io::stdout().lock();
            handle.write_all(&body).map_err(io_error(stdout))?;
            handle.write_all(b"\n").map_err(io_error(stdout))?;
        }
    }
    Ok(())
}

/// Import the backup at `input` into `username`'s account.
pub async fn import(
    database_url: &SecretString,
    username: &str,
    input: &Path,
) -> Result<ImportSummary, CliError> {
    let bytes = tokio::fs::read(input).await.map_err(io_error(input))?;
    let document = backup::parse(&bytes)?;

    let pool = connect(database_url).await?;
    let user_id = find_user(&pool, username).await?;

    let summary = backup::import(&pool, user_id, document).await?;
    tracing::info!(
        records = summary.total(),
        transactions = summary.transactions,
        budgets = summary.budgets,
        family_members = summary.family_members,
        events = summary.events,
        goals = summary.goals,
        shopping_lists = summary.shopping_lists,
        "Import complete"
    );
    Ok(summary)
}
