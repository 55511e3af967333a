//! Family Planner CLI - migrations, accounts and backups.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! fp-cli migrate
//!
//! # Create an account (password may also come from FP_PASSWORD)
//! fp-cli user create --username alex --email alex@example.com --password '...'
//!
//! # Back up and restore one account
//! fp-cli export --username alex --output alex.json
//! fp-cli import --username alex --input alex.json
//!
//! # Print a fresh SECRET_KEY
//! fp-cli secret
//! ```
//!
//! Every command except `secret` reads `DATABASE_URL` (or `--database-url`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

/// Default `SQLite` database, shared with the web server.
const DEFAULT_DATABASE_URL: &str = "sqlite://data/family_planner.db";

#[derive(Parser)]
#[command(name = "fp-cli")]
#[command(author, version, about = "Family Planner CLI tools")]
struct Cli {
    /// `SQLite` database URL
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL, hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Write an account's data as a JSON backup
    Export {
        /// Account to export
        #[arg(short, long)]
        username: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add the records of a JSON backup to an account
    Import {
        /// Account to import into
        #[arg(short, long)]
        username: String,

        /// Backup file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print a random value suitable for `SECRET_KEY`
    Secret,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "FP_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before parsing so it can supply DATABASE_URL and FP_PASSWORD
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fp_cli=info,family_planner_web=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let database_url = SecretString::from(cli.database_url);

    match cli.command {
        Commands::Migrate => commands::migrate::run(&database_url).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                password,
            } => {
                commands::user::create(&database_url, &username, &email, &password).await?;
            }
        },
        Commands::Export { username, output } => {
            commands::backup::export(&database_url, &username, output.as_deref()).await?;
        }
        Commands::Import { username, input } => {
            commands::backup::import(&database_url, &username, &input).await?;
        }
        Commands::Secret => commands::secret::print(),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_output_is_optional() {
        let cli = Cli::try_parse_from(["fp-cli", "export", "--username", "alex"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export { ref username, output: None } if username == "alex"
        ));
    }

    #[test]
    fn test_import_requires_input() {
        assert!(Cli::try_parse_from(["fp-cli", "import", "--username", "alex"]).is_err());
    }
}
