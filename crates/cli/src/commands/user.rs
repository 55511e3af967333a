//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! fp-cli user create -u alex -e alex@example.com -p 'correct horse battery'
//! FP_PASSWORD='correct horse battery' fp-cli user create -u alex -e alex@example.com
//! ```

use secrecy::SecretString;

use family_planner_core::UserId;
use family_planner_web::services::auth::{AuthService, Registration};

use super::{CliError, connect};

/// Create an account, applying the same rules as the registration page.
///
/// Returns the new account's id.
pub async fn create(
    database_url: &SecretString,
    username: &str,
    email: &str,
    password: &str,
) -> Result<UserId, CliError> {
    let pool = connect(database_url).await?;

    tracing::info!("Creating user: {}", username.trim());
    let user = AuthService::new(&pool)
        .register(Registration {
            username,
            email,
            password,
            password_confirm: password,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(user.id)
}
