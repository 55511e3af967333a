//! Account settings: profile, export, import and deleting all data.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb, clear_sentry_user};
use crate::filters;
use crate::middleware::{RequireAuth, clear_current_user};
use crate::models::user::User;
use crate::routes::Layout;
use crate::routes::messages::{Flash, MessageQuery, redirect_error, redirect_success};
use crate::services::auth::{AuthError, AuthService};
use crate::services::backup::{self, BackupError, DELETE_CONFIRMATION};
use crate::state::AppState;

const SETTINGS_PATH: &str = "/settings";

/// Multipart field holding the backup file.
pub const IMPORT_FIELD: &str = "backup";

/// Profile form data. Blank fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// Delete-all form data.
#[derive(Debug, Deserialize)]
pub struct DeleteAllForm {
    #[serde(default)]
    pub confirm: String,
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub layout: Layout,
    pub profile: User,
    pub confirmation: &'static str,
}

/// Display the settings page.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<SettingsTemplate, AppError> {
    let profile = AuthService::new(state.pool()).get_user(user.id).await?;
    Ok(SettingsTemplate {
        layout: Layout::new(&user, "settings", Flash::from_query(&query)),
        profile,
        confirmation: DELETE_CONFIRMATION,
    })
}

/// Change email and/or password.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, AppError> {
    let password = form.password.as_deref().unwrap_or_default();
    let confirm = form.password_confirm.as_deref().unwrap_or_default();

    match AuthService::new(state.pool())
        .update_profile(user.id, form.email.as_deref(), Some((password, confirm)))
        .await
    {
        Ok(changes) if changes.email || changes.password => {
            Ok(redirect_success(SETTINGS_PATH, "profile_updated"))
        }
        Ok(_) => Ok(redirect_success(SETTINGS_PATH, "profile_unchanged")),
        Err(err @ (AuthError::Repository(_) | AuthError::PasswordHash)) => Err(err.into()),
        Err(err) => Ok(redirect_error(
            SETTINGS_PATH,
            err.code().unwrap_or("required"),
        )),
    }
}

/// Download everything as a JSON file.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn export(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response, AppError> {
    let now = chrono::Local::now().naive_local();
    let document = backup::export(state.pool(), user.id, now).await?;
    let body = backup::to_json(&document)?;
    let filename = backup::export_filename(now);

    tracing::info!(bytes = body.len(), "Backup exported");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Read the backup file out of the upload.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(IMPORT_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(Some(bytes.to_vec()).filter(|b| !b.is_empty()));
    }
    Ok(None)
}

/// Import a backup file into the account.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn import(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let Some(bytes) = read_upload(&mut multipart).await? else {
        return Ok(redirect_error(SETTINGS_PATH, "missing_file"));
    };
    add_breadcrumb(
        "backup",
        "Import started",
        Some(&[("bytes", &bytes.len().to_string())]),
    );

    let result = match backup::parse(&bytes) {
        Ok(document) => backup::import(state.pool(), user.id, document).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => Ok(redirect_success(SETTINGS_PATH, "imported")),
        Err(err @ (BackupError::Repository(_) | BackupError::Encode(_))) => Err(err.into()),
        Err(err) => {
            tracing::info!(error = %err, "Import rejected");
            Ok(redirect_error(
                SETTINGS_PATH,
                err.code().unwrap_or("invalid_file"),
            ))
        }
    }
}

/// Delete all data and log out.
#[instrument(skip(state, user, session, form), fields(user_id = %user.id))]
pub async fn delete_all(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<DeleteAllForm>,
) -> Result<Redirect, AppError> {
    match backup::delete_all(state.pool(), user.id, &form.confirm).await {
        Ok(_) => {}
        Err(BackupError::ConfirmationMismatch) => {
            return Ok(redirect_error(SETTINGS_PATH, "confirm_delete"));
        }
        Err(err) => return Err(err.into()),
    }

    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(redirect_success("/auth/login", "data_deleted"))
}
