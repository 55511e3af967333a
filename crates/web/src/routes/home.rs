//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::Layout;
use crate::routes::messages::{Flash, MessageQuery};
use crate::services::dashboard::{self, Dashboard};
use crate::state::AppState;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub dashboard: Dashboard,
}

/// Display the dashboard.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<DashboardTemplate, AppError> {
    let now = chrono::Local::now().naive_local();
    let dashboard = dashboard::load(state.pool(), user.id, now).await?;

    Ok(DashboardTemplate {
        layout: Layout::new(&user, "home", Flash::from_query(&query)),
        dashboard,
    })
}
