//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Dashboard
//!
//! # Auth
//! GET  /auth/login                         - Login page
//! POST /auth/login                         - Login action
//! GET  /auth/register                      - Register page
//! POST /auth/register                      - Register action
//! POST /auth/logout                        - Logout action
//!
//! # Finance
//! GET  /finance?start&end&type             - Transactions and expense breakdown
//! POST /finance/transactions               - Add transaction
//! POST /finance/transactions/{id}/delete   - Delete transaction
//!
//! # Budget
//! GET  /budget?month&year                  - Budget summary
//! POST /budget                             - Set budget (upsert)
//! POST /budget/delete                      - Delete budget
//!
//! # Shopping
//! GET  /shopping                           - Lists
//! POST /shopping                           - Create list
//! GET  /shopping/{id}                      - List detail
//! POST /shopping/{id}/delete               - Delete list
//! POST /shopping/{id}/items                - Add item
//! POST /shopping/{id}/items/{item}/toggle  - Toggle item
//! POST /shopping/{id}/items/{item}/delete  - Delete item
//!
//! # Family
//! GET  /family                             - Members and statistics
//! POST /family                             - Add member
//! GET  /family/{id}/edit                   - Edit form
//! POST /family/{id}                        - Update member
//! POST /family/{id}/delete                 - Delete member
//!
//! # Calendar
//! GET  /calendar?view&year&month&date      - Month, week or upcoming view
//! POST /calendar/events                    - Add event
//! GET  /calendar/events/{id}/edit          - Edit form
//! POST /calendar/events/{id}               - Update event
//! POST /calendar/events/{id}/delete        - Delete event
//!
//! # Goals
//! GET  /goals?category&status              - Board and statistics
//! POST /goals                              - Add goal
//! GET  /goals/{id}                         - Goal detail
//! POST /goals/{id}                         - Update goal
//! POST /goals/{id}/delete                  - Delete goal
//! POST /goals/{id}/milestones              - Add milestone
//! POST /goals/{id}/milestones/{m}/toggle   - Toggle milestone
//! POST /goals/{id}/milestones/{m}/delete   - Delete milestone
//!
//! # Settings
//! GET  /settings                           - Profile, export, import, delete
//! POST /settings/profile                   - Update email/password
//! GET  /settings/export                    - Download JSON backup
//! POST /settings/import                    - Upload JSON backup
//! POST /settings/delete                    - Delete all data
//! ```

pub mod auth;
pub mod budget;
pub mod calendar;
pub mod family;
pub mod finance;
pub mod goals;
pub mod home;
pub mod messages;
pub mod settings;
pub mod shopping;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::models::session::CurrentUser;
use crate::state::AppState;
use messages::Flash;

/// Largest accepted backup upload.
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

/// Navigation and banner data shared by every page.
#[derive(Debug, Clone)]
pub struct Layout {
    /// `None` on the login, register and error pages.
    pub username: Option<String>,
    /// Which navigation entry is highlighted.
    pub active: &'static str,
    pub flash: Flash,
}

impl Layout {
    #[must_use]
    pub fn new(user: &CurrentUser, active: &'static str, flash: Flash) -> Self {
        Self {
            username: Some(user.username.to_string()),
            active,
            flash,
        }
    }

    #[must_use]
    pub const fn anonymous(flash: Flash) -> Self {
        Self {
            username: None,
            active: "",
            flash,
        }
    }
}

/// One `<option>` of a `<select>`, with its selection worked out up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }

    /// Options labelled by their value, selecting the one equal to `selected`.
    #[must_use]
    pub fn from_entries(entries: &[&str], selected: &str) -> Vec<Self> {
        entries
            .iter()
            .map(|entry| Self::new(*entry, *entry, *entry == selected))
            .collect()
    }

    /// `from_entries` preceded by an "any" option with an empty value.
    #[must_use]
    pub fn with_any(any_label: &str, entries: &[&str], selected: &str) -> Vec<Self> {
        let mut options = vec![Self::new("", any_label, selected.is_empty())];
        options.extend(Self::from_entries(entries, selected));
        options
    }
}

/// Create the auth routes router.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout));

    match auth_rate_limiter().filter(|_| rate_limit) {
        Some(limiter) => router.layer(limiter),
        None => router,
    }
}

/// Create the finance routes router.
pub fn finance_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(finance::index))
        .route("/transactions", post(finance::create))
        .route("/transactions/{id}/delete", post(finance::delete))
}

/// Create the budget routes router.
pub fn budget_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(budget::index).post(budget::save))
        .route("/delete", post(budget::delete))
}

/// Create the shopping routes router.
pub fn shopping_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shopping::index).post(shopping::create_list))
        .route("/{id}", get(shopping::show))
        .route("/{id}/delete", post(shopping::delete_list))
        .route("/{id}/items", post(shopping::add_item))
        .route("/{id}/items/{item_id}/toggle", post(shopping::toggle_item))
        .route("/{id}/items/{item_id}/delete", post(shopping::delete_item))
}

/// Create the family routes router.
pub fn family_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(family::index).post(family::create))
        .route("/{id}", post(family::update))
        .route("/{id}/edit", get(family::edit))
        .route("/{id}/delete", post(family::delete))
}

/// Create the calendar routes router.
pub fn calendar_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(calendar::index))
        .route("/events", post(calendar::create))
        .route("/events/{id}", post(calendar::update))
        .route("/events/{id}/edit", get(calendar::edit))
        .route("/events/{id}/delete", post(calendar::delete))
}

/// Create the goal routes router.
pub fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(goals::index).post(goals::create))
        .route("/{id}", get(goals::show).post(goals::update))
        .route("/{id}/delete", post(goals::delete))
        .route("/{id}/milestones", post(goals::add_milestone))
        .route(
            "/{id}/milestones/{milestone_id}/toggle",
            post(goals::toggle_milestone),
        )
        .route(
            "/{id}/milestones/{milestone_id}/delete",
            post(goals::delete_milestone),
        )
}

/// Create the settings routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::index))
        .route("/profile", post(settings::update_profile))
        .route("/export", get(settings::export))
        .route(
            "/import",
            post(settings::import).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
        .route("/delete", post(settings::delete_all))
}

/// Create all page routes.
pub fn routes(auth_rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::dashboard))
        .nest("/auth", auth_routes(auth_rate_limit))
        .nest("/finance", finance_routes())
        .nest("/budget", budget_routes())
        .nest("/shopping", shopping_routes())
        .nest("/family", family_routes())
        .nest("/calendar", calendar_routes())
        .nest("/goals", goal_routes())
        .nest("/settings", settings_routes())
}
