//! Monthly budgets.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use family_planner_core::{BUDGET_CATEGORIES, YearMonth};

use crate::db::{BudgetRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::ValidationError;
use crate::models::finance::NewBudget;
use crate::models::validation;
use crate::routes::{Layout, SelectOption};
use crate::routes::messages::{Flash, redirect_error, redirect_success};
use crate::services::budget::{self, BudgetSummary};
use crate::state::AppState;

/// Month selector and banner query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Set-budget form data.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub year: String,
}

/// Delete-budget form data.
#[derive(Debug, Deserialize)]
pub struct DeleteBudgetForm {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub year: String,
}

fn parse_period(month: &str, year: &str) -> Result<YearMonth, ValidationError> {
    let month = validation::int_in_range("month", month, 1, 12)?;
    let year = validation::int_in_range("year", year, 1970, 9999)?;
    let (Ok(month), Ok(year)) = (u32::try_from(month), i32::try_from(year)) else {
        return Err(ValidationError::OutOfRange {
            field: "month",
            min: 1,
            max: 12,
        });
    };
    YearMonth::new(year, month).map_err(|_| ValidationError::OutOfRange {
        field: "month",
        min: 1,
        max: 12,
    })
}

fn budget_path(period: YearMonth) -> String {
    format!("/budget?month={}&year={}", period.month(), period.year())
}

fn current_period() -> YearMonth {
    YearMonth::containing(chrono::Local::now().date_naive())
}

/// Budget page template.
#[derive(Template, WebTemplate)]
#[template(path = "budget/index.html")]
pub struct BudgetTemplate {
    pub layout: Layout,
    pub summary: BudgetSummary,
    pub categories: &'static [&'static str],
    pub months: Vec<SelectOption>,
    pub years: Vec<SelectOption>,
}

/// Display the budget summary for the selected month.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<BudgetQuery>,
) -> Result<BudgetTemplate, AppError> {
    let current = current_period();
    let period = match (query.year, query.month) {
        (Some(year), Some(month)) => YearMonth::new(year, month).unwrap_or(current),
        _ => current,
    };
    let summary = budget::budget_summary(state.pool(), user.id, period).await?;

    Ok(BudgetTemplate {
        layout: Layout::new(
            &user,
            "budget",
            Flash::new(query.success.as_deref(), query.error.as_deref()),
        ),
        summary,
        categories: BUDGET_CATEGORIES.entries(),
        months: (1..=12)
            .map(|m| {
                SelectOption::new(
                    m.to_string(),
                    family_planner_core::month_name(m),
                    m == period.month(),
                )
            })
            .collect(),
        years: budget::year_options(current.year())
            .into_iter()
            .map(|y| SelectOption::new(y.to_string(), y.to_string(), y == period.year()))
            .collect(),
    })
}

/// Set (or replace) a budget.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn save(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<BudgetForm>,
) -> Result<Redirect, AppError> {
    let period = match parse_period(&form.month, &form.year) {
        Ok(period) => period,
        Err(err) => return Ok(redirect_error("/budget", err.code())),
    };
    let input = validation::non_negative_money("budget amount", &form.amount).and_then(|amount| {
        NewBudget {
            category: form.category.clone(),
            amount,
            period,
        }
        .validated()
    });
    let input = match input {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(&budget_path(period), err.code())),
    };

    BudgetRepository::new(state.pool())
        .upsert(user.id, &input)
        .await?;
    Ok(redirect_success(&budget_path(period), "budget_saved"))
}

/// Delete a budget.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<DeleteBudgetForm>,
) -> Result<Redirect, AppError> {
    let period = match parse_period(&form.month, &form.year) {
        Ok(period) => period,
        Err(err) => return Ok(redirect_error("/budget", err.code())),
    };
    match BudgetRepository::new(state.pool())
        .delete(user.id, form.category.trim(), period)
        .await
    {
        Ok(()) => Ok(redirect_success(&budget_path(period), "budget_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(&budget_path(period), "not_found")),
        Err(err) => Err(err.into()),
    }
}
