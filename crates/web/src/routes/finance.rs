//! Income and expense tracking.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use family_planner_core::{TRANSACTION_CATEGORIES, TransactionId, TransactionType};

use crate::db::{RepositoryError, TransactionRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::ValidationError;
use crate::models::finance::{BreakdownRow, NewTransaction, Totals, Transaction, TransactionFilter};
use crate::models::validation;
use crate::routes::{Layout, SelectOption};
use crate::routes::messages::{Flash, redirect_error, redirect_success};
use crate::state::AppState;

const FINANCE_PATH: &str = "/finance";

/// Filter and banner query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FinanceQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl FinanceQuery {
    /// The filter, ignoring values that do not parse.
    fn filter(&self) -> TransactionFilter {
        let date = |value: &Option<String>| {
            validation::parse_optional_date("date", value.as_deref())
                .ok()
                .flatten()
        };
        TransactionFilter {
            start: date(&self.start),
            end: date(&self.end),
            transaction_type: self
                .transaction_type
                .as_deref()
                .and_then(|t| t.parse::<TransactionType>().ok()),
        }
    }
}

/// New transaction form data.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub category: String,
    pub description: Option<String>,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub date: String,
}

impl TransactionForm {
    fn parse(&self) -> Result<NewTransaction, ValidationError> {
        let transaction_type = self
            .transaction_type
            .parse::<TransactionType>()
            .map_err(|_| ValidationError::InvalidChoice {
                field: "transaction type",
                value: self.transaction_type.clone(),
            })?;
        NewTransaction {
            amount: validation::positive_money("amount", &self.amount)?,
            category: self.category.clone(),
            description: self.description.clone(),
            transaction_type,
            occurred_on: validation::parse_date("date", &self.date)?,
        }
        .validated()
    }
}

fn type_filter(selected: Option<TransactionType>) -> Vec<SelectOption> {
    let mut options = vec![SelectOption::new("", "All", selected.is_none())];
    options.extend(
        TransactionType::ALL
            .iter()
            .map(|t| SelectOption::new(t.as_str(), t.label(), selected == Some(*t))),
    );
    options
}

/// Finance page template.
#[derive(Template, WebTemplate)]
#[template(path = "finance/index.html")]
pub struct FinanceTemplate {
    pub layout: Layout,
    pub transactions: Vec<Transaction>,
    pub totals: Totals,
    pub breakdown: Vec<BreakdownRow>,
    pub categories: &'static [&'static str],
    pub types: [TransactionType; 2],
    pub filter_start: String,
    pub filter_end: String,
    pub type_filter: Vec<SelectOption>,
    pub today: NaiveDate,
}

/// Display transactions with the expense breakdown.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FinanceQuery>,
) -> Result<FinanceTemplate, AppError> {
    let filter = query.filter();
    let repo = TransactionRepository::new(state.pool());

    let transactions = repo.list(user.id, &filter).await?;
    let totals = repo.totals(user.id, filter.start, filter.end).await?;
    let by_category = repo.expenses_by_category(user.id, &filter).await?;

    Ok(FinanceTemplate {
        layout: Layout::new(
            &user,
            "finance",
            Flash::new(query.success.as_deref(), query.error.as_deref()),
        ),
        transactions,
        totals,
        breakdown: BreakdownRow::from_totals(by_category),
        categories: TRANSACTION_CATEGORIES.entries(),
        types: TransactionType::ALL,
        filter_start: filter.start.map(|d| d.to_string()).unwrap_or_default(),
        filter_end: filter.end.map(|d| d.to_string()).unwrap_or_default(),
        type_filter: type_filter(filter.transaction_type),
        today: chrono::Local::now().date_naive(),
    })
}

/// Add a transaction.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<TransactionForm>,
) -> Result<Redirect, AppError> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(FINANCE_PATH, err.code())),
    };
    TransactionRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok(redirect_success(FINANCE_PATH, "transaction_added"))
}

/// Delete a transaction.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<TransactionId>,
) -> Result<Redirect, AppError> {
    match TransactionRepository::new(state.pool())
        .delete(user.id, id)
        .await
    {
        Ok(()) => Ok(redirect_success(FINANCE_PATH, "transaction_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(FINANCE_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}
