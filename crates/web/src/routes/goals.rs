//! Family goals: kanban board, detail page and milestones.

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

use family_planner_core::{
    FINANCIAL_GOAL_CATEGORY, GOAL_CATEGORIES, GoalId, GoalStatus, MilestoneId, Money,
};

use crate::db::goals::GoalFilter;
use crate::db::{GoalRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::ValidationError;
use crate::models::goal::{Goal, GoalUpdate, Milestone, NewGoal, NewMilestone};
use crate::models::validation;
use crate::routes::{Layout, SelectOption};
use crate::routes::messages::{Flash, redirect_error, redirect_success};
use crate::services::goals::{GoalBoard, goal_board};
use crate::state::AppState;

const GOALS_PATH: &str = "/goals";

/// Board filter and banner query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct GoalsQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl GoalsQuery {
    /// The filter, ignoring unknown values.
    fn filter(&self) -> GoalFilter {
        GoalFilter {
            category: self
                .category
                .as_deref()
                .and_then(|c| GOAL_CATEGORIES.find(c))
                .map(str::to_owned),
            status: self
                .status
                .as_deref()
                .and_then(|s| s.parse::<GoalStatus>().ok()),
        }
    }
}

/// Banner query parameters for the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

fn optional_amount(value: Option<&str>) -> Result<Option<Money>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => validation::non_negative_money("target amount", value).map(Some),
    }
}

/// New goal form data.
#[derive(Debug, Deserialize)]
pub struct GoalForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub description: Option<String>,
    #[serde(default)]
    pub target_date: String,
    pub target_amount: Option<String>,
}

impl GoalForm {
    fn parse(&self) -> Result<NewGoal, ValidationError> {
        NewGoal::new(
            self.title.clone(),
            self.category.clone(),
            self.description.clone(),
            validation::parse_date("target date", &self.target_date)?,
            optional_amount(self.target_amount.as_deref())?,
        )
        .validated()
    }
}

/// Goal edit form data. Fields left out of the submission are unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct GoalUpdateForm {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<String>,
    pub target_amount: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
}

impl GoalUpdateForm {
    fn parse(&self) -> Result<GoalUpdate, ValidationError> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<GoalStatus>()
                    .map_err(|_| ValidationError::InvalidChoice {
                        field: "goal status",
                        value: s.to_owned(),
                    })
            })
            .transpose()?;
        let progress = self
            .progress
            .as_deref()
            .map(|p| validation::int_in_range("progress", p, 0, 100))
            .transpose()?
            .and_then(|p| u8::try_from(p).ok());
        let target_date = self
            .target_date
            .as_deref()
            .map(|d| validation::parse_date("target date", d))
            .transpose()?;
        let target_amount = match &self.target_amount {
            Some(value) => Some(optional_amount(Some(value))?),
            None => None,
        };

        Ok(GoalUpdate {
            title: self.title.clone(),
            category: self.category.clone(),
            description: self.description.clone().map(Some),
            target_date,
            target_amount,
            status,
            progress,
        })
    }
}

/// New milestone form data.
#[derive(Debug, Deserialize)]
pub struct MilestoneForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub target_date: String,
}

impl MilestoneForm {
    fn parse(&self) -> Result<NewMilestone, ValidationError> {
        NewMilestone {
            title: self.title.clone(),
            target_date: validation::parse_date("target date", &self.target_date)?,
            completed: false,
        }
        .validated()
    }
}

/// Status choices keyed by slug, optionally led by an "all" entry.
fn status_options(selected: Option<GoalStatus>, with_any: bool) -> Vec<SelectOption> {
    let mut options = Vec::with_capacity(GoalStatus::ALL.len() + 1);
    if with_any {
        options.push(SelectOption::new("", "All statuses", selected.is_none()));
    }
    options.extend(
        GoalStatus::ALL
            .iter()
            .map(|s| SelectOption::new(s.slug(), s.as_str(), selected == Some(*s))),
    );
    options
}

fn goal_path(id: GoalId) -> String {
    format!("/goals/{id}")
}

/// Board page template.
#[derive(Template, WebTemplate)]
#[template(path = "goals/index.html")]
pub struct GoalsTemplate {
    pub layout: Layout,
    pub board: GoalBoard,
    pub categories: &'static [&'static str],
    pub category_filter: Vec<SelectOption>,
    pub status_filter: Vec<SelectOption>,
    pub financial: &'static str,
    pub today: NaiveDate,
}

/// Goal detail template.
#[derive(Template, WebTemplate)]
#[template(path = "goals/show.html")]
pub struct GoalDetailTemplate {
    pub layout: Layout,
    pub goal: Goal,
    pub milestones: Vec<Milestone>,
    pub completed_milestones: usize,
    pub target_amount: String,
    pub categories: Vec<SelectOption>,
    pub statuses: Vec<SelectOption>,
    pub financial: &'static str,
    pub today: NaiveDate,
}

/// Display the board and statistics.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<GoalsQuery>,
) -> Result<GoalsTemplate, AppError> {
    let filter = query.filter();
    let board = goal_board(state.pool(), user.id, &filter).await?;

    Ok(GoalsTemplate {
        layout: Layout::new(
            &user,
            "goals",
            Flash::new(query.success.as_deref(), query.error.as_deref()),
        ),
        board,
        categories: GOAL_CATEGORIES.entries(),
        category_filter: SelectOption::with_any(
            "All categories",
            GOAL_CATEGORIES.entries(),
            filter.category.as_deref().unwrap_or_default(),
        ),
        status_filter: status_options(filter.status, true),
        financial: FINANCIAL_GOAL_CATEGORY,
        today: chrono::Local::now().date_naive(),
    })
}

/// Add a goal.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<GoalForm>,
) -> Result<Redirect, AppError> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(GOALS_PATH, err.code())),
    };
    GoalRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok(redirect_success(GOALS_PATH, "goal_added"))
}

/// Display a goal with its milestones and edit form.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GoalId>,
    Query(query): Query<DetailQuery>,
) -> Result<GoalDetailTemplate, AppError> {
    let repo = GoalRepository::new(state.pool());
    let goal = repo
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("goal {id}")))?;
    let milestones = repo.list_milestones(user.id, id).await?;

    Ok(GoalDetailTemplate {
        layout: Layout::new(
            &user,
            "goals",
            Flash::new(query.success.as_deref(), query.error.as_deref()),
        ),
        completed_milestones: milestones.iter().filter(|m| m.completed).count(),
        target_amount: goal
            .target_amount
            .map(|m| m.to_input_value())
            .unwrap_or_default(),
        categories: SelectOption::from_entries(GOAL_CATEGORIES.entries(), &goal.category),
        statuses: status_options(Some(goal.status), false),
        goal,
        milestones,
        financial: FINANCIAL_GOAL_CATEGORY,
        today: chrono::Local::now().date_naive(),
    })
}

/// Apply changes to a goal.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GoalId>,
    Form(form): Form<GoalUpdateForm>,
) -> Result<Redirect, AppError> {
    let path = goal_path(id);
    let repo = GoalRepository::new(state.pool());
    let Some(goal) = repo.get(user.id, id).await? else {
        return Ok(redirect_error(GOALS_PATH, "not_found"));
    };
    let input = match form.parse().and_then(|update| update.apply(&goal)) {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(&path, err.code())),
    };
    match repo.update(user.id, id, &input).await {
        Ok(_) => Ok(redirect_success(&path, "goal_updated")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(GOALS_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Delete a goal and its milestones.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GoalId>,
) -> Result<Redirect, AppError> {
    match GoalRepository::new(state.pool()).delete(user.id, id).await {
        Ok(()) => Ok(redirect_success(GOALS_PATH, "goal_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(GOALS_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Add a milestone to a goal.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn add_milestone(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GoalId>,
    Form(form): Form<MilestoneForm>,
) -> Result<Redirect, AppError> {
    let path = goal_path(id);
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(&path, err.code())),
    };
    match GoalRepository::new(state.pool())
        .add_milestone(user.id, id, &input)
        .await
    {
        Ok(_) => Ok(redirect_success(&path, "milestone_added")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(GOALS_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Flip a milestone between open and completed.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_milestone(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((id, milestone_id)): Path<(GoalId, MilestoneId)>,
) -> Result<Redirect, AppError> {
    let path = goal_path(id);
    match GoalRepository::new(state.pool())
        .toggle_milestone(user.id, id, milestone_id)
        .await
    {
        Ok(_) => Ok(redirect_success(&path, "milestone_updated")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(&path, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Delete a milestone.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_milestone(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((id, milestone_id)): Path<(GoalId, MilestoneId)>,
) -> Result<Redirect, AppError> {
    let path = goal_path(id);
    match GoalRepository::new(state.pool())
        .delete_milestone(user.id, id, milestone_id)
        .await
    {
        Ok(()) => Ok(redirect_success(&path, "milestone_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(&path, "not_found")),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_ignores_unknown_values() {
        let query = GoalsQuery {
            category: Some("health".to_owned()),
            status: Some("in-progress".to_owned()),
            ..GoalsQuery::default()
        };
        let filter = query.filter();
        assert_eq!(filter.category.as_deref(), Some("Health"));
        assert_eq!(filter.status, Some(GoalStatus::InProgress));

        let query = GoalsQuery {
            category: Some("Hobbies".to_owned()),
            status: Some("Abandoned".to_owned()),
            ..GoalsQuery::default()
        };
        let filter = query.filter();
        assert!(filter.category.is_none());
        assert!(filter.status.is_none());
    }

    #[test]
    fn test_update_form_leaves_missing_fields_alone() {
        let form = GoalUpdateForm {
            status: Some("Completed".to_owned()),
            progress: Some("100".to_owned()),
            ..GoalUpdateForm::default()
        };
        let update = form.parse().unwrap();
        assert_eq!(update.status, Some(GoalStatus::Completed));
        assert_eq!(update.progress, Some(100));
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.target_amount.is_none());
    }

    #[test]
    fn test_update_form_blank_amount_clears_it() {
        let form = GoalUpdateForm {
            target_amount: Some(String::new()),
            ..GoalUpdateForm::default()
        };
        assert_eq!(form.parse().unwrap().target_amount, Some(None));
    }

    #[test]
    fn test_status_options() {
        let options = status_options(Some(GoalStatus::OnHold), true);
        assert_eq!(options.len(), 5);
        assert!(options.iter().any(|o| o.value == "on-hold" && o.selected));
        assert!(!status_options(None, false).iter().any(|o| o.selected));
    }

    #[test]
    fn test_update_form_rejects_bad_progress() {
        let form = GoalUpdateForm {
            progress: Some("150".to_owned()),
            ..GoalUpdateForm::default()
        };
        assert_eq!(form.parse().unwrap_err().code(), "out_of_range");
    }
}
