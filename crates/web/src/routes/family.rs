//! Family member profiles.

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

use family_planner_core::{FamilyMemberId, RELATIONSHIPS};

use crate::db::{FamilyRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::ValidationError;
use crate::models::family::{FamilyMember, MemberInput};
use crate::models::validation;
use crate::routes::{Layout, SelectOption};
use crate::routes::messages::{Flash, MessageQuery, redirect_error, redirect_success};
use crate::services::family::{FamilyStats, age_on, family_stats};
use crate::state::AppState;

const FAMILY_PATH: &str = "/family";

/// Add/edit member form data.
#[derive(Debug, Deserialize)]
pub struct MemberForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relationship: String,
    pub birth_date: Option<String>,
}

impl MemberForm {
    fn parse(&self) -> Result<MemberInput, ValidationError> {
        MemberInput {
            name: self.name.clone(),
            relationship: self.relationship.clone(),
            birth_date: validation::parse_optional_date("birth date", self.birth_date.as_deref())?,
        }
        .validated()
    }
}

/// A member with their current age.
#[derive(Debug, Clone)]
pub struct MemberRow {
    pub member: FamilyMember,
    pub age: Option<u32>,
}

/// Family page template.
#[derive(Template, WebTemplate)]
#[template(path = "family/index.html")]
pub struct FamilyTemplate {
    pub layout: Layout,
    pub members: Vec<MemberRow>,
    pub stats: FamilyStats,
    pub relationships: &'static [&'static str],
    pub today: NaiveDate,
}

/// Edit member template.
#[derive(Template, WebTemplate)]
#[template(path = "family/edit.html")]
pub struct EditMemberTemplate {
    pub layout: Layout,
    pub member: FamilyMember,
    pub birth_date: String,
    pub relationships: Vec<SelectOption>,
    pub today: NaiveDate,
}

/// Display members and statistics.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<FamilyTemplate, AppError> {
    let today = chrono::Local::now().date_naive();
    let members = FamilyRepository::new(state.pool()).list(user.id).await?;
    let stats = family_stats(&members, today);

    Ok(FamilyTemplate {
        layout: Layout::new(&user, "family", Flash::from_query(&query)),
        members: members
            .into_iter()
            .map(|member| MemberRow {
                age: member.birth_date.and_then(|b| age_on(b, today)),
                member,
            })
            .collect(),
        stats,
        relationships: RELATIONSHIPS.entries(),
        today,
    })
}

/// Add a member.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<MemberForm>,
) -> Result<Redirect, AppError> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(FAMILY_PATH, err.code())),
    };
    FamilyRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok(redirect_success(FAMILY_PATH, "member_added"))
}

/// Display the edit form for a member.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<FamilyMemberId>,
    Query(query): Query<MessageQuery>,
) -> Result<EditMemberTemplate, AppError> {
    let member = FamilyRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("family member {id}")))?;

    Ok(EditMemberTemplate {
        layout: Layout::new(&user, "family", Flash::from_query(&query)),
        birth_date: member.birth_date.map(|d| d.to_string()).unwrap_or_default(),
        relationships: SelectOption::from_entries(RELATIONSHIPS.entries(), &member.relationship),
        member,
        today: chrono::Local::now().date_naive(),
    })
}

/// Save changes to a member.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<FamilyMemberId>,
    Form(form): Form<MemberForm>,
) -> Result<Redirect, AppError> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(&format!("/family/{id}/edit"), err.code())),
    };
    match FamilyRepository::new(state.pool())
        .update(user.id, id, &input)
        .await
    {
        Ok(_) => Ok(redirect_success(FAMILY_PATH, "member_updated")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(FAMILY_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Remove a member.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<FamilyMemberId>,
) -> Result<Redirect, AppError> {
    match FamilyRepository::new(state.pool())
        .delete(user.id, id)
        .await
    {
        Ok(()) => Ok(redirect_success(FAMILY_PATH, "member_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(FAMILY_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}
