//! Shopping lists and their items.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use family_planner_core::{ShoppingItemId, ShoppingListId};

use crate::db::{RepositoryError, ShoppingRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::ValidationError;
use crate::models::shopping::{NewShoppingItem, ShoppingItem, ShoppingList, ShoppingListSummary};
use crate::models::validation;
use crate::routes::Layout;
use crate::routes::messages::{Flash, MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

const SHOPPING_PATH: &str = "/shopping";

/// New list form data.
#[derive(Debug, Deserialize)]
pub struct ListForm {
    #[serde(default)]
    pub name: String,
}

/// New item form data.
#[derive(Debug, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub item_name: String,
    pub quantity: Option<String>,
}

impl ItemForm {
    fn parse(&self) -> Result<NewShoppingItem, ValidationError> {
        let quantity = match self.quantity.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(value) => validation::int_in_range(
                "quantity",
                value,
                1,
                i64::from(NewShoppingItem::MAX_QUANTITY),
            )?,
        };
        NewShoppingItem {
            item_name: self.item_name.clone(),
            quantity: u32::try_from(quantity).unwrap_or(1),
            completed: false,
        }
        .validated()
    }
}

fn list_path(id: ShoppingListId) -> String {
    format!("/shopping/{id}")
}

/// Lists page template.
#[derive(Template, WebTemplate)]
#[template(path = "shopping/index.html")]
pub struct ShoppingIndexTemplate {
    pub layout: Layout,
    pub lists: Vec<ShoppingListSummary>,
}

/// List detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shopping/show.html")]
pub struct ShoppingListTemplate {
    pub layout: Layout,
    pub list: ShoppingList,
    pub open_items: Vec<ShoppingItem>,
    pub completed_items: Vec<ShoppingItem>,
}

/// Display all lists, newest first.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<ShoppingIndexTemplate, AppError> {
    let lists = ShoppingRepository::new(state.pool())
        .list_summaries(user.id)
        .await?;
    Ok(ShoppingIndexTemplate {
        layout: Layout::new(&user, "shopping", Flash::from_query(&query)),
        lists,
    })
}

/// Create a list and open it.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create_list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ListForm>,
) -> Result<Redirect, AppError> {
    let name = match validation::required_text("list name", &form.name) {
        Ok(name) => name,
        Err(err) => return Ok(redirect_error(SHOPPING_PATH, err.code())),
    };
    let list = ShoppingRepository::new(state.pool())
        .create_list(user.id, &name)
        .await?;
    Ok(redirect_success(&list_path(list.id), "list_created"))
}

/// Display one list with its items, open items first.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ShoppingListId>,
    Query(query): Query<MessageQuery>,
) -> Result<ShoppingListTemplate, AppError> {
    let repo = ShoppingRepository::new(state.pool());
    let list = repo
        .get_list(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shopping list {id}")))?;
    let (completed_items, open_items) = repo
        .list_items(user.id, id)
        .await?
        .into_iter()
        .partition(|item| item.completed);

    Ok(ShoppingListTemplate {
        layout: Layout::new(&user, "shopping", Flash::from_query(&query)),
        list,
        open_items,
        completed_items,
    })
}

/// Delete a list and its items.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ShoppingListId>,
) -> Result<Redirect, AppError> {
    match ShoppingRepository::new(state.pool())
        .delete_list(user.id, id)
        .await
    {
        Ok(()) => Ok(redirect_success(SHOPPING_PATH, "list_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(SHOPPING_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Add an item to a list.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ShoppingListId>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, AppError> {
    let path = list_path(id);
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(&path, err.code())),
    };
    match ShoppingRepository::new(state.pool())
        .add_item(user.id, id, &input)
        .await
    {
        Ok(_) => Ok(redirect_success(&path, "item_added")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(SHOPPING_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Flip an item between open and completed.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((id, item_id)): Path<(ShoppingListId, ShoppingItemId)>,
) -> Result<Redirect, AppError> {
    let path = list_path(id);
    match ShoppingRepository::new(state.pool())
        .toggle_item(user.id, id, item_id)
        .await
    {
        Ok(_) => Ok(redirect_success(&path, "item_updated")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(&path, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Remove an item from a list.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((id, item_id)): Path<(ShoppingListId, ShoppingItemId)>,
) -> Result<Redirect, AppError> {
    let path = list_path(id);
    match ShoppingRepository::new(state.pool())
        .delete_item(user.id, id, item_id)
        .await
    {
        Ok(()) => Ok(redirect_success(&path, "item_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(&path, "not_found")),
        Err(err) => Err(err.into()),
    }
}
