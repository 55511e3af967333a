//! Shopping list repository.
//!
//! Items have no `user_id` of their own; every item query joins through
//! `shopping_lists` to check ownership.

use chrono::NaiveDateTime;
use sqlx::SqliteExecutor;

use family_planner_core::{ShoppingItemId, ShoppingListId, UserId};

use super::{Pool, RepositoryError};
use crate::models::shopping::{NewShoppingItem, ShoppingItem, ShoppingList, ShoppingListSummary};

#[derive(sqlx::FromRow)]
struct ListRow {
    id: ShoppingListId,
    name: String,
    created_at: NaiveDateTime,
}

impl From<ListRow> for ShoppingList {
    fn from(row: ListRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    list: ListRow,
    total_items: i64,
    open_items: i64,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: ShoppingItemId,
    list_id: ShoppingListId,
    item_name: String,
    quantity: u32,
    completed: bool,
}

impl From<ItemRow> for ShoppingItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            list_id: row.list_id,
            item_name: row.item_name,
            quantity: row.quantity,
            completed: row.completed,
        }
    }
}

/// Repository for shopping lists and their items.
pub struct ShoppingRepository<'a> {
    pool: &'a Pool,
}

impl<'a> ShoppingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self { pool }
    }

    /// Create an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_list(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<ShoppingList, RepositoryError> {
        insert_list(self.pool, user_id, name).await
    }

    /// All lists, newest first, with their item counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_summaries(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ShoppingListSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT l.id, l.name, l.created_at,
                   COUNT(i.id) AS total_items,
                   COALESCE(SUM(CASE WHEN i.completed = 0 THEN 1 ELSE 0 END), 0) AS open_items
            FROM shopping_lists l
            LEFT JOIN shopping_list_items i ON i.list_id = l.id
            WHERE l.user_id = ?
            GROUP BY l.id
            ORDER BY l.created_at DESC, l.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ShoppingListSummary {
                list: row.list.into(),
                total_items: row.total_items,
                open_items: row.open_items,
            })
            .collect())
    }

    /// A single list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_list(
        &self,
        user_id: UserId,
        id: ShoppingListId,
    ) -> Result<Option<ShoppingList>, RepositoryError> {
        Ok(sqlx::query_as::<_, ListRow>(
            "SELECT id, name, created_at FROM shopping_lists WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(ShoppingList::from))
    }

    /// Delete a list; its items go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such list belongs to the user.
    pub async fn delete_list(
        &self,
        user_id: UserId,
        id: ShoppingListId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shopping_lists WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add an item to one of the user's lists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the list does not belong to the user.
    pub async fn add_item(
        &self,
        user_id: UserId,
        list_id: ShoppingListId,
        input: &NewShoppingItem,
    ) -> Result<ShoppingItem, RepositoryError> {
        if self.get_list(user_id, list_id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }
        insert_item(self.pool, list_id, input).await
    }

    /// Items on a list, open items first, then in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(
        &self,
        user_id: UserId,
        list_id: ShoppingListId,
    ) -> Result<Vec<ShoppingItem>, RepositoryError> {
        Ok(sqlx::query_as::<_, ItemRow>(
            r"
            SELECT i.id, i.list_id, i.item_name, i.quantity, i.completed
            FROM shopping_list_items i
            JOIN shopping_lists l ON l.id = i.list_id
            WHERE i.list_id = ? AND l.user_id = ?
            ORDER BY i.completed, i.id
            ",
        )
        .bind(list_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(ShoppingItem::from)
        .collect())
    }

    /// Flip an item's completed flag, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not on one of the user's lists.
    pub async fn toggle_item(
        &self,
        user_id: UserId,
        list_id: ShoppingListId,
        item_id: ShoppingItemId,
    ) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            r"
            UPDATE shopping_list_items
            SET completed = NOT completed
            WHERE id = ? AND list_id = ?
              AND list_id IN (SELECT id FROM shopping_lists WHERE user_id = ?)
            RETURNING completed
            ",
        )
        .bind(item_id)
        .bind(list_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Remove an item from a list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not on one of the user's lists.
    pub async fn delete_item(
        &self,
        user_id: UserId,
        list_id: ShoppingListId,
        item_id: ShoppingItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shopping_list_items
            WHERE id = ? AND list_id = ?
              AND list_id IN (SELECT id FROM shopping_lists WHERE user_id = ?)
            ",
        )
        .bind(item_id)
        .bind(list_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of items not yet ticked off across all lists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_open_items(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM shopping_list_items i
            JOIN shopping_lists l ON l.id = i.list_id
            WHERE l.user_id = ? AND i.completed = 0
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?)
    }

    /// Every list with its items, oldest first, for export.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all_with_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(ShoppingList, Vec<ShoppingItem>)>, RepositoryError> {
        let lists = sqlx::query_as::<_, ListRow>(
            "SELECT id, name, created_at FROM shopping_lists WHERE user_id = ? ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut result = Vec::with_capacity(lists.len());
        for row in lists {
            let list = ShoppingList::from(row);
            let items = self.list_items(user_id, list.id).await?;
            result.push((list, items));
        }
        Ok(result)
    }
}

pub(crate) async fn insert_list<'e, E>(
    executor: E,
    user_id: UserId,
    name: &str,
) -> Result<ShoppingList, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, ListRow>(
        "INSERT INTO shopping_lists (user_id, name) VALUES (?, ?) RETURNING id, name, created_at",
    )
    .bind(user_id)
    .bind(name)
    .fetch_one(executor)
    .await?
    .into())
}

/// Insert an item without an ownership check; callers must already own `list_id`.
pub(crate) async fn insert_item<'e, E>(
    executor: E,
    list_id: ShoppingListId,
    input: &NewShoppingItem,
) -> Result<ShoppingItem, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, ItemRow>(
        r"
        INSERT INTO shopping_list_items (list_id, item_name, quantity, completed)
        VALUES (?, ?, ?, ?)
        RETURNING id, list_id, item_name, quantity, completed
        ",
    )
    .bind(list_id)
    .bind(&input.item_name)
    .bind(input.quantity)
    .bind(input.completed)
    .fetch_one(executor)
    .await?
    .into())
}
