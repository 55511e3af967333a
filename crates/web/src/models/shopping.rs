//! Shopping lists and their items.

use chrono::NaiveDateTime;

use family_planner_core::{ShoppingItemId, ShoppingListId};

use super::validation::{self, ValidationError};

#[derive(Debug, Clone)]
pub struct ShoppingList {
    pub id: ShoppingListId,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// A list with its item counts, as shown on the lists page.
#[derive(Debug, Clone)]
pub struct ShoppingListSummary {
    pub list: ShoppingList,
    pub total_items: i64,
    /// Items not yet ticked off.
    pub open_items: i64,
}

#[derive(Debug, Clone)]
pub struct ShoppingItem {
    pub id: ShoppingItemId,
    pub list_id: ShoppingListId,
    pub item_name: String,
    pub quantity: u32,
    pub completed: bool,
}

/// Input for adding an item to a list.
#[derive(Debug, Clone)]
pub struct NewShoppingItem {
    pub item_name: String,
    pub quantity: u32,
    pub completed: bool,
}

impl NewShoppingItem {
    /// Largest quantity a form may submit.
    pub const MAX_QUANTITY: u32 = 9_999;

    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name or a quantity outside
    /// `1..=MAX_QUANTITY`.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.item_name = validation::required_text("item name", &self.item_name)?;
        if !(1..=Self::MAX_QUANTITY).contains(&self.quantity) {
            return Err(ValidationError::OutOfRange {
                field: "quantity",
                min: 1,
                max: i64::from(Self::MAX_QUANTITY),
            });
        }
        Ok(self)
    }
}
