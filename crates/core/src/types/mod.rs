//! Core types for Family Planner.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod id;
pub mod money;
pub mod period;
pub mod status;
pub mod username;

pub use catalog::{
    BUDGET_CATEGORIES, Catalog, EVENT_CATEGORIES, FINANCIAL_GOAL_CATEGORY, GOAL_CATEGORIES,
    RELATIONSHIPS, TRANSACTION_CATEGORIES,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use period::{InvalidYearMonth, YearMonth, month_name};
pub use status::*;
pub use username::{Username, UsernameError};
