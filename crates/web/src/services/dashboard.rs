//! Dashboard overview.

use chrono::NaiveDateTime;

use family_planner_core::{UserId, YearMonth};

use crate::db::{GoalRepository, Pool, RepositoryError, ShoppingRepository, TransactionRepository};
use crate::models::event::Event;
use crate::models::finance::{Totals, Transaction};
use crate::services::calendar;

/// How many recent transactions the dashboard lists.
const RECENT_TRANSACTIONS: i64 = 5;

/// Everything the home page shows.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub all_time: Totals,
    pub this_month: Totals,
    pub month: YearMonth,
    pub recent_transactions: Vec<Transaction>,
    pub upcoming_events: Vec<Event>,
    pub active_goals: i64,
    pub open_shopping_items: i64,
}

/// Gather the dashboard figures as of `now`.
///
/// # Errors
///
/// Returns `RepositoryError` if any of the underlying queries fail.
pub async fn load(
    pool: &Pool,
    user_id: UserId,
    now: NaiveDateTime,
) -> Result<Dashboard, RepositoryError> {
    let transactions = TransactionRepository::new(pool);
    let month = YearMonth::containing(now.date());

    let all_time = transactions.totals(user_id, None, None).await?;
    let this_month = transactions
        .totals(user_id, Some(month.first_day()), Some(month.last_day()))
        .await?;
    let recent_transactions = transactions.recent(user_id, RECENT_TRANSACTIONS).await?;
    let upcoming_events = calendar::upcoming(pool, user_id, now).await?;
    let active_goals = GoalRepository::new(pool).count_active(user_id).await?;
    let open_shopping_items = ShoppingRepository::new(pool)
        .count_open_items(user_id)
        .await?;

    Ok(Dashboard {
        all_time,
        this_month,
        month,
        recent_transactions,
        upcoming_events,
        active_goals,
        open_shopping_items,
    })
}
