//! Budget repository.

use chrono::NaiveDate;
use sqlx::SqliteExecutor;

use family_planner_core::{BudgetId, Money, UserId, YearMonth};

use super::{Pool, RepositoryError};
use crate::models::finance::{Budget, NewBudget};

#[derive(sqlx::FromRow)]
struct BudgetRow {
    id: BudgetId,
    category: String,
    amount_cents: i64,
    month: u32,
    year: i32,
}

impl TryFrom<BudgetRow> for Budget {
    type Error = RepositoryError;

    fn try_from(row: BudgetRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            category: row.category,
            amount: Money::from_cents(row.amount_cents),
            period: YearMonth::new(row.year, row.month)
                .map_err(|e| RepositoryError::corrupt("budget month", e))?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SpendingRow {
    #[sqlx(flatten)]
    budget: BudgetRow,
    spent_cents: i64,
}

/// A budget together with what has been spent against it.
#[derive(Debug, Clone)]
pub struct BudgetSpending {
    pub budget: Budget,
    /// Sum of expense transactions in the budget's category and month.
    pub spent: Money,
}

/// Repository for budget database operations.
pub struct BudgetRepository<'a> {
    pool: &'a Pool,
}

impl<'a> BudgetRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self { pool }
    }

    /// Set the budget for a category and month, replacing any existing amount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(&self, user_id: UserId, input: &NewBudget) -> Result<Budget, RepositoryError> {
        upsert(self.pool, user_id, input).await
    }

    /// Budgets for one month, ordered by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_month(
        &self,
        user_id: UserId,
        period: YearMonth,
    ) -> Result<Vec<Budget>, RepositoryError> {
        sqlx::query_as::<_, BudgetRow>(
            r"
            SELECT id, category, amount_cents, month, year
            FROM budgets
            WHERE user_id = ? AND month = ? AND year = ?
            ORDER BY category
            ",
        )
        .bind(user_id)
        .bind(period.month())
        .bind(period.year())
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Budget::try_from)
        .collect()
    }

    /// Every budget, for export.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, user_id: UserId) -> Result<Vec<Budget>, RepositoryError> {
        sqlx::query_as::<_, BudgetRow>(
            r"
            SELECT id, category, amount_cents, month, year
            FROM budgets
            WHERE user_id = ?
            ORDER BY year, month, category
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Budget::try_from)
        .collect()
    }

    /// Remove the budget for a category and month.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such budget.
    pub async fn delete(
        &self,
        user_id: UserId,
        category: &str,
        period: YearMonth,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM budgets WHERE user_id = ? AND category = ? AND month = ? AND year = ?",
        )
        .bind(user_id)
        .bind(category)
        .bind(period.month())
        .bind(period.year())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Each budget for the month with the expenses recorded against it.
    ///
    /// Spending counts expense transactions in the budget's category dated in
    /// `[first day of month, first day of next month)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn spending_for_month(
        &self,
        user_id: UserId,
        period: YearMonth,
    ) -> Result<Vec<BudgetSpending>, RepositoryError> {
        let start: NaiveDate = period.first_day();
        let end: NaiveDate = period.next().first_day();

        sqlx::query_as::<_, SpendingRow>(
            r"
            SELECT b.id, b.category, b.amount_cents, b.month, b.year,
                   COALESCE((
                       SELECT SUM(t.amount_cents)
                       FROM transactions t
                       WHERE t.user_id = b.user_id
                         AND t.category = b.category
                         AND t.transaction_type = 'expense'
                         AND t.occurred_on >= ?
                         AND t.occurred_on < ?
                   ), 0) AS spent_cents
            FROM budgets b
            WHERE b.user_id = ? AND b.month = ? AND b.year = ?
            ORDER BY b.category
            ",
        )
        .bind(start)
        .bind(end)
        .bind(user_id)
        .bind(period.month())
        .bind(period.year())
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| {
            Ok(BudgetSpending {
                budget: Budget::try_from(row.budget)?,
                spent: Money::from_cents(row.spent_cents),
            })
        })
        .collect()
    }
}

pub(crate) async fn upsert<'e, E>(
    executor: E,
    user_id: UserId,
    input: &NewBudget,
) -> Result<Budget, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    let amount_cents = input
        .amount
        .cents()
        .map_err(|e| RepositoryError::corrupt("budget amount", e))?;

    let row = sqlx::query_as::<_, BudgetRow>(
        r"
        INSERT INTO budgets (user_id, category, amount_cents, month, year)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id, category, month, year)
        DO UPDATE SET amount_cents = excluded.amount_cents
        RETURNING id, category, amount_cents, month, year
        ",
    )
    .bind(user_id)
    .bind(&input.category)
    .bind(amount_cents)
    .bind(input.period.month())
    .bind(input.period.year())
    .fetch_one(executor)
    .await?;

    Budget::try_from(row)
}
