//! Transaction repository.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use family_planner_core::{Money, TransactionId, TransactionType, UserId};

use super::{Pool, RepositoryError};
use crate::models::finance::{
    CategoryTotal, NewTransaction, Totals, Transaction, TransactionFilter,
};

const COLUMNS: &str =
    "id, amount_cents, category, description, transaction_type, occurred_on, created_at";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: TransactionId,
    amount_cents: i64,
    category: String,
    description: Option<String>,
    transaction_type: String,
    occurred_on: NaiveDate,
    created_at: NaiveDateTime,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = RepositoryError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            amount: Money::from_cents(row.amount_cents),
            category: row.category,
            description: row.description,
            transaction_type: row
                .transaction_type
                .parse()
                .map_err(|e| RepositoryError::corrupt("transaction type", e))?,
            occurred_on: row.occurred_on,
            created_at: row.created_at,
        })
    }
}

/// Repository for transaction database operations.
pub struct TransactionRepository<'a> {
    pool: &'a Pool,
}

impl<'a> TransactionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self { pool }
    }

    /// Record a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &NewTransaction,
    ) -> Result<Transaction, RepositoryError> {
        insert(self.pool, user_id, input).await
    }

    /// Transactions matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {COLUMNS} FROM transactions WHERE user_id = "
        ));
        query.push_bind(user_id);
        push_filter(&mut query, filter);
        query.push(" ORDER BY occurred_on DESC, id DESC");

        query
            .build_query_as::<TransactionRow>()
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// The `limit` most recent transactions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE user_id = ? \
             ORDER BY occurred_on DESC, id DESC LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
    }

    /// Every transaction, oldest first, for export.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, user_id: UserId) -> Result<Vec<Transaction>, RepositoryError> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE user_id = ? ORDER BY occurred_on, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
    }

    /// Delete a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such transaction belongs to the user.
    pub async fn delete(&self, user_id: UserId, id: TransactionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Income and expense totals, optionally bounded by inclusive dates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(
        &self,
        user_id: UserId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Totals, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r"
            SELECT
                COALESCE(SUM(CASE WHEN transaction_type = 'income' THEN amount_cents END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'expense' THEN amount_cents END), 0)
            FROM transactions
            WHERE user_id = ",
        );
        query.push_bind(user_id);
        push_filter(
            &mut query,
            &TransactionFilter {
                start,
                end,
                transaction_type: None,
            },
        );

        let (income, expenses) = query
            .build_query_as::<(i64, i64)>()
            .fetch_one(self.pool)
            .await?;

        Ok(Totals {
            income: Money::from_cents(income),
            expenses: Money::from_cents(expenses),
        })
    }

    /// Expense totals per category within the filter's date range.
    ///
    /// The filter's transaction type is ignored; only expenses are counted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn expenses_by_category(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<CategoryTotal>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT category, SUM(amount_cents) FROM transactions WHERE user_id = ",
        );
        query.push_bind(user_id);
        push_filter(
            &mut query,
            &TransactionFilter {
                transaction_type: Some(TransactionType::Expense),
                ..*filter
            },
        );
        query.push(" GROUP BY category ORDER BY category");

        let rows = query
            .build_query_as::<(String, i64)>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(category, cents)| CategoryTotal {
                category,
                total: Money::from_cents(cents),
            })
            .collect())
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &TransactionFilter) {
    if let Some(start) = filter.start {
        query.push(" AND occurred_on >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        query.push(" AND occurred_on <= ").push_bind(end);
    }
    if let Some(kind) = filter.transaction_type {
        query.push(" AND transaction_type = ").push_bind(kind.as_str());
    }
}

/// Insert a transaction on any executor, so imports can run inside one
/// database transaction.
pub(crate) async fn insert<'e, E>(
    executor: E,
    user_id: UserId,
    input: &NewTransaction,
) -> Result<Transaction, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    let amount_cents = input
        .amount
        .cents()
        .map_err(|e| RepositoryError::corrupt("amount", e))?;

    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        r"
        INSERT INTO transactions
            (user_id, amount_cents, category, description, transaction_type, occurred_on)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(amount_cents)
    .bind(&input.category)
    .bind(input.description.as_deref())
    .bind(input.transaction_type.as_str())
    .bind(input.occurred_on)
    .fetch_one(executor)
    .await?;

    Transaction::try_from(row)
}
