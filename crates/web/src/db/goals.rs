//! Goal and milestone repository.
//!
//! Milestones are reached through their goal, so every milestone query
//! checks the goal's owner.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use family_planner_core::{GoalId, GoalStatus, MilestoneId, Money, UserId};

use super::{Pool, RepositoryError};
use crate::models::goal::{Goal, Milestone, NewGoal, NewMilestone};

const GOAL_COLUMNS: &str = "id, title, category, description, target_date, \
                            target_amount_cents, status, progress, created_at";
const MILESTONE_COLUMNS: &str = "id, goal_id, title, target_date, completed, created_at";

#[derive(sqlx::FromRow)]
struct GoalRow {
    id: GoalId,
    title: String,
    category: String,
    description: Option<String>,
    target_date: NaiveDate,
    target_amount_cents: Option<i64>,
    status: String,
    progress: u8,
    created_at: NaiveDateTime,
}

impl TryFrom<GoalRow> for Goal {
    type Error = RepositoryError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            category: row.category,
            description: row.description,
            target_date: row.target_date,
            target_amount: row.target_amount_cents.map(Money::from_cents),
            status: row
                .status
                .parse()
                .map_err(|e| RepositoryError::corrupt("goal status", e))?,
            progress: row.progress,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MilestoneRow {
    id: MilestoneId,
    goal_id: GoalId,
    title: String,
    target_date: NaiveDate,
    completed: bool,
    created_at: NaiveDateTime,
}

impl From<MilestoneRow> for Milestone {
    fn from(row: MilestoneRow) -> Self {
        Self {
            id: row.id,
            goal_id: row.goal_id,
            title: row.title,
            target_date: row.target_date,
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}

/// Optional filters for the goal board.
#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    pub category: Option<String>,
    pub status: Option<GoalStatus>,
}

/// Repository for goals and milestones.
pub struct GoalRepository<'a> {
    pool: &'a Pool,
}

impl<'a> GoalRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self { pool }
    }

    /// Add a goal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, user_id: UserId, input: &NewGoal) -> Result<Goal, RepositoryError> {
        insert(self.pool, user_id, input).await
    }

    /// A single goal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId, id: GoalId) -> Result<Option<Goal>, RepositoryError> {
        sqlx::query_as::<_, GoalRow>(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(Goal::try_from)
        .transpose()
    }

    /// Goals matching `filter`, soonest target date first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &GoalFilter,
    ) -> Result<Vec<Goal>, RepositoryError> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = "));
        query.push_bind(user_id);
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY target_date, id");

        query
            .build_query_as::<GoalRow>()
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect()
    }

    /// Overwrite a goal with already-merged values (see `GoalUpdate::apply`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such goal belongs to the user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: GoalId,
        input: &NewGoal,
    ) -> Result<Goal, RepositoryError> {
        let target_amount_cents = target_cents(input)?;
        sqlx::query_as::<_, GoalRow>(&format!(
            r"
            UPDATE goals
            SET title = ?, category = ?, description = ?, target_date = ?,
                target_amount_cents = ?, status = ?, progress = ?
            WHERE id = ? AND user_id = ?
            RETURNING {GOAL_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(&input.category)
        .bind(input.description.as_deref())
        .bind(input.target_date)
        .bind(target_amount_cents)
        .bind(input.status.as_str())
        .bind(input.progress)
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(Goal::try_from)
        .transpose()?
        .ok_or(RepositoryError::NotFound)
    }

    /// Remove a goal and its milestones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such goal belongs to the user.
    pub async fn delete(&self, user_id: UserId, id: GoalId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Goal counts per category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_category(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(String, i64)>, RepositoryError> {
        Ok(sqlx::query_as::<_, (String, i64)>(
            "SELECT category, COUNT(*) FROM goals WHERE user_id = ? GROUP BY category ORDER BY category",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Goal counts per status, in board column order, including empty columns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn count_by_status(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(GoalStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM goals WHERE user_id = ? GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut counts: Vec<(GoalStatus, i64)> =
            GoalStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for (status, count) in rows {
            let status: GoalStatus = status
                .parse()
                .map_err(|e| RepositoryError::corrupt("goal status", e))?;
            if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == status) {
                entry.1 = count;
            }
        }
        Ok(counts)
    }

    /// Number of goals not yet completed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM goals WHERE user_id = ? AND status != ?",
        )
        .bind(user_id)
        .bind(GoalStatus::Completed.as_str())
        .fetch_one(self.pool)
        .await?)
    }

    // =========================================================================
    // Milestones
    // =========================================================================

    /// Add a milestone to one of the user's goals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the goal does not belong to the user.
    pub async fn add_milestone(
        &self,
        user_id: UserId,
        goal_id: GoalId,
        input: &NewMilestone,
    ) -> Result<Milestone, RepositoryError> {
        if self.get(user_id, goal_id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }
        insert_milestone(self.pool, goal_id, input).await
    }

    /// A goal's milestones, soonest target date first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_milestones(
        &self,
        user_id: UserId,
        goal_id: GoalId,
    ) -> Result<Vec<Milestone>, RepositoryError> {
        Ok(sqlx::query_as::<_, MilestoneRow>(
            r"
            SELECT m.id, m.goal_id, m.title, m.target_date, m.completed, m.created_at
            FROM goal_milestones m
            JOIN goals g ON g.id = m.goal_id
            WHERE m.goal_id = ? AND g.user_id = ?
            ORDER BY m.target_date, m.id
            ",
        )
        .bind(goal_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Milestone::from)
        .collect())
    }

    /// Flip a milestone's completed flag, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the milestone is not on one of the user's goals.
    pub async fn toggle_milestone(
        &self,
        user_id: UserId,
        goal_id: GoalId,
        milestone_id: MilestoneId,
    ) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            r"
            UPDATE goal_milestones
            SET completed = NOT completed
            WHERE id = ? AND goal_id = ?
              AND goal_id IN (SELECT id FROM goals WHERE user_id = ?)
            RETURNING completed
            ",
        )
        .bind(milestone_id)
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Remove a milestone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the milestone is not on one of the user's goals.
    pub async fn delete_milestone(
        &self,
        user_id: UserId,
        goal_id: GoalId,
        milestone_id: MilestoneId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM goal_milestones
            WHERE id = ? AND goal_id = ?
              AND goal_id IN (SELECT id FROM goals WHERE user_id = ?)
            ",
        )
        .bind(milestone_id)
        .bind(goal_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Every goal with its milestones, for export.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all_with_milestones(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Goal, Vec<Milestone>)>, RepositoryError> {
        let goals = self.list(user_id, &GoalFilter::default()).await?;
        let mut result = Vec::with_capacity(goals.len());
        for goal in goals {
            let milestones = self.list_milestones(user_id, goal.id).await?;
            result.push((goal, milestones));
        }
        Ok(result)
    }
}

fn target_cents(input: &NewGoal) -> Result<Option<i64>, RepositoryError> {
    input
        .target_amount
        .map(|amount| amount.cents())
        .transpose()
        .map_err(|e| RepositoryError::corrupt("target amount", e))
}

pub(crate) async fn insert<'e, E>(
    executor: E,
    user_id: UserId,
    input: &NewGoal,
) -> Result<Goal, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    let target_amount_cents = target_cents(input)?;
    let row = sqlx::query_as::<_, GoalRow>(&format!(
        r"
        INSERT INTO goals
            (user_id, title, category, description, target_date,
             target_amount_cents, status, progress)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {GOAL_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.category)
    .bind(input.description.as_deref())
    .bind(input.target_date)
    .bind(target_amount_cents)
    .bind(input.status.as_str())
    .bind(input.progress)
    .fetch_one(executor)
    .await?;

    Goal::try_from(row)
}

/// Insert a milestone without an ownership check; callers must already own `goal_id`.
pub(crate) async fn insert_milestone<'e, E>(
    executor: E,
    goal_id: GoalId,
    input: &NewMilestone,
) -> Result<Milestone, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, MilestoneRow>(&format!(
        r"
        INSERT INTO goal_milestones (goal_id, title, target_date, completed)
        VALUES (?, ?, ?, ?)
        RETURNING {MILESTONE_COLUMNS}
        "
    ))
    .bind(goal_id)
    .bind(&input.title)
    .bind(input.target_date)
    .bind(input.completed)
    .fetch_one(executor)
    .await?
    .into())
}
