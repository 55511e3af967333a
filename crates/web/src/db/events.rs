//! Calendar event repository.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqliteExecutor;

use family_planner_core::{EventId, UserId};

use super::{Pool, RepositoryError};
use crate::models::event::{Event, EventInput};

const COLUMNS: &str = "id, title, category, description, start_at, end_at, reminder, reminder_at";

#[derive(sqlx::FromRow)]
struct EventRow {
    id: EventId,
    title: String,
    category: String,
    description: Option<String>,
    start_at: NaiveDateTime,
    end_at: Option<NaiveDateTime>,
    reminder: bool,
    reminder_at: Option<NaiveDateTime>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            category: row.category,
            description: row.description,
            start_at: row.start_at,
            end_at: row.end_at,
            reminder: row.reminder,
            reminder_at: row.reminder_at,
        }
    }
}

/// Repository for calendar events.
pub struct EventRepository<'a> {
    pool: &'a Pool,
}

impl<'a> EventRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self { pool }
    }

    /// Add an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, user_id: UserId, input: &EventInput) -> Result<Event, RepositoryError> {
        insert(self.pool, user_id, input).await
    }

    /// A single event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId, id: EventId) -> Result<Option<Event>, RepositoryError> {
        Ok(sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {COLUMNS} FROM events WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(Event::from))
    }

    /// Replace an event's details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such event belongs to the user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: EventId,
        input: &EventInput,
    ) -> Result<Event, RepositoryError> {
        sqlx::query_as::<_, EventRow>(&format!(
            r"
            UPDATE events
            SET title = ?, category = ?, description = ?, start_at = ?, end_at = ?,
                reminder = ?, reminder_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING {COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(&input.category)
        .bind(input.description.as_deref())
        .bind(input.start_at)
        .bind(input.end_at)
        .bind(input.reminder)
        .bind(input.reminder_at)
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(Event::from)
        .ok_or(RepositoryError::NotFound)
    }

    /// Remove an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such event belongs to the user.
    pub async fn delete(&self, user_id: UserId, id: EventId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Events starting on any day from `first` to `last` inclusive, by start time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn between_days(
        &self,
        user_id: UserId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<Event>, RepositoryError> {
        let from = first.and_time(chrono::NaiveTime::MIN);
        let Some(until) = last.succ_opt().map(|d| d.and_time(chrono::NaiveTime::MIN)) else {
            return Ok(Vec::new());
        };
        self.starting_in(user_id, from, until).await
    }

    /// Events starting in `[from, until)`, by start time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn starting_in(
        &self,
        user_id: UserId,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Event>, RepositoryError> {
        Ok(sqlx::query_as::<_, EventRow>(&format!(
            r"
            SELECT {COLUMNS} FROM events
            WHERE user_id = ? AND start_at >= ? AND start_at < ?
            ORDER BY start_at, id
            "
        ))
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Event::from)
        .collect())
    }

    /// Every event, for export.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, user_id: UserId) -> Result<Vec<Event>, RepositoryError> {
        Ok(sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {COLUMNS} FROM events WHERE user_id = ? ORDER BY start_at, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Event::from)
        .collect())
    }
}

pub(crate) async fn insert<'e, E>(
    executor: E,
    user_id: UserId,
    input: &EventInput,
) -> Result<Event, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, EventRow>(&format!(
        r"
        INSERT INTO events
            (user_id, title, category, description, start_at, end_at, reminder, reminder_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.category)
    .bind(input.description.as_deref())
    .bind(input.start_at)
    .bind(input.end_at)
    .bind(input.reminder)
    .bind(input.reminder_at)
    .fetch_one(executor)
    .await?
    .into())
}
