//! Family member repository.

use chrono::NaiveDate;
use sqlx::SqliteExecutor;

use family_planner_core::{FamilyMemberId, UserId};

use super::{Pool, RepositoryError};
use crate::models::family::{FamilyMember, MemberInput};

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: FamilyMemberId,
    name: String,
    relationship: String,
    birth_date: Option<NaiveDate>,
}

impl From<MemberRow> for FamilyMember {
    fn from(row: MemberRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            relationship: row.relationship,
            birth_date: row.birth_date,
        }
    }
}

/// Repository for family member profiles.
pub struct FamilyRepository<'a> {
    pool: &'a Pool,
}

impl<'a> FamilyRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self { pool }
    }

    /// Add a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &MemberInput,
    ) -> Result<FamilyMember, RepositoryError> {
        insert(self.pool, user_id, input).await
    }

    /// All members, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<FamilyMember>, RepositoryError> {
        Ok(sqlx::query_as::<_, MemberRow>(
            r"
            SELECT id, name, relationship, birth_date
            FROM family_members
            WHERE user_id = ?
            ORDER BY name COLLATE NOCASE, id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(FamilyMember::from)
        .collect())
    }

    /// A single member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: FamilyMemberId,
    ) -> Result<Option<FamilyMember>, RepositoryError> {
        Ok(sqlx::query_as::<_, MemberRow>(
            r"
            SELECT id, name, relationship, birth_date
            FROM family_members
            WHERE id = ? AND user_id = ?
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(FamilyMember::from))
    }

    /// Replace a member's details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such member belongs to the user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: FamilyMemberId,
        input: &MemberInput,
    ) -> Result<FamilyMember, RepositoryError> {
        sqlx::query_as::<_, MemberRow>(
            r"
            UPDATE family_members
            SET name = ?, relationship = ?, birth_date = ?
            WHERE id = ? AND user_id = ?
            RETURNING id, name, relationship, birth_date
            ",
        )
        .bind(&input.name)
        .bind(&input.relationship)
        .bind(input.birth_date)
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(FamilyMember::from)
        .ok_or(RepositoryError::NotFound)
    }

    /// Remove a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such member belongs to the user.
    pub async fn delete(&self, user_id: UserId, id: FamilyMemberId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM family_members WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

pub(crate) async fn insert<'e, E>(
    executor: E,
    user_id: UserId,
    input: &MemberInput,
) -> Result<FamilyMember, RepositoryError>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, MemberRow>(
        r"
        INSERT INTO family_members (user_id, name, relationship, birth_date)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, relationship, birth_date
        ",
    )
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.relationship)
    .bind(input.birth_date)
    .fetch_one(executor)
    .await?
    .into())
}
