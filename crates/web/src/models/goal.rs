//! Goals and their milestones.

use chrono::{NaiveDate, NaiveDateTime};

use family_planner_core::{
    FINANCIAL_GOAL_CATEGORY, GOAL_CATEGORIES, GoalId, GoalStatus, MilestoneId, Money,
};

use super::validation::{self, ValidationError};

/// A family goal.
#[derive(Debug, Clone)]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub target_date: NaiveDate,
    /// Only present for `Financial` goals.
    pub target_amount: Option<Money>,
    pub status: GoalStatus,
    /// Percent complete, 0-100.
    pub progress: u8,
    pub created_at: NaiveDateTime,
}

impl Goal {
    /// Whether the target date has passed without the goal being completed.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != GoalStatus::Completed && self.target_date < today
    }

    /// Whether the goal tracks a target amount.
    #[must_use]
    pub fn is_financial(&self) -> bool {
        self.category == FINANCIAL_GOAL_CATEGORY
    }
}

/// Input for creating a goal. New goals start `Not Started` at 0 %.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub target_date: NaiveDate,
    pub target_amount: Option<Money>,
    pub status: GoalStatus,
    pub progress: u8,
}

impl NewGoal {
    /// A goal as entered on the board form.
    #[must_use]
    pub const fn new(
        title: String,
        category: String,
        description: Option<String>,
        target_date: NaiveDate,
        target_amount: Option<Money>,
    ) -> Self {
        Self {
            title,
            category,
            description,
            target_date,
            target_amount,
            status: GoalStatus::NotStarted,
            progress: 0,
        }
    }

    /// Check the fields and drop the target amount for non-financial goals.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank title, unknown category, negative
    /// target amount or progress above 100.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.title = validation::required_text("title", &self.title)?;
        self.category = validation::choice(&GOAL_CATEGORIES, &self.category)?.to_owned();
        self.description = validation::optional_text("description", self.description.as_deref())?;
        self.target_amount = financial_amount(&self.category, self.target_amount)?;
        check_progress(self.progress)?;
        Ok(self)
    }
}

/// A partial update; `None` leaves the field unchanged.
///
/// `target_amount` is only applied to `Financial` goals and is cleared when
/// the category moves away from `Financial`.
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<Option<String>>,
    pub target_date: Option<NaiveDate>,
    pub target_amount: Option<Option<Money>>,
    pub status: Option<GoalStatus>,
    pub progress: Option<u8>,
}

impl GoalUpdate {
    /// Apply this update to `goal`, returning the validated result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any supplied field is invalid.
    pub fn apply(self, goal: &Goal) -> Result<NewGoal, ValidationError> {
        let category = self.category.unwrap_or_else(|| goal.category.clone());
        NewGoal {
            title: self.title.unwrap_or_else(|| goal.title.clone()),
            target_amount: self.target_amount.unwrap_or(goal.target_amount),
            category,
            description: self.description.unwrap_or_else(|| goal.description.clone()),
            target_date: self.target_date.unwrap_or(goal.target_date),
            status: self.status.unwrap_or(goal.status),
            progress: self.progress.unwrap_or(goal.progress),
        }
        .validated()
    }
}

fn financial_amount(
    category: &str,
    amount: Option<Money>,
) -> Result<Option<Money>, ValidationError> {
    if category != FINANCIAL_GOAL_CATEGORY {
        return Ok(None);
    }
    match amount {
        Some(money) if money.is_negative() || money.cents().is_err() => {
            Err(ValidationError::InvalidAmount("target amount"))
        }
        other => Ok(other),
    }
}

const fn check_progress(progress: u8) -> Result<(), ValidationError> {
    if progress > 100 {
        return Err(ValidationError::OutOfRange {
            field: "progress",
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// A checkpoint on the way to a goal.
#[derive(Debug, Clone)]
pub struct Milestone {
    pub id: MilestoneId,
    pub goal_id: GoalId,
    pub title: String,
    pub target_date: NaiveDate,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub title: String,
    pub target_date: NaiveDate,
    pub completed: bool,
}

impl NewMilestone {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank title.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.title = validation::required_text("milestone title", &self.title)?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
    }

    #[test]
    fn test_target_amount_only_kept_for_financial_goals() {
        let savings = NewGoal::new(
            "Emergency fund".to_owned(),
            "financial".to_owned(),
            None,
            date(),
            Some(Money::from_cents(500_000)),
        )
        .validated()
        .unwrap();
        assert_eq!(savings.category, "Financial");
        assert_eq!(savings.target_amount, Some(Money::from_cents(500_000)));

        let marathon = NewGoal::new(
            "Run a marathon".to_owned(),
            "Health".to_owned(),
            None,
            date(),
            Some(Money::from_cents(100)),
        )
        .validated()
        .unwrap();
        assert_eq!(marathon.target_amount, None);
        assert_eq!(marathon.status, GoalStatus::NotStarted);
        assert_eq!(marathon.progress, 0);
    }

    #[test]
    fn test_update_changes_only_given_fields() {
        let goal = Goal {
            id: GoalId::new(1),
            title: "Emergency fund".to_owned(),
            category: "Financial".to_owned(),
            description: Some("Three months of expenses".to_owned()),
            target_date: date(),
            target_amount: Some(Money::from_cents(500_000)),
            status: GoalStatus::NotStarted,
            progress: 0,
            created_at: date().and_hms_opt(0, 0, 0).unwrap(),
        };
        let updated = GoalUpdate {
            status: Some(GoalStatus::InProgress),
            progress: Some(35),
            ..GoalUpdate::default()
        }
        .apply(&goal)
        .unwrap();
        assert_eq!(updated.title, "Emergency fund");
        assert_eq!(updated.status, GoalStatus::InProgress);
        assert_eq!(updated.progress, 35);
        assert_eq!(updated.target_amount, Some(Money::from_cents(500_000)));

        let moved = GoalUpdate {
            category: Some("Home".to_owned()),
            ..GoalUpdate::default()
        }
        .apply(&goal)
        .unwrap();
        assert_eq!(moved.target_amount, None);
    }

    #[test]
    fn test_progress_above_100_rejected() {
        let mut goal = NewGoal::new("Read".to_owned(), "Other".to_owned(), None, date(), None);
        goal.progress = 101;
        assert_eq!(goal.validated().unwrap_err().code(), "out_of_range");
    }
}
