//! Goal board and statistics.

use family_planner_core::{GoalStatus, UserId};

use crate::db::goals::GoalFilter;
use crate::db::{GoalRepository, Pool, RepositoryError};
use crate::models::goal::Goal;

/// One column of the board.
#[derive(Debug, Clone)]
pub struct BoardColumn {
    pub status: GoalStatus,
    pub goals: Vec<Goal>,
}

/// Group goals into one column per status, in board order.
///
/// Goals keep their incoming order inside each column.
#[must_use]
pub fn board_columns(goals: Vec<Goal>) -> Vec<BoardColumn> {
    let mut columns: Vec<BoardColumn> = GoalStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            status: *status,
            goals: Vec::new(),
        })
        .collect();
    for goal in goals {
        if let Some(column) = columns.iter_mut().find(|c| c.status == goal.status) {
            column.goals.push(goal);
        }
    }
    columns
}

/// Counts by category and status.
#[derive(Debug, Clone, Default)]
pub struct GoalStats {
    pub total: i64,
    pub by_category: Vec<(String, i64)>,
    pub by_status: Vec<(GoalStatus, i64)>,
}

/// The goals page: filtered board plus unfiltered statistics.
#[derive(Debug, Clone)]
pub struct GoalBoard {
    pub columns: Vec<BoardColumn>,
    pub stats: GoalStats,
}

/// Load the board for the given filter.
///
/// # Errors
///
/// Returns `RepositoryError` if the goals cannot be loaded.
pub async fn goal_board(
    pool: &Pool,
    user_id: UserId,
    filter: &GoalFilter,
) -> Result<GoalBoard, RepositoryError> {
    let repo = GoalRepository::new(pool);
    let goals = repo.list(user_id, filter).await?;
    let by_category = repo.count_by_category(user_id).await?;
    let by_status = repo.count_by_status(user_id).await?;

    Ok(GoalBoard {
        columns: board_columns(goals),
        stats: GoalStats {
            total: by_status.iter().map(|(_, n)| n).sum(),
            by_category,
            by_status,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use family_planner_core::GoalId;

    use super::*;

    fn goal(id: i64, status: GoalStatus) -> Goal {
        let date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        Goal {
            id: GoalId::new(id),
            title: format!("Goal {id}"),
            category: "Other".to_owned(),
            description: None,
            target_date: date,
            target_amount: None,
            status,
            progress: 0,
            created_at: date.and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_board_has_every_column_in_order() {
        let columns = board_columns(vec![
            goal(1, GoalStatus::Completed),
            goal(2, GoalStatus::InProgress),
            goal(3, GoalStatus::Completed),
        ]);
        let statuses: Vec<GoalStatus> = columns.iter().map(|c| c.status).collect();
        assert_eq!(statuses, GoalStatus::ALL.to_vec());
        assert!(columns[0].goals.is_empty());
        assert_eq!(columns[1].goals.len(), 1);
        let completed: Vec<i64> = columns[2].goals.iter().map(|g| g.id.as_i64()).collect();
        assert_eq!(completed, vec![1, 3]);
        assert!(columns[3].goals.is_empty());
    }
}
