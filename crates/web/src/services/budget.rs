//! Monthly budget summary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use family_planner_core::{Money, UserId, YearMonth};

use crate::db::budgets::BudgetSpending;
use crate::db::{BudgetRepository, Pool, RepositoryError};

/// Percent used at or below which a budget is healthy.
const WARNING_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
/// Percent used above which a budget is exceeded.
const EXCEEDED_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

/// How close a budget is to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetHealth {
    /// At most 80 % used.
    Normal,
    /// Over 80 % and at most 100 % used.
    Warning,
    /// Over 100 % used.
    Exceeded,
}

impl BudgetHealth {
    #[must_use]
    pub fn from_percent(percent_used: Decimal) -> Self {
        if percent_used > EXCEEDED_THRESHOLD {
            Self::Exceeded
        } else if percent_used > WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    /// CSS modifier for the progress bar.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }
}

/// One category row of the summary.
#[derive(Debug, Clone)]
pub struct BudgetLine {
    pub category: String,
    pub budget: Money,
    pub spent: Money,
    /// Negative once overspent.
    pub remaining: Money,
    pub percent_used: Decimal,
    pub health: BudgetHealth,
}

impl BudgetLine {
    /// Progress bar width, capped at 100.
    #[must_use]
    pub fn bar_width(&self) -> u32 {
        self.percent_used
            .min(Decimal::ONE_HUNDRED)
            .max(Decimal::ZERO)
            .round()
            .to_u32()
            .unwrap_or_default()
    }
}

/// Budgets against spending for a month.
#[derive(Debug, Clone)]
pub struct BudgetSummary {
    pub period: YearMonth,
    pub lines: Vec<BudgetLine>,
    pub total_budget: Money,
    pub total_spent: Money,
    pub total_remaining: Money,
}

impl BudgetSummary {
    /// Build the summary from per-budget spending.
    #[must_use]
    pub fn from_spending(period: YearMonth, spending: Vec<BudgetSpending>) -> Self {
        let lines: Vec<BudgetLine> = spending
            .into_iter()
            .map(|entry| {
                let percent_used = entry.spent.percent_of(entry.budget.amount);
                BudgetLine {
                    category: entry.budget.category,
                    budget: entry.budget.amount,
                    spent: entry.spent,
                    remaining: entry.budget.amount - entry.spent,
                    percent_used,
                    health: BudgetHealth::from_percent(percent_used),
                }
            })
            .collect();

        let total_budget: Money = lines.iter().map(|l| l.budget).sum();
        let total_spent: Money = lines.iter().map(|l| l.spent).sum();

        Self {
            period,
            lines,
            total_budget,
            total_spent,
            total_remaining: total_budget - total_spent,
        }
    }
}

/// Load the budget summary for a month.
///
/// # Errors
///
/// Returns `RepositoryError` if the budgets cannot be loaded.
pub async fn budget_summary(
    pool: &Pool,
    user_id: UserId,
    period: YearMonth,
) -> Result<BudgetSummary, RepositoryError> {
    let spending = BudgetRepository::new(pool)
        .spending_for_month(user_id, period)
        .await?;
    Ok(BudgetSummary::from_spending(period, spending))
}

/// Years offered by the month selector: last year through next year.
#[must_use]
pub fn year_options(current_year: i32) -> Vec<i32> {
    (current_year - 1..=current_year + 1).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use family_planner_core::BudgetId;

    use super::*;
    use crate::models::finance::Budget;

    fn spending(category: &str, budget_cents: i64, spent_cents: i64) -> BudgetSpending {
        BudgetSpending {
            budget: Budget {
                id: BudgetId::new(1),
                category: category.to_owned(),
                amount: Money::from_cents(budget_cents),
                period: YearMonth::new(2026, 3).unwrap(),
            },
            spent: Money::from_cents(spent_cents),
        }
    }

    #[test]
    fn test_health_thresholds() {
        assert_eq!(BudgetHealth::from_percent(Decimal::from(80)), BudgetHealth::Normal);
        assert_eq!(
            BudgetHealth::from_percent(Decimal::new(801, 1)),
            BudgetHealth::Warning
        );
        assert_eq!(BudgetHealth::from_percent(Decimal::from(100)), BudgetHealth::Warning);
        assert_eq!(
            BudgetHealth::from_percent(Decimal::new(1001, 1)),
            BudgetHealth::Exceeded
        );
    }

    #[test]
    fn test_summary_totals_and_lines() {
        let summary = BudgetSummary::from_spending(
            YearMonth::new(2026, 3).unwrap(),
            vec![
                spending("Groceries", 50_000, 42_500),
                spending("Entertainment", 10_000, 12_000),
                spending("Savings", 0, 0),
            ],
        );

        assert_eq!(summary.total_budget, Money::from_cents(60_000));
        assert_eq!(summary.total_spent, Money::from_cents(54_500));
        assert_eq!(summary.total_remaining, Money::from_cents(5_500));

        let groceries = &summary.lines[0];
        assert_eq!(groceries.percent_used, Decimal::from(85));
        assert_eq!(groceries.health, BudgetHealth::Warning);

        let fun = &summary.lines[1];
        assert_eq!(fun.remaining, Money::from_cents(-2_000));
        assert_eq!(fun.health, BudgetHealth::Exceeded);
        assert_eq!(fun.bar_width(), 100);

        let savings = &summary.lines[2];
        assert_eq!(savings.percent_used, Decimal::ZERO);
        assert_eq!(savings.health, BudgetHealth::Normal);
    }

    #[test]
    fn test_year_options() {
        assert_eq!(year_options(2026), vec![2025, 2026, 2027]);
    }
}
