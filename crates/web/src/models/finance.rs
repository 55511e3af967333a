//! Transactions and budgets.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use family_planner_core::{
    BUDGET_CATEGORIES, BudgetId, Money, TRANSACTION_CATEGORIES, TransactionId, TransactionType,
    YearMonth,
};

use super::validation::{self, ValidationError};

/// A recorded income or expense.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    /// Always positive; the direction comes from `transaction_type`.
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
    pub transaction_type: TransactionType,
    /// The day the money moved.
    pub occurred_on: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Input for recording a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
    pub transaction_type: TransactionType,
    pub occurred_on: NaiveDate,
}

impl NewTransaction {
    /// Check the amount and category, normalising the category spelling.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a non-positive amount or unknown category.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.amount = validation::ensure_positive("amount", self.amount)?;
        self.category = validation::choice(&TRANSACTION_CATEGORIES, &self.category)?.to_owned();
        self.description = validation::optional_text("description", self.description.as_deref())?;
        Ok(self)
    }
}

/// Optional filters for the transaction list. Date bounds are inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
}

/// Income and expense totals over some range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Money,
    pub expenses: Money,
}

impl Totals {
    /// Income minus expenses.
    #[must_use]
    pub fn balance(&self) -> Money {
        self.income - self.expenses
    }
}

/// Total spent in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
}

/// One bar of the expense breakdown.
#[derive(Debug, Clone)]
pub struct BreakdownRow {
    pub category: String,
    pub total: Money,
    /// Share of all expenses in range, to one decimal place.
    pub percent: Decimal,
}

impl BreakdownRow {
    /// Build breakdown rows from per-category totals, largest first.
    #[must_use]
    pub fn from_totals(mut totals: Vec<CategoryTotal>) -> Vec<Self> {
        totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
        let all: Money = totals.iter().map(|t| t.total).sum();
        totals
            .into_iter()
            .map(|t| Self {
                percent: t.total.percent_of(all),
                category: t.category,
                total: t.total,
            })
            .collect()
    }
}

/// A monthly spending limit for one category.
#[derive(Debug, Clone)]
pub struct Budget {
    pub id: BudgetId,
    pub category: String,
    pub amount: Money,
    pub period: YearMonth,
}

/// Input for setting a budget. Setting the same category and month again
/// replaces the amount.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category: String,
    pub amount: Money,
    pub period: YearMonth,
}

impl NewBudget {
    /// Check the category and that the amount is not negative and fits in
    /// whole cents.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an out-of-range amount or unknown category.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if self.amount.is_negative() || self.amount.cents().is_err() {
            return Err(ValidationError::InvalidAmount("budget amount"));
        }
        self.category = validation::choice(&BUDGET_CATEGORIES, &self.category)?.to_owned();
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction_normalises_category() {
        let tx = NewTransaction {
            amount: Money::from_cents(1250),
            category: "dining out".to_owned(),
            description: Some("  ".to_owned()),
            transaction_type: TransactionType::Expense,
            occurred_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
        .validated()
        .unwrap();
        assert_eq!(tx.category, "Dining Out");
        assert_eq!(tx.description, None);
    }

    #[test]
    fn test_new_transaction_rejects_zero_amount() {
        let err = NewTransaction {
            amount: Money::ZERO,
            category: "Groceries".to_owned(),
            description: None,
            transaction_type: TransactionType::Expense,
            occurred_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.code(), "invalid_amount");
    }

    #[test]
    fn test_budget_rejects_income_category() {
        let err = NewBudget {
            category: "Income".to_owned(),
            amount: Money::from_cents(100),
            period: YearMonth::new(2026, 3).unwrap(),
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.code(), "invalid_choice");
    }

    #[test]
    fn test_budget_rejects_amount_beyond_cents_range() {
        let err = NewBudget {
            category: "Groceries".to_owned(),
            amount: Money::parse("1000000000000000000000000000").unwrap(),
            period: YearMonth::new(2026, 3).unwrap(),
        }
        .validated()
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidAmount("budget amount"));
    }

    #[test]
    fn test_breakdown_percentages() {
        let rows = BreakdownRow::from_totals(vec![
            CategoryTotal {
                category: "Utilities".to_owned(),
                total: Money::from_cents(2_500),
            },
            CategoryTotal {
                category: "Groceries".to_owned(),
                total: Money::from_cents(7_500),
            },
        ]);
        assert_eq!(rows[0].category, "Groceries");
        assert_eq!(rows[0].percent, Decimal::from(75));
        assert_eq!(rows[1].percent, Decimal::from(25));
    }

    #[test]
    fn test_totals_balance_can_go_negative() {
        let totals = Totals {
            income: Money::from_cents(1_000),
            expenses: Money::from_cents(4_000),
        };
        assert_eq!(totals.balance(), Money::from_cents(-3_000));
    }
}
