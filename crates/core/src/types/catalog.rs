//! Fixed choice lists offered by the planner's forms.
//!
//! Categories are stored as plain text so that renaming an entry here does
//! not invalidate existing rows. Forms only accept values from these lists.

/// A named, ordered list of allowed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    name: &'static str,
    entries: &'static [&'static str],
}

impl Catalog {
    const fn new(name: &'static str, entries: &'static [&'static str]) -> Self {
        Self { name, entries }
    }

    /// Human-readable catalog name, used in validation messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The allowed values in display order.
    #[must_use]
    pub const fn entries(&self) -> &'static [&'static str] {
        self.entries
    }

    /// Returns `true` if `value` is one of the allowed entries.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains(&value)
    }

    /// Returns the canonical entry matching `value`, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn find(&self, value: &str) -> Option<&'static str> {
        let value = value.trim();
        self.entries
            .iter()
            .copied()
            .find(|entry| entry.eq_ignore_ascii_case(value))
    }
}

/// Spending categories a monthly budget can be set for.
pub const BUDGET_CATEGORIES: Catalog = Catalog::new(
    "budget category",
    &[
        "Groceries",
        "Utilities",
        "Rent/Mortgage",
        "Transportation",
        "Healthcare",
        "Entertainment",
        "Education",
        "Shopping",
        "Savings",
        "Investments",
        "Insurance",
        "Dining Out",
        "Travel",
        "Gifts",
        "Other",
    ],
);

/// Transaction categories: every budget category plus `Income`, so expense
/// transactions line up with budget rows.
pub const TRANSACTION_CATEGORIES: Catalog = Catalog::new(
    "transaction category",
    &[
        "Income",
        "Groceries",
        "Utilities",
        "Rent/Mortgage",
        "Transportation",
        "Healthcare",
        "Entertainment",
        "Education",
        "Shopping",
        "Savings",
        "Investments",
        "Insurance",
        "Dining Out",
        "Travel",
        "Gifts",
        "Other",
    ],
);

/// How a family member relates to the account holder.
pub const RELATIONSHIPS: Catalog = Catalog::new(
    "relationship",
    &[
        "Spouse/Partner",
        "Child",
        "Parent",
        "Sibling",
        "Grandparent",
        "Grandchild",
        "Uncle/Aunt",
        "Niece/Nephew",
        "Cousin",
        "Other",
    ],
);

/// Calendar event categories.
pub const EVENT_CATEGORIES: Catalog = Catalog::new(
    "event category",
    &[
        "Family Gathering",
        "Birthday",
        "Anniversary",
        "Doctor's Appointment",
        "School Event",
        "Sports/Activity",
        "Holiday",
        "Travel",
        "Bill Payment",
        "Shopping",
        "Other",
    ],
);

/// Goal categories.
pub const GOAL_CATEGORIES: Catalog = Catalog::new(
    "goal category",
    &[
        "Financial",
        "Education",
        "Health",
        "Family",
        "Career",
        "Home",
        "Travel",
        "Personal Development",
        "Other",
    ],
);

/// The goal category whose goals carry a target amount.
pub const FINANCIAL_GOAL_CATEGORY: &str = "Financial";
