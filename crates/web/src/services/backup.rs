//! JSON backup: export, import and deleting all of a family's data.
//!
//! A backup holds everything one account owns. Importing adds the records to
//! the current account inside a single database transaction; any invalid
//! record or failed insert rolls the whole import back. Budgets are keyed by
//! category and month, so importing a budget that already exists replaces
//! its amount.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use family_planner_core::{GoalStatus, Money, TransactionType, UserId, YearMonth};

use crate::db::{
    self, BudgetRepository, EventRepository, FamilyRepository, GoalRepository, Pool,
    RepositoryError, ShoppingRepository, TransactionRepository, UserRepository,
};
use crate::models::event::{Event, EventInput};
use crate::models::family::{FamilyMember, MemberInput};
use crate::models::finance::{Budget, NewBudget, NewTransaction, Transaction};
use crate::models::goal::{Goal, Milestone, NewGoal, NewMilestone};
use crate::models::shopping::{NewShoppingItem, ShoppingItem, ShoppingList};
use crate::models::validation::{self, ValidationError};

/// Version written into new backups. Older versions are read as long as
/// their fields still parse.
pub const FORMAT_VERSION: u32 = 1;

/// Text the user must type to confirm deleting all data.
pub const DELETE_CONFIRMATION: &str = "DELETE";

/// Errors that can occur while exporting, importing or deleting data.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The uploaded file is not a backup document.
    #[error("invalid file format: {0}")]
    InvalidFormat(#[source] serde_json::Error),

    /// The backup was written by a newer version.
    #[error("unsupported backup format version {0}")]
    UnsupportedVersion(u32),

    /// A record in the backup failed validation.
    #[error("{section} #{index}: {source}")]
    InvalidRecord {
        section: &'static str,
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// The delete confirmation text did not match.
    #[error("confirmation text must be {DELETE_CONFIRMATION}")]
    ConfirmationMismatch,

    /// The backup could not be serialized.
    #[error("failed to encode backup: {0}")]
    Encode(#[source] serde_json::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl BackupError {
    /// Short code carried in `?error=` on the settings page.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidFormat(_) | Self::UnsupportedVersion(_) => Some("invalid_file"),
            Self::InvalidRecord { .. } => Some("invalid_record"),
            Self::ConfirmationMismatch => Some("confirm_delete"),
            Self::Encode(_) | Self::Repository(_) => None,
        }
    }
}

impl From<sqlx::Error> for BackupError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

// =============================================================================
// Document
// =============================================================================

/// A complete backup of one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub format_version: u32,
    pub exported_at: NaiveDateTime,
    #[serde(default)]
    pub profile: Option<ProfileRecord>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub budgets: Vec<BudgetRecord>,
    #[serde(default)]
    pub family_members: Vec<MemberRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub goals: Vec<GoalRecord>,
    #[serde(default)]
    pub shopping_lists: Vec<ShoppingListRecord>,
}

/// Informational only; imports always go to the signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: Money,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub transaction_type: TransactionType,
    #[serde(alias = "date")]
    pub occurred_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub category: String,
    pub amount: Money,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub name: String,
    pub relationship: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    #[serde(default = "default_event_category")]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_at: NaiveDateTime,
    #[serde(default)]
    pub end_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reminder: bool,
    #[serde(default)]
    pub reminder_at: Option<NaiveDateTime>,
}

fn default_event_category() -> String {
    "Other".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub target_amount: Option<Money>,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub milestones: Vec<MilestoneRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub title: String,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListRecord {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ShoppingItemRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingItemRecord {
    #[serde(alias = "name")]
    pub item_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub completed: bool,
}

const fn default_quantity() -> u32 {
    1
}

impl From<&Transaction> for TransactionRecord {
    fn from(t: &Transaction) -> Self {
        Self {
            amount: t.amount,
            category: t.category.clone(),
            description: t.description.clone(),
            transaction_type: t.transaction_type,
            occurred_on: t.occurred_on,
        }
    }
}

impl From<&Budget> for BudgetRecord {
    fn from(b: &Budget) -> Self {
        Self {
            category: b.category.clone(),
            amount: b.amount,
            month: b.period.month(),
            year: b.period.year(),
        }
    }
}

impl From<&FamilyMember> for MemberRecord {
    fn from(m: &FamilyMember) -> Self {
        Self {
            name: m.name.clone(),
            relationship: m.relationship.clone(),
            birth_date: m.birth_date,
        }
    }
}

impl From<&Event> for EventRecord {
    fn from(e: &Event) -> Self {
        Self {
            title: e.title.clone(),
            category: e.category.clone(),
            description: e.description.clone(),
            start_at: e.start_at,
            end_at: e.end_at,
            reminder: e.reminder,
            reminder_at: e.reminder_at,
        }
    }
}

impl GoalRecord {
    fn new(goal: &Goal, milestones: &[Milestone]) -> Self {
        Self {
            title: goal.title.clone(),
            category: goal.category.clone(),
            description: goal.description.clone(),
            target_date: goal.target_date,
            target_amount: goal.target_amount,
            status: goal.status,
            progress: goal.progress,
            milestones: milestones
                .iter()
                .map(|m| MilestoneRecord {
                    title: m.title.clone(),
                    target_date: m.target_date,
                    completed: m.completed,
                })
                .collect(),
        }
    }
}

impl ShoppingListRecord {
    fn new(list: &ShoppingList, items: &[ShoppingItem]) -> Self {
        Self {
            name: list.name.clone(),
            items: items
                .iter()
                .map(|i| ShoppingItemRecord {
                    item_name: i.item_name.clone(),
                    quantity: i.quantity,
                    completed: i.completed,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Export
// =============================================================================

/// Download name for a backup taken at `now`.
#[must_use]
pub fn export_filename(now: NaiveDateTime) -> String {
    format!("family_planner_data_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Collect everything the account owns.
///
/// # Errors
///
/// Returns `BackupError::Repository` if a query fails or the user is gone.
pub async fn export(
    pool: &Pool,
    user_id: UserId,
    now: NaiveDateTime,
) -> Result<Backup, BackupError> {
    let user = UserRepository::new(pool)
        .get_by_id(user_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let transactions = TransactionRepository::new(pool).list_all(user_id).await?;
    let budgets = BudgetRepository::new(pool).list_all(user_id).await?;
    let members = FamilyRepository::new(pool).list(user_id).await?;
    let events = EventRepository::new(pool).list_all(user_id).await?;
    let goals = GoalRepository::new(pool)
        .list_all_with_milestones(user_id)
        .await?;
    let lists = ShoppingRepository::new(pool)
        .list_all_with_items(user_id)
        .await?;

    Ok(Backup {
        format_version: FORMAT_VERSION,
        exported_at: now,
        profile: Some(ProfileRecord {
            username: user.username.to_string(),
            email: user.email.to_string(),
            created_at: user.created_at,
        }),
        transactions: transactions.iter().map(TransactionRecord::from).collect(),
        budgets: budgets.iter().map(BudgetRecord::from).collect(),
        family_members: members.iter().map(MemberRecord::from).collect(),
        events: events.iter().map(EventRecord::from).collect(),
        goals: goals
            .iter()
            .map(|(goal, milestones)| GoalRecord::new(goal, milestones))
            .collect(),
        shopping_lists: lists
            .iter()
            .map(|(list, items)| ShoppingListRecord::new(list, items))
            .collect(),
    })
}

/// Pretty-printed JSON for a backup.
///
/// # Errors
///
/// Returns `BackupError::Encode` if serialization fails.
pub fn to_json(backup: &Backup) -> Result<Vec<u8>, BackupError> {
    serde_json::to_vec_pretty(backup).map_err(BackupError::Encode)
}

// =============================================================================
// Import
// =============================================================================

/// Parse an uploaded backup file.
///
/// # Errors
///
/// Returns `BackupError::InvalidFormat` if the bytes are not a backup, or
/// `UnsupportedVersion` if it comes from a newer format.
pub fn parse(bytes: &[u8]) -> Result<Backup, BackupError> {
    let backup: Backup = serde_json::from_slice(bytes).map_err(BackupError::InvalidFormat)?;
    if backup.format_version > FORMAT_VERSION {
        return Err(BackupError::UnsupportedVersion(backup.format_version));
    }
    Ok(backup)
}

/// What an import added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub transactions: usize,
    pub budgets: usize,
    pub family_members: usize,
    pub events: usize,
    pub goals: usize,
    pub milestones: usize,
    pub shopping_lists: usize,
    pub shopping_items: usize,
}

impl ImportSummary {
    /// Total records written.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.transactions
            + self.budgets
            + self.family_members
            + self.events
            + self.goals
            + self.milestones
            + self.shopping_lists
            + self.shopping_items
    }
}

/// Every record of a backup, validated and ready to insert.
struct ValidatedBackup {
    transactions: Vec<NewTransaction>,
    budgets: Vec<NewBudget>,
    members: Vec<MemberInput>,
    events: Vec<EventInput>,
    goals: Vec<(NewGoal, Vec<NewMilestone>)>,
    lists: Vec<(String, Vec<NewShoppingItem>)>,
}

fn invalid(section: &'static str, index: usize) -> impl FnOnce(ValidationError) -> BackupError {
    move |source| BackupError::InvalidRecord {
        section,
        index: index + 1,
        source,
    }
}

fn validate(backup: Backup) -> Result<ValidatedBackup, BackupError> {
    let transactions = backup
        .transactions
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            NewTransaction {
                amount: r.amount,
                category: r.category,
                description: r.description,
                transaction_type: r.transaction_type,
                occurred_on: r.occurred_on,
            }
            .validated()
            .map_err(invalid("transaction", i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let budgets = backup
        .budgets
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let period =
                YearMonth::new(r.year, r.month).map_err(|_| BackupError::InvalidRecord {
                    section: "budget",
                    index: i + 1,
                    source: ValidationError::OutOfRange {
                        field: "month",
                        min: 1,
                        max: 12,
                    },
                })?;
            NewBudget {
                category: r.category,
                amount: r.amount,
                period,
            }
            .validated()
            .map_err(invalid("budget", i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let members = backup
        .family_members
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            MemberInput {
                name: r.name,
                relationship: r.relationship,
                birth_date: r.birth_date,
            }
            .validated()
            .map_err(invalid("family member", i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let events = backup
        .events
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            EventInput {
                title: r.title,
                category: r.category,
                description: r.description,
                start_at: r.start_at,
                end_at: r.end_at,
                reminder: r.reminder,
                reminder_at: r.reminder_at,
            }
            .validated()
            .map_err(invalid("event", i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let goals = backup
        .goals
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let goal = NewGoal {
                title: r.title,
                category: r.category,
                description: r.description,
                target_date: r.target_date,
                target_amount: r.target_amount,
                status: r.status,
                progress: r.progress,
            }
            .validated()
            .map_err(invalid("goal", i))?;
            let milestones = r
                .milestones
                .into_iter()
                .map(|m| {
                    NewMilestone {
                        title: m.title,
                        target_date: m.target_date,
                        completed: m.completed,
                    }
                    .validated()
                    .map_err(invalid("goal", i))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((goal, milestones))
        })
        .collect::<Result<Vec<_>, BackupError>>()?;

    let lists = backup
        .shopping_lists
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let name =
                validation::required_text("list name", &r.name).map_err(invalid("shopping list", i))?;
            let items = r
                .items
                .into_iter()
                .map(|item| {
                    NewShoppingItem {
                        item_name: item.item_name,
                        quantity: item.quantity,
                        completed: item.completed,
                    }
                    .validated()
                    .map_err(invalid("shopping list", i))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((name, items))
        })
        .collect::<Result<Vec<_>, BackupError>>()?;

    Ok(ValidatedBackup {
        transactions,
        budgets,
        members,
        events,
        goals,
        lists,
    })
}

/// Add every record of `backup` to the account.
///
/// # Errors
///
/// Returns `BackupError::InvalidRecord` if any record fails validation, or
/// `BackupError::Repository` if an insert fails. Nothing is written in
/// either case.
pub async fn import(
    pool: &Pool,
    user_id: UserId,
    backup: Backup,
) -> Result<ImportSummary, BackupError> {
    let data = validate(backup)?;
    let mut summary = ImportSummary::default();
    let mut tx = pool.begin().await?;

    for input in &data.transactions {
        db::transactions::insert(&mut *tx, user_id, input).await?;
        summary.transactions += 1;
    }
    for input in &data.budgets {
        db::budgets::upsert(&mut *tx, user_id, input).await?;
        summary.budgets += 1;
    }
    for input in &data.members {
        db::family::insert(&mut *tx, user_id, input).await?;
        summary.family_members += 1;
    }
    for input in &data.events {
        db::events::insert(&mut *tx, user_id, input).await?;
        summary.events += 1;
    }
    for (goal, milestones) in &data.goals {
        let goal = db::goals::insert(&mut *tx, user_id, goal).await?;
        summary.goals += 1;
        for milestone in milestones {
            db::goals::insert_milestone(&mut *tx, goal.id, milestone).await?;
            summary.milestones += 1;
        }
    }
    for (name, items) in &data.lists {
        let list = db::shopping::insert_list(&mut *tx, user_id, name).await?;
        summary.shopping_lists += 1;
        for item in items {
            db::shopping::insert_item(&mut *tx, list.id, item).await?;
            summary.shopping_items += 1;
        }
    }

    tx.commit().await?;

    info!(
        user_id = %user_id,
        records = summary.total(),
        transactions = summary.transactions,
        budgets = summary.budgets,
        goals = summary.goals,
        events = summary.events,
        "Backup imported"
    );
    Ok(summary)
}

// =============================================================================
// Delete all
// =============================================================================

/// Tables holding a `user_id`, in delete order. Items and milestones go with
/// their lists and goals.
const OWNED_TABLES: [&str; 6] = [
    "transactions",
    "budgets",
    "family_members",
    "events",
    "goals",
    "shopping_lists",
];

/// Remove every row the account owns, keeping the account itself.
///
/// `confirmation` must be exactly [`DELETE_CONFIRMATION`].
///
/// # Errors
///
/// Returns `BackupError::ConfirmationMismatch` if the confirmation is wrong,
/// or `BackupError::Repository` if a delete fails (nothing is removed then).
pub async fn delete_all(
    pool: &Pool,
    user_id: UserId,
    confirmation: &str,
) -> Result<u64, BackupError> {
    if confirmation.trim() != DELETE_CONFIRMATION {
        return Err(BackupError::ConfirmationMismatch);
    }

    let mut tx = pool.begin().await?;
    let mut removed = 0;
    for table in OWNED_TABLES {
        removed += sqlx::query(&format!("DELETE FROM {table} WHERE user_id = ?"))
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;

    info!(user_id = %user_id, rows = removed, "All user data deleted");
    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        assert_eq!(export_filename(now), "family_planner_data_20260314_090507.json");
    }

    #[test]
    fn test_parse_rejects_non_backup() {
        assert!(matches!(parse(b"not json"), Err(BackupError::InvalidFormat(_))));
        assert!(matches!(parse(b"[1, 2, 3]"), Err(BackupError::InvalidFormat(_))));
        let err = parse(b"{}").unwrap_err();
        assert_eq!(err.code(), Some("invalid_file"));
    }

    #[test]
    fn test_parse_rejects_newer_version() {
        let json = br#"{"format_version": 99, "exported_at": "2026-03-14T09:00:00"}"#;
        assert!(matches!(parse(json), Err(BackupError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_parse_minimal_document_with_defaults() {
        let json = br#"{
            "format_version": 1,
            "exported_at": "2026-03-14T09:00:00",
            "transactions": [
                {"amount": 12.5, "category": "Groceries", "transaction_type": "expense", "date": "2026-03-01"}
            ],
            "shopping_lists": [{"name": "Weekly", "items": [{"name": "Milk"}]}]
        }"#;
        let backup = parse(json).unwrap();
        assert!(backup.profile.is_none());
        assert_eq!(backup.transactions[0].amount, Money::from_cents(1250));
        let item = &backup.shopping_lists[0].items[0];
        assert_eq!(item.item_name, "Milk");
        assert_eq!(item.quantity, 1);
        assert!(!item.completed);
    }

    #[test]
    fn test_validate_reports_record_position() {
        let json = br#"{
            "format_version": 1,
            "exported_at": "2026-03-14T09:00:00",
            "family_members": [
                {"name": "Ann", "relationship": "Parent"},
                {"name": "Bo", "relationship": "Neighbour"}
            ]
        }"#;
        let err = validate(parse(json).unwrap()).err().unwrap();
        assert_eq!(
            err.to_string(),
            "family member #2: 'Neighbour' is not a valid relationship"
        );
        assert_eq!(err.code(), Some("invalid_record"));
    }
}
