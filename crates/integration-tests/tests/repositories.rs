//! Repository tests against a migrated `SQLite` database.
//!
//! Run with: `cargo test -p family-planner-integration-tests --test repositories`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use chrono::NaiveDate;

use family_planner_core::{Money, TransactionType, YearMonth};
use family_planner_integration_tests::TestDb;
use family_planner_web::db::{
    BudgetRepository, EventRepository, FamilyRepository, GoalRepository, RepositoryError,
    ShoppingRepository, TransactionRepository,
};
use family_planner_web::models::event::EventInput;
use family_planner_web::models::family::MemberInput;
use family_planner_web::models::finance::{NewBudget, NewTransaction, TransactionFilter};
use family_planner_web::models::goal::{NewGoal, NewMilestone};
use family_planner_web::models::shopping::NewShoppingItem;

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn expense(cents: i64, category: &str, occurred_on: NaiveDate) -> NewTransaction {
    NewTransaction {
        amount: Money::from_cents(cents),
        category: category.to_owned(),
        description: None,
        transaction_type: TransactionType::Expense,
        occurred_on,
    }
}

fn income(cents: i64, occurred_on: NaiveDate) -> NewTransaction {
    NewTransaction {
        amount: Money::from_cents(cents),
        category: "Income".to_owned(),
        description: Some("Salary".to_owned()),
        transaction_type: TransactionType::Income,
        occurred_on,
    }
}

#[tokio::test]
async fn test_transaction_totals_and_filters() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let repo = TransactionRepository::new(&db.pool);

    repo.create(user, &income(300_000, day(2026, 3, 1))).await.unwrap();
    repo.create(user, &expense(4_550, "Groceries", day(2026, 3, 3))).await.unwrap();
    repo.create(user, &expense(12_000, "Utilities", day(2026, 3, 31))).await.unwrap();
    repo.create(user, &expense(900, "Groceries", day(2026, 4, 1))).await.unwrap();

    let totals = repo
        .totals(user, Some(day(2026, 3, 1)), Some(day(2026, 3, 31)))
        .await
        .unwrap();
    assert_eq!(totals.income, Money::from_cents(300_000));
    assert_eq!(totals.expenses, Money::from_cents(16_550));
    assert_eq!(totals.balance(), Money::from_cents(283_450));

    let all = repo.totals(user, None, None).await.unwrap();
    assert_eq!(all.expenses, Money::from_cents(17_450));

    let expenses = repo
        .list(
            user,
            &TransactionFilter {
                transaction_type: Some(TransactionType::Expense),
                ..TransactionFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expenses.len(), 3);
    assert!(expenses.iter().all(|t| t.transaction_type == TransactionType::Expense));
    // Newest first.
    assert_eq!(expenses[0].occurred_on, day(2026, 4, 1));

    let recent = repo.recent(user, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
}

#[tokio::test]
async fn test_transactions_are_scoped_to_owner() {
    let db = TestDb::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;
    let repo = TransactionRepository::new(&db.pool);

    let created = repo
        .create(alice, &expense(2_000, "Dining Out", day(2026, 5, 9)))
        .await
        .unwrap();

    assert!(repo.list(bob, &TransactionFilter::default()).await.unwrap().is_empty());
    assert!(matches!(
        repo.delete(bob, created.id).await,
        Err(RepositoryError::NotFound)
    ));

    repo.delete(alice, created.id).await.unwrap();
    assert!(repo.list(alice, &TransactionFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_budget_upsert_replaces_amount() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let repo = BudgetRepository::new(&db.pool);
    let march = YearMonth::new(2026, 3).unwrap();

    let first = repo
        .upsert(
            user,
            &NewBudget {
                category: "Groceries".to_owned(),
                amount: Money::from_cents(40_000),
                period: march,
            },
        )
        .await
        .unwrap();
    let second = repo
        .upsert(
            user,
            &NewBudget {
                category: "Groceries".to_owned(),
                amount: Money::from_cents(55_000),
                period: march,
            },
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let budgets = repo.list_for_month(user, march).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].amount, Money::from_cents(55_000));

    repo.delete(user, "Groceries", march).await.unwrap();
    assert!(repo.list_for_month(user, march).await.unwrap().is_empty());
    assert!(matches!(
        repo.delete(user, "Groceries", march).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_budget_spending_counts_only_matching_expenses_in_month() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let other = db.create_user("bob").await;
    let budgets = BudgetRepository::new(&db.pool);
    let transactions = TransactionRepository::new(&db.pool);
    let march = YearMonth::new(2026, 3).unwrap();

    budgets
        .upsert(
            user,
            &NewBudget {
                category: "Groceries".to_owned(),
                amount: Money::from_cents(50_000),
                period: march,
            },
        )
        .await
        .unwrap();

    // Counted: first and last day of the month.
    transactions.create(user, &expense(10_000, "Groceries", day(2026, 3, 1))).await.unwrap();
    transactions.create(user, &expense(2_500, "Groceries", day(2026, 3, 31))).await.unwrap();
    // Not counted: other month, other category, income, other user.
    transactions.create(user, &expense(7_000, "Groceries", day(2026, 4, 1))).await.unwrap();
    transactions.create(user, &expense(7_000, "Groceries", day(2026, 2, 28))).await.unwrap();
    transactions.create(user, &expense(3_000, "Utilities", day(2026, 3, 15))).await.unwrap();
    transactions.create(user, &income(99_000, day(2026, 3, 15))).await.unwrap();
    transactions.create(other, &expense(8_000, "Groceries", day(2026, 3, 15))).await.unwrap();

    let spending = budgets.spending_for_month(user, march).await.unwrap();
    assert_eq!(spending.len(), 1);
    assert_eq!(spending[0].budget.category, "Groceries");
    assert_eq!(spending[0].spent, Money::from_cents(12_500));
}

#[tokio::test]
async fn test_deleting_shopping_list_removes_items() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let repo = ShoppingRepository::new(&db.pool);

    let list = repo.create_list(user, "Weekly shop").await.unwrap();
    let milk = repo
        .add_item(
            user,
            list.id,
            &NewShoppingItem {
                item_name: "Milk".to_owned(),
                quantity: 2,
                completed: false,
            },
        )
        .await
        .unwrap();
    repo.add_item(
        user,
        list.id,
        &NewShoppingItem {
            item_name: "Bread".to_owned(),
            quantity: 1,
            completed: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(repo.count_open_items(user).await.unwrap(), 2);
    assert!(repo.toggle_item(user, list.id, milk.id).await.unwrap());
    assert_eq!(repo.count_open_items(user).await.unwrap(), 1);
    assert!(!repo.toggle_item(user, list.id, milk.id).await.unwrap());

    let summaries = repo.list_summaries(user).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_items, 2);

    repo.delete_list(user, list.id).await.unwrap();
    assert!(repo.list_items(user, list.id).await.unwrap().is_empty());
    assert_eq!(repo.count_open_items(user).await.unwrap(), 0);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shopping_list_items")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_shopping_items_cannot_be_reached_through_another_account() {
    let db = TestDb::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;
    let repo = ShoppingRepository::new(&db.pool);

    let list = repo.create_list(alice, "Party").await.unwrap();
    let item = repo
        .add_item(
            alice,
            list.id,
            &NewShoppingItem {
                item_name: "Balloons".to_owned(),
                quantity: 10,
                completed: false,
            },
        )
        .await
        .unwrap();

    assert!(repo.get_list(bob, list.id).await.unwrap().is_none());
    assert!(repo.list_items(bob, list.id).await.unwrap().is_empty());
    assert!(matches!(
        repo.toggle_item(bob, list.id, item.id).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.delete_list(bob, list.id).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_goal_milestones_follow_their_goal() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let repo = GoalRepository::new(&db.pool);

    let goal = repo
        .create(
            user,
            &NewGoal::new(
                "Emergency fund".to_owned(),
                "Financial".to_owned(),
                None,
                day(2026, 12, 31),
                Some(Money::from_cents(500_000)),
            ),
        )
        .await
        .unwrap();
    assert_eq!(repo.count_active(user).await.unwrap(), 1);

    let later = repo
        .add_milestone(
            user,
            goal.id,
            &NewMilestone {
                title: "Half way".to_owned(),
                target_date: day(2026, 9, 1),
                completed: false,
            },
        )
        .await
        .unwrap();
    repo.add_milestone(
        user,
        goal.id,
        &NewMilestone {
            title: "First month saved".to_owned(),
            target_date: day(2026, 4, 1),
            completed: false,
        },
    )
    .await
    .unwrap();

    let milestones = repo.list_milestones(user, goal.id).await.unwrap();
    assert_eq!(milestones.len(), 2);
    assert_eq!(milestones[0].title, "First month saved");

    assert!(repo.toggle_milestone(user, goal.id, later.id).await.unwrap());

    repo.delete(user, goal.id).await.unwrap();
    assert!(repo.get(user, goal.id).await.unwrap().is_none());
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goal_milestones")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_family_members_are_scoped_to_owner() {
    let db = TestDb::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;
    let repo = FamilyRepository::new(&db.pool);

    let member = repo
        .create(
            alice,
            &MemberInput {
                name: "Sam".to_owned(),
                relationship: "Child".to_owned(),
                birth_date: Some(day(2015, 6, 20)),
            },
        )
        .await
        .unwrap();

    assert!(repo.get(bob, member.id).await.unwrap().is_none());
    assert!(repo.list(bob).await.unwrap().is_empty());
    assert!(matches!(
        repo.update(
            bob,
            member.id,
            &MemberInput {
                name: "Mallory".to_owned(),
                relationship: "Other".to_owned(),
                birth_date: None,
            },
        )
        .await,
        Err(RepositoryError::NotFound)
    ));

    let updated = repo
        .update(
            alice,
            member.id,
            &MemberInput {
                name: "Samantha".to_owned(),
                relationship: "Child".to_owned(),
                birth_date: Some(day(2015, 6, 20)),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Samantha");

    assert!(matches!(
        repo.delete(bob, member.id).await,
        Err(RepositoryError::NotFound)
    ));
    repo.delete(alice, member.id).await.unwrap();
    assert!(repo.list(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_events_between_days_is_inclusive() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let repo = EventRepository::new(&db.pool);

    let event = |title: &str, at: NaiveDate, hour: u32| EventInput {
        title: title.to_owned(),
        category: "Birthday".to_owned(),
        description: None,
        start_at: at.and_hms_opt(hour, 0, 0).unwrap(),
        end_at: None,
        reminder: false,
        reminder_at: None,
    };

    repo.create(user, &event("Before", day(2026, 3, 31), 23)).await.unwrap();
    repo.create(user, &event("Late on first", day(2026, 4, 1), 18)).await.unwrap();
    repo.create(user, &event("Early on first", day(2026, 4, 1), 8)).await.unwrap();
    repo.create(user, &event("Last evening", day(2026, 4, 30), 23)).await.unwrap();
    repo.create(user, &event("After", day(2026, 5, 1), 0)).await.unwrap();

    let april = repo
        .between_days(user, day(2026, 4, 1), day(2026, 4, 30))
        .await
        .unwrap();
    let titles: Vec<&str> = april.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Early on first", "Late on first", "Last evening"]);
}
