//! Service-level tests: dashboard, upcoming events, profile changes and the
//! goal board queries.
//!
//! Run with: `cargo test -p family-planner-integration-tests --test services`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use chrono::{NaiveDate, NaiveDateTime};

use family_planner_core::{GoalStatus, Money, TransactionType, UserId};
use family_planner_integration_tests::{TEST_PASSWORD, TestDb};
use family_planner_web::db::goals::GoalFilter;
use family_planner_web::db::{
    EventRepository, GoalRepository, Pool, ShoppingRepository, TransactionRepository,
};
use family_planner_web::models::event::EventInput;
use family_planner_web::models::finance::NewTransaction;
use family_planner_web::models::goal::{Goal, NewGoal};
use family_planner_web::models::shopping::NewShoppingItem;
use family_planner_web::services::auth::{AuthError, AuthService};
use family_planner_web::services::{calendar, dashboard};

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}

fn event(title: &str, start_at: NaiveDateTime) -> EventInput {
    EventInput {
        title: title.to_owned(),
        category: "Appointment".to_owned(),
        description: None,
        start_at,
        end_at: None,
        reminder: false,
        reminder_at: None,
    }
}

fn transaction(kind: TransactionType, cents: i64, occurred_on: NaiveDate) -> NewTransaction {
    NewTransaction {
        amount: Money::from_cents(cents),
        category: match kind {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Groceries",
        }
        .to_owned(),
        description: None,
        transaction_type: kind,
        occurred_on,
    }
}

fn goal(title: &str, category: &str, target_date: NaiveDate) -> NewGoal {
    NewGoal::new(title.to_owned(), category.to_owned(), None, target_date, None)
}

async fn add_goal(pool: &Pool, user: UserId, input: &NewGoal, status: GoalStatus) {
    let repo = GoalRepository::new(pool);
    let created = repo.create(user, input).await.unwrap();
    if status != GoalStatus::NotStarted {
        let mut update = input.clone();
        update.status = status;
        repo.update(user, created.id, &update).await.unwrap();
    }
}

#[tokio::test]
async fn test_dashboard_figures() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let other = db.create_user("bob").await;
    let now = at(day(2026, 3, 15), 9, 30);

    let transactions = TransactionRepository::new(&db.pool);
    transactions
        .create(user, &transaction(TransactionType::Income, 200_000, day(2026, 2, 1)))
        .await
        .unwrap();
    transactions
        .create(user, &transaction(TransactionType::Income, 300_000, day(2026, 3, 1)))
        .await
        .unwrap();
    for date in 2..=7 {
        transactions
            .create(user, &transaction(TransactionType::Expense, 1_000, day(2026, 3, date)))
            .await
            .unwrap();
    }
    transactions
        .create(other, &transaction(TransactionType::Expense, 99_900, day(2026, 3, 4)))
        .await
        .unwrap();

    let events = EventRepository::new(&db.pool);
    events.create(user, &event("Dentist", at(day(2026, 3, 17), 14, 0))).await.unwrap();
    events.create(user, &event("Last month", at(day(2026, 2, 17), 14, 0))).await.unwrap();

    add_goal(&db.pool, user, &goal("Run 5k", "Health", day(2026, 6, 1)), GoalStatus::InProgress).await;
    add_goal(&db.pool, user, &goal("Read more", "Personal", day(2026, 5, 1)), GoalStatus::Completed).await;

    let shopping = ShoppingRepository::new(&db.pool);
    let list = shopping.create_list(user, "Weekly").await.unwrap();
    for name in ["Milk", "Bread"] {
        shopping
            .add_item(
                user,
                list.id,
                &NewShoppingItem {
                    item_name: name.to_owned(),
                    quantity: 1,
                    completed: false,
                },
            )
            .await
            .unwrap();
    }
    let done = shopping
        .add_item(
            user,
            list.id,
            &NewShoppingItem {
                item_name: "Eggs".to_owned(),
                quantity: 12,
                completed: true,
            },
        )
        .await
        .unwrap();
    assert!(done.completed);

    let overview = dashboard::load(&db.pool, user, now).await.unwrap();

    assert_eq!(overview.all_time.income, Money::from_cents(500_000));
    assert_eq!(overview.all_time.expenses, Money::from_cents(6_000));
    assert_eq!(overview.this_month.income, Money::from_cents(300_000));
    assert_eq!(overview.this_month.expenses, Money::from_cents(6_000));
    assert_eq!(overview.month.first_day(), day(2026, 3, 1));

    // Newest five, newest first.
    let recent: Vec<NaiveDate> = overview
        .recent_transactions
        .iter()
        .map(|t| t.occurred_on)
        .collect();
    assert_eq!(
        recent,
        [day(2026, 3, 7), day(2026, 3, 6), day(2026, 3, 5), day(2026, 3, 4), day(2026, 3, 3)]
    );

    let upcoming: Vec<&str> = overview.upcoming_events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(upcoming, ["Dentist"]);
    assert_eq!(overview.active_goals, 1);
    assert_eq!(overview.open_shopping_items, 2);
}

#[tokio::test]
async fn test_dashboard_for_new_account_is_empty() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;

    let overview = dashboard::load(&db.pool, user, at(day(2026, 3, 15), 9, 0))
        .await
        .unwrap();
    assert!(overview.all_time.income.is_zero());
    assert!(overview.all_time.expenses.is_zero());
    assert!(overview.recent_transactions.is_empty());
    assert!(overview.upcoming_events.is_empty());
    assert_eq!(overview.active_goals, 0);
    assert_eq!(overview.open_shopping_items, 0);
}

#[tokio::test]
async fn test_upcoming_covers_the_next_seven_days() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let other = db.create_user("bob").await;
    let repo = EventRepository::new(&db.pool);
    let now = at(day(2026, 4, 10), 12, 0);

    repo.create(user, &event("Earlier today", at(day(2026, 4, 10), 11, 59))).await.unwrap();
    repo.create(user, &event("Right now", now)).await.unwrap();
    repo.create(user, &event("Tomorrow", at(day(2026, 4, 11), 8, 0))).await.unwrap();
    repo.create(user, &event("Edge of window", at(day(2026, 4, 17), 11, 59))).await.unwrap();
    repo.create(user, &event("A week out", at(day(2026, 4, 17), 12, 0))).await.unwrap();
    repo.create(other, &event("Someone else's", at(day(2026, 4, 12), 9, 0))).await.unwrap();

    let upcoming = calendar::upcoming(&db.pool, user, now).await.unwrap();
    let titles: Vec<&str> = upcoming.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Right now", "Tomorrow", "Edge of window"]);
}

#[tokio::test]
async fn test_update_profile_changes_email_and_password() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let auth = AuthService::new(&db.pool);
    let new_password = "a-much-longer-passphrase";

    let changes = auth
        .update_profile(
            user,
            Some("alice.new@example.com"),
            Some((new_password, new_password)),
        )
        .await
        .unwrap();
    assert!(changes.email);
    assert!(changes.password);

    let account = auth.get_user(user).await.unwrap();
    assert_eq!(account.email.as_str(), "alice.new@example.com");
    assert!(matches!(
        auth.login("alice", TEST_PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert_eq!(auth.login("alice", new_password).await.unwrap().id, user);

    // Blank fields and an unchanged email are no-ops.
    let changes = auth
        .update_profile(user, Some("alice.new@example.com"), Some(("", "")))
        .await
        .unwrap();
    assert!(!changes.email);
    assert!(!changes.password);
    let changes = auth.update_profile(user, Some("  "), None).await.unwrap();
    assert!(!changes.email);
}

#[tokio::test]
async fn test_update_profile_rejections_leave_account_unchanged() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    db.create_user("bob").await;
    let auth = AuthService::new(&db.pool);

    assert!(matches!(
        auth.update_profile(user, Some("bob@example.com"), None).await,
        Err(AuthError::UserAlreadyExists)
    ));
    assert!(matches!(
        auth.update_profile(user, Some("not-an-email"), None).await,
        Err(AuthError::InvalidEmail(_))
    ));
    assert!(matches!(
        auth.update_profile(user, None, Some(("long-enough-one", "long-enough-two")))
            .await,
        Err(AuthError::PasswordMismatch)
    ));
    assert!(matches!(
        auth.update_profile(user, None, Some(("short", "short"))).await,
        Err(AuthError::WeakPassword(_))
    ));

    // A bad password also blocks a valid email change in the same request.
    assert!(matches!(
        auth.update_profile(user, Some("alice.other@example.com"), Some(("short", "short")))
            .await,
        Err(AuthError::WeakPassword(_))
    ));

    let account = auth.get_user(user).await.unwrap();
    assert_eq!(account.email.as_str(), "alice@example.com");
    assert_eq!(auth.login("alice", TEST_PASSWORD).await.unwrap().id, user);
}

#[tokio::test]
async fn test_goal_list_filters_and_counts() {
    let db = TestDb::new().await;
    let user = db.create_user("alice").await;
    let other = db.create_user("bob").await;
    let pool = &db.pool;

    add_goal(pool, user, &goal("Run 5k", "Health", day(2026, 6, 1)), GoalStatus::InProgress).await;
    add_goal(pool, user, &goal("Sleep 8h", "Health", day(2026, 4, 1)), GoalStatus::NotStarted).await;
    add_goal(pool, user, &goal("Read 12 books", "Personal", day(2026, 12, 31)), GoalStatus::InProgress).await;
    add_goal(pool, user, &goal("Pay off card", "Financial", day(2026, 5, 1)), GoalStatus::Completed).await;
    add_goal(pool, other, &goal("Bob's goal", "Health", day(2026, 1, 1)), GoalStatus::InProgress).await;

    let repo = GoalRepository::new(pool);
    let titles = |goals: Vec<Goal>| {
        goals.into_iter().map(|g| g.title).collect::<Vec<_>>()
    };

    let all = repo.list(user, &GoalFilter::default()).await.unwrap();
    assert_eq!(titles(all), ["Sleep 8h", "Pay off card", "Run 5k", "Read 12 books"]);

    let health = repo
        .list(
            user,
            &GoalFilter {
                category: Some("Health".to_owned()),
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(titles(health), ["Sleep 8h", "Run 5k"]);

    let in_progress = repo
        .list(
            user,
            &GoalFilter {
                category: None,
                status: Some(GoalStatus::InProgress),
            },
        )
        .await
        .unwrap();
    assert_eq!(titles(in_progress), ["Run 5k", "Read 12 books"]);

    let both = repo
        .list(
            user,
            &GoalFilter {
                category: Some("Health".to_owned()),
                status: Some(GoalStatus::InProgress),
            },
        )
        .await
        .unwrap();
    assert_eq!(titles(both), ["Run 5k"]);

    assert_eq!(
        repo.count_by_category(user).await.unwrap(),
        [
            ("Financial".to_owned(), 1),
            ("Health".to_owned(), 2),
            ("Personal".to_owned(), 1),
        ]
    );
    assert_eq!(
        repo.count_by_status(user).await.unwrap(),
        [
            (GoalStatus::NotStarted, 1),
            (GoalStatus::InProgress, 2),
            (GoalStatus::Completed, 1),
            (GoalStatus::OnHold, 0),
        ]
    );
    assert_eq!(repo.count_active(user).await.unwrap(), 3);
}
