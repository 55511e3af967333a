//! End-to-end tests through a running server.
//!
//! Run with: `cargo test -p family-planner-integration-tests --test http`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart;

use family_planner_integration_tests::{TEST_PASSWORD, TestApp, location};
use family_planner_web::db::TransactionRepository;
use family_planner_web::models::finance::TransactionFilter;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_pages_require_login() {
    let app = TestApp::spawn().await;

    for path in ["/", "/finance", "/budget", "/shopping", "/family", "/calendar", "/goals", "/settings"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/auth/login", "{path}");
    }

    let response = app.get("/auth/login").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = TestApp::spawn().await;
    app.register_and_login("alice").await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("alice"));

    // Signed-in users are sent away from the login page.
    let response = app.get("/auth/login").await;
    assert_eq!(location(&response), "/");

    let response = app.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&response), "/auth/login?success=logged_out");

    let response = app.get("/").await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::spawn().await;
    let response = app.register("alice").await;
    assert_eq!(location(&response), "/auth/login?success=registered");

    let response = app.login("alice", "not-the-password").await;
    assert_eq!(location(&response), "/auth/login?error=credentials");

    let response = app.login("nobody", TEST_PASSWORD).await;
    assert_eq!(location(&response), "/auth/login?error=credentials");

    let response = app.get("/auth/login?error=credentials").await;
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid username or password."));
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app.register("alice").await;
    assert_eq!(location(&response), "/auth/register?error=exists");
}

#[tokio::test]
async fn test_add_transaction_and_view_finance_page() {
    let app = TestApp::spawn().await;
    let user = app.register_and_login("alice").await;

    let response = app
        .post_form(
            "/finance/transactions",
            &[
                ("transaction_type", "expense"),
                ("amount", "1234.50"),
                ("category", "groceries"),
                ("date", "2026-03-07"),
                ("description", "Farmers market"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/finance?success=transaction_added");

    let saved = TransactionRepository::new(&app.db.pool)
        .list(user, &TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].category, "Groceries");

    let response = app.get("/finance?success=transaction_added").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Transaction added."));
    assert!(body.contains("Farmers market"));
    assert!(body.contains("$1,234.50"));
}

#[tokio::test]
async fn test_invalid_transaction_redirects_with_error() {
    let app = TestApp::spawn().await;
    app.register_and_login("alice").await;

    let response = app
        .post_form(
            "/finance/transactions",
            &[
                ("transaction_type", "expense"),
                ("amount", "-5"),
                ("category", "Groceries"),
                ("date", "2026-03-07"),
            ],
        )
        .await;
    let target = location(&response);
    assert!(target.starts_with("/finance?error="), "{target}");
}

#[tokio::test]
async fn test_budget_page_shows_spending() {
    let app = TestApp::spawn().await;
    app.register_and_login("alice").await;

    let response = app
        .post_form(
            "/budget",
            &[
                ("category", "Groceries"),
                ("amount", "400"),
                ("month", "3"),
                ("year", "2026"),
            ],
        )
        .await;
    assert!(location(&response).contains("success=budget_saved"));

    app.post_form(
        "/finance/transactions",
        &[
            ("transaction_type", "expense"),
            ("amount", "100"),
            ("category", "Groceries"),
            ("date", "2026-03-10"),
        ],
    )
    .await;

    let response = app.get("/budget?month=3&year=2026").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Groceries"));
    assert!(body.contains("$400.00"));
    assert!(body.contains("$100.00"));
    assert!(body.contains("$300.00"));
}

#[tokio::test]
async fn test_export_import_and_delete_all() {
    let app = TestApp::spawn().await;
    let user = app.register_and_login("alice").await;

    app.post_form(
        "/finance/transactions",
        &[
            ("transaction_type", "income"),
            ("amount", "2500"),
            ("category", "Income"),
            ("date", "2026-03-01"),
        ],
    )
    .await;

    let response = app.get("/settings/export").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    let disposition = response.headers()[CONTENT_DISPOSITION].to_str().unwrap().to_owned();
    assert!(disposition.starts_with("attachment; filename=\"family_planner_data_"));
    assert!(disposition.ends_with(".json\""));
    let bytes = response.bytes().await.unwrap();
    let document: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(document["transactions"].as_array().unwrap().len(), 1);

    let form = multipart::Form::new().part(
        "backup",
        multipart::Part::bytes(bytes.to_vec()).file_name("backup.json"),
    );
    let response = app
        .client
        .post(app.url("/settings/import"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/settings?success=imported");

    let repo = TransactionRepository::new(&app.db.pool);
    assert_eq!(repo.list_all(user).await.unwrap().len(), 2);

    let form = multipart::Form::new().part(
        "backup",
        multipart::Part::bytes(b"{ not json".to_vec()).file_name("broken.json"),
    );
    let response = app
        .client
        .post(app.url("/settings/import"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert!(location(&response).starts_with("/settings?error="));

    let response = app.post_form("/settings/delete", &[("confirm", "yes")]).await;
    assert_eq!(location(&response), "/settings?error=confirm_delete");
    assert_eq!(repo.list_all(user).await.unwrap().len(), 2);

    let response = app.post_form("/settings/delete", &[("confirm", "DELETE")]).await;
    assert_eq!(location(&response), "/auth/login?success=data_deleted");
    assert!(repo.list_all(user).await.unwrap().is_empty());

    // Logged out, but the account still works.
    let response = app.get("/").await;
    assert_eq!(location(&response), "/auth/login");
    let response = app.login("alice", TEST_PASSWORD).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_other_users_rows_are_not_found() {
    let app = TestApp::spawn().await;
    let owner = app.db.create_user("owner").await;
    let list = family_planner_web::db::ShoppingRepository::new(&app.db.pool)
        .create_list(owner, "Private")
        .await
        .unwrap();
    app.register_and_login("intruder").await;

    let response = app.get(&format!("/shopping/{}", list.id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_headers_and_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/auth/login").await;
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));

    let response = app.get("/no-such-page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.text().await.unwrap();
    assert!(body.contains("Page not found"));
}
