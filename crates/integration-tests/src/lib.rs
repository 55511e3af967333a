//! Integration tests for Family Planner.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p family-planner-integration-tests
//! ```
//!
//! No external services are needed. [`TestDb`] gives each test a migrated
//! `SQLite` file in a temporary directory and [`TestApp`] serves the complete
//! router on `127.0.0.1` with a cookie-holding HTTP client.
//!
//! # Test Categories
//!
//! - `repositories` - Data access, ownership scoping and cascades
//! - `backup` - Export, import and delete-all
//! - `http` - Pages, redirects and headers through a real server

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;

use reqwest::{Client, Response, redirect::Policy};
use secrecy::SecretString;
use tempfile::TempDir;

use family_planner_core::{UserId, Username};
use family_planner_web::app::build_router;
use family_planner_web::config::AppConfig;
use family_planner_web::db::{self, Pool, UserRepository};
use family_planner_web::middleware::{create_session_layer, create_session_store};
use family_planner_web::services::auth::{AuthService, Registration};
use family_planner_web::state::AppState;

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// A migrated database in a temporary directory, removed on drop.
pub struct TestDb {
    pub pool: Pool,
    pub url: String,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("planner.db").display());
        let pool = db::create_pool(&SecretString::from(url.clone()))
            .await
            .expect("Failed to create database pool");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Self {
            pool,
            url,
            _dir: dir,
        }
    }

    /// Register an account directly through the auth service.
    pub async fn create_user(&self, username: &str) -> UserId {
        let email = format!("{username}@example.com");
        AuthService::new(&self.pool)
            .register(Registration {
                username,
                email: &email,
                password: TEST_PASSWORD,
                password_confirm: TEST_PASSWORD,
            })
            .await
            .expect("Failed to register test user")
            .id
    }

    /// Look up an account id by username.
    pub async fn user_id(&self, username: &str) -> Option<UserId> {
        let username = Username::parse(username).expect("Invalid username");
        UserRepository::new(&self.pool)
            .get_by_username(&username)
            .await
            .expect("Failed to query users")
            .map(|user| user.id)
    }
}

/// The full application served on a random local port.
pub struct TestApp {
    pub address: SocketAddr,
    pub client: Client,
    pub db: TestDb,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db = TestDb::new().await;
        let config = AppConfig::for_database(&db.url);
        let store = create_session_store(&db.pool)
            .await
            .expect("Failed to create session store");
        let session_layer = create_session_layer(store, &config);
        let app = build_router(AppState::new(config, db.pool.clone()), session_layer);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = listener.local_addr().expect("Listener has no address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self {
            address,
            client: new_client(),
            db,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn register(&self, username: &str) -> Response {
        let email = format!("{username}@example.com");
        self.post_form(
            "/auth/register",
            &[
                ("username", username),
                ("email", email.as_str()),
                ("password", TEST_PASSWORD),
                ("password_confirm", TEST_PASSWORD),
            ],
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.post_form(
            "/auth/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// Register `username`, log in and return the account id.
    pub async fn register_and_login(&self, username: &str) -> UserId {
        let response = self.register(username).await;
        assert_eq!(location(&response), "/auth/login?success=registered");
        let response = self.login(username, TEST_PASSWORD).await;
        assert_eq!(location(&response), "/");
        self.db
            .user_id(username)
            .await
            .expect("Registered user not found")
    }
}

/// A client that keeps cookies and does not follow redirects.
pub fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect, or an empty string.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
