//! Shared helpers for integration tests
//!
//! Builds clients against a wiremock server and mounts the common auth and
//! resume responses.
#![allow(dead_code)]

use cvforge::client::ApiClient;
use cvforge::session::{Account, Identity, SessionState};
use cvforge::shared::config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Debounce used by preview tests; short enough to keep the suite fast.
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(50);

pub async fn test_server() -> MockServer {
    MockServer::start().await
}

pub fn test_config(server: &MockServer) -> AppConfig {
    test_config_with_timeout(server, Duration::from_secs(5))
}

pub fn test_config_with_timeout(server: &MockServer, timeout: Duration) -> AppConfig {
    AppConfig::builder()
        .api_base(format!("{}/api", server.uri()))
        .request_timeout(timeout)
        .preview_debounce(TEST_DEBOUNCE)
        .build()
        .expect("valid test config")
}

pub fn test_client(server: &MockServer) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(&test_config(server)).expect("client builds"))
}

pub fn test_client_with_timeout(server: &MockServer, timeout: Duration) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(&test_config_with_timeout(server, timeout)).expect("client builds"))
}

pub fn user_json(id: i64, email: &str, is_guest: bool, is_verified: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "email": email,
        "is_guest": is_guest,
        "is_verified": is_verified,
    })
}

/// Mount `GET /auth/me` returning the given user.
pub async fn mount_me(server: &MockServer, user: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user))
        .mount(server)
        .await;
}

/// Mount `POST /auth/guest` that also seeds the CSRF cookie.
pub async fn mount_guest_with_csrf(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/guest"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", format!("csrf_token={}; Path=/", token).as_str())
                .set_body_json(serde_json::json!({})),
        )
        .mount(server)
        .await;
}

/// A watch channel carrying a fixed session state, for store tests that do
/// not need a full session manager.
pub fn session_channel(
    state: SessionState,
) -> (
    tokio::sync::watch::Sender<SessionState>,
    tokio::sync::watch::Receiver<SessionState>,
) {
    tokio::sync::watch::channel(state)
}

pub fn verified_state(id: i64, email: &str) -> SessionState {
    SessionState {
        identity: Identity::Verified(Account {
            id,
            email: email.to_string(),
        }),
        loading: false,
    }
}

pub fn anonymous_state() -> SessionState {
    SessionState {
        identity: Identity::Anonymous,
        loading: false,
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
