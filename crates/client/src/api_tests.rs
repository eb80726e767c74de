// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use super::*;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{addr}"), Duration::from_secs(5))
}

fn user_json() -> serde_json::Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "ada@campus.test",
        "role": "instructor",
        "profile": {"bio": "first programmer"}
    })
}

#[tokio::test]
async fn login_returns_token_and_user() {
    let body = serde_json::json!({"token": "tok-1", "user": user_json()}).to_string();
    let app = Router::new().route("/auth/login", post(move || async move { body }));
    let addr = serve(app).await;

    let payload = client(addr).login("ada@campus.test", "pw").await.expect("login");
    assert_eq!(payload.token, "tok-1");
    assert_eq!(payload.user.role, "instructor");
}

#[tokio::test]
async fn login_invalid_credentials_is_auth_denied() {
    let app = Router::new().route(
        "/auth/login",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid credentials") }),
    );
    let addr = serve(app).await;

    let err = client(addr).login("ada@campus.test", "wrong").await.expect_err("should fail");
    assert!(err.is_auth_denied(), "expected AuthDenied, got {err}");
}

#[tokio::test]
async fn server_error_is_transient() {
    let app = Router::new()
        .route("/auth/me", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
    let addr = serve(app).await;

    let err = client(addr).current_profile("tok").await.expect_err("should fail");
    assert!(matches!(err, ApiError::Transient(_)), "expected Transient, got {err}");
}

#[tokio::test]
async fn unreachable_host_is_transient() {
    // Nothing listens on port 1.
    let api = ApiClient::new("http://127.0.0.1:1", Duration::from_millis(500));
    let err = api.current_profile("tok").await.expect_err("should fail");
    assert!(matches!(err, ApiError::Transient(_)), "expected Transient, got {err}");
}

#[tokio::test]
async fn current_profile_unwraps_user_envelope_and_sends_bearer() {
    let seen_auth: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&seen_auth);
    let app = Router::new().route(
        "/auth/me",
        get(move |headers: axum::http::HeaderMap| {
            let seen = Arc::clone(&seen);
            async move {
                let auth = headers
                    .get(axum::http::header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                if let Ok(mut slot) = seen.lock() {
                    *slot = auth;
                }
                serde_json::json!({"user": user_json()}).to_string()
            }
        }),
    );
    let addr = serve(app).await;

    let user = client(addr).current_profile("tok-xyz").await.expect("profile");
    assert_eq!(user.email, "ada@campus.test");

    let auth = seen_auth.lock().expect("lock").clone();
    assert_eq!(auth.as_deref(), Some("Bearer tok-xyz"));
}

#[tokio::test]
async fn refresh_forbidden_is_auth_denied() {
    let app = Router::new()
        .route("/auth/refresh", post(|| async { (StatusCode::FORBIDDEN, "revoked") }));
    let addr = serve(app).await;

    let err = client(addr).refresh("stale").await.expect_err("should fail");
    assert!(err.is_auth_denied(), "expected AuthDenied, got {err}");
}

#[tokio::test]
async fn logout_succeeds_on_ok() {
    let app = Router::new().route("/auth/logout", post(|| async { StatusCode::OK }));
    let addr = serve(app).await;
    assert!(client(addr).logout("tok").await.is_ok());
}
