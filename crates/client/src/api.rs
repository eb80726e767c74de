// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the campus auth endpoints.
//!
//! Only the four session endpoints live here; course/lesson/question CRUD is
//! consumed elsewhere through the same base URL and is not the core's concern.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;
use crate::profile::Profile;

/// Token + user pair returned by login and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: Profile,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: Profile,
}

/// Thin reqwest wrapper over the remote auth API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(http) => http,
            Err(e) => {
                // Only reachable when the TLS backend fails to initialize.
                tracing::warn!("falling back to a default http client (no timeout): {e}");
                reqwest::Client::default()
            }
        };
        Self { http, base_url: base_url.trim_end_matches('/').to_owned() }
    }

    /// Exchange credentials for a token and profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        let resp = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(resp.json::<AuthPayload>().await?)
    }

    /// Trade a valid token for a renewed one.
    pub async fn refresh(&self, token: &str) -> Result<AuthPayload, ApiError> {
        let resp = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(resp.json::<AuthPayload>().await?)
    }

    /// Fetch the profile the token belongs to. Used only at initialization.
    pub async fn current_profile(&self, token: &str) -> Result<Profile, ApiError> {
        let resp = self
            .http
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(resp.json::<ProfileResponse>().await?.user)
    }

    /// Ask the server to invalidate the token. Callers treat this as
    /// best-effort; failures are logged, never surfaced.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(format!("{}/auth/logout", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

/// Classify a response: 401/403 is an explicit credential rejection, any
/// other non-success status is transient.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Err(ApiError::AuthDenied(format!("{status}: {body}")))
    } else {
        Err(ApiError::Transient(format!("{status}: {body}")))
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
