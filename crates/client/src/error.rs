// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Failure classes for remote API calls.
///
/// The split matters: an explicit rejection of the credential is terminal for
/// the session, while anything else (unreachable host, 5xx) is transient and
/// may be degraded around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server explicitly rejected the credential (401/403).
    AuthDenied(String),
    /// Network failure or server-side error with no explicit rejection.
    Transient(String),
}

impl ApiError {
    pub fn is_auth_denied(&self) -> bool {
        matches!(self, Self::AuthDenied(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthDenied(msg) => write!(f, "auth denied: {msg}"),
            Self::Transient(msg) => write!(f, "transient: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        // Transport-level failures carry no verdict on the credential.
        Self::Transient(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
