// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token codec: extracts scheduling claims from an opaque token.
//!
//! Signature verification is the server's job; this only reads the payload
//! segment so the client can decide when to renew.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Claims decoded from a bearer token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject identity (`sub`), when present.
    pub subject: Option<String>,
    /// Expiry as seconds since the Unix epoch (`exp`).
    pub expires_at: u64,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<u64>,
}

/// Decode the claims segment of a bearer token.
///
/// Never fails: anything that is not a three-segment token with a base64url
/// JSON payload carrying an `exp` claim yields `None`. A token without `exp`
/// is still usable for requests, it just cannot drive proactive renewal.
pub fn decode(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let raw: RawClaims = serde_json::from_slice(&bytes).ok()?;

    match raw.exp {
        Some(exp) => Some(Claims { subject: raw.sub, expires_at: exp }),
        None => {
            // Without an expiry claim there is nothing to schedule against.
            tracing::debug!("token payload carries no exp claim; proactive renewal unavailable");
            None
        }
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
