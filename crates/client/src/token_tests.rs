// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::*;

fn forge_token(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{payload}.forged-signature")
}

#[test]
fn decodes_subject_and_expiry() {
    let token = forge_token(serde_json::json!({"sub": "student-7", "exp": 1_900_000_000u64}));
    let claims = decode(&token);
    assert_eq!(
        claims,
        Some(Claims { subject: Some("student-7".to_owned()), expires_at: 1_900_000_000 })
    );
}

#[test]
fn missing_exp_yields_none() {
    let token = forge_token(serde_json::json!({"sub": "student-7"}));
    assert_eq!(decode(&token), None);
}

#[test]
fn missing_sub_is_tolerated() {
    let token = forge_token(serde_json::json!({"exp": 1_900_000_000u64}));
    let claims = decode(&token);
    assert_eq!(claims, Some(Claims { subject: None, expires_at: 1_900_000_000 }));
}

#[test]
fn unknown_claims_are_ignored() {
    let token = forge_token(serde_json::json!({
        "sub": "u1",
        "exp": 42u64,
        "iss": "campus",
        "roles": ["instructor"]
    }));
    assert_eq!(decode(&token).map(|c| c.expires_at), Some(42));
}

#[test]
fn wrong_segment_counts_yield_none() {
    assert_eq!(decode(""), None);
    assert_eq!(decode("only-one-segment"), None);
    assert_eq!(decode("two.segments"), None);
    assert_eq!(decode("a.b.c.d"), None);
}

#[test]
fn invalid_base64_payload_yields_none() {
    assert_eq!(decode("head.!!not-base64!!.sig"), None);
}

#[test]
fn non_json_payload_yields_none() {
    let payload = URL_SAFE_NO_PAD.encode(b"hello world");
    assert_eq!(decode(&format!("head.{payload}.sig")), None);
}
