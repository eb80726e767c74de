// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn config() -> ClientConfig {
    ClientConfig {
        api_url: "http://localhost:4000/api".to_owned(),
        state_file: None,
        refresh_buffer_secs: 300,
        request_timeout_ms: 30_000,
    }
}

#[test]
fn safety_buffer_converts_seconds() {
    assert_eq!(config().safety_buffer(), std::time::Duration::from_secs(300));
}

#[test]
fn request_timeout_converts_millis() {
    assert_eq!(config().request_timeout(), std::time::Duration::from_secs(30));
}

#[test]
fn explicit_state_file_wins_over_default() {
    let mut c = config();
    c.state_file = Some(PathBuf::from("/tmp/custom-session.json"));
    assert_eq!(c.state_path(), PathBuf::from("/tmp/custom-session.json"));
}

#[test]
fn default_state_path_is_used_when_unset() {
    assert!(config().state_path().ends_with("session.json"));
}
