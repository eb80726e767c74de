// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Configuration for the campus session client.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "campus-session")]
pub struct ClientConfig {
    /// Base URL of the campus REST API.
    #[arg(long, default_value = "http://127.0.0.1:4000/api", env = "CAMPUS_API_URL")]
    pub api_url: String,

    /// Path of the persisted session file. Defaults to the state directory.
    #[arg(long, env = "CAMPUS_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Seconds before token expiry at which a renewal is scheduled.
    #[arg(long, default_value_t = 300, env = "CAMPUS_REFRESH_BUFFER_SECS")]
    pub refresh_buffer_secs: u64,

    /// HTTP request timeout in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "CAMPUS_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    /// Lead time before expiry at which a proactive renewal fires.
    pub fn safety_buffer(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_buffer_secs)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    /// Resolved path of the persisted session file.
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(crate::persist::default_state_path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
