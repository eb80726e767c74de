// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted session store: load/save/clear a JSON file with atomic writes.
//!
//! Holds the bearer token plus a cached copy of the user profile so the UI
//! can stay populated while a startup revalidation is in flight or has
//! transiently failed. The cache is never treated as a source of truth.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::profile::Profile;

/// Durable mirror of the authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    /// Cached profile; absent when only the token survived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Profile>,
}

/// File-backed key/value store for the current session.
///
/// Last-writer-wins, no locking: all writers in this process are sequenced
/// through the session manager, and cross-process writers are reconciled by
/// the visibility trigger re-reading the file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session. Missing or unparseable files yield `None`.
    pub fn load(&self) -> Option<PersistedSession> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), "no persisted session: {e}");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(persisted) => Some(persisted),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to parse persisted session: {e}");
                None
            }
        }
    }

    /// Save the session atomically (write tmp + rename).
    ///
    /// Uses a unique temp filename (PID + counter) so concurrent saves racing
    /// on the same `.tmp` file cannot leave trailing bytes from a longer
    /// previous write.
    pub fn save(&self, session: &PersistedSession) -> anyhow::Result<()> {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(session)?;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Delete the persisted session. A missing file is not an error.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to clear persisted session: {e}");
            }
        }
    }
}

/// Default path for the persisted session file.
pub fn default_state_path() -> PathBuf {
    state_dir().join("session.json")
}

/// Resolve the state directory for campus client data.
///
/// Checks `CAMPUS_STATE_DIR`, then `$XDG_STATE_HOME/campus`,
/// then `$HOME/.local/state/campus`.
fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CAMPUS_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("campus");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/campus");
    }
    PathBuf::from(".campus")
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
