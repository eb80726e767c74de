// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle events.
//!
//! The core never navigates or renders; it broadcasts these and lets the
//! presentation layer decide what an "unauthenticated entry point" looks like.

use crate::profile::Profile;

/// Events broadcast by the session manager.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session became authenticated (login or startup validation).
    Authenticated { user: Profile },
    /// The token was renewed and committed.
    Refreshed { expires_at: Option<u64> },
    /// The session ended and all local state was cleared.
    LoggedOut { reason: LogoutReason },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to sign out.
    UserRequested,
    /// The session was terminated by the escalation path.
    SessionExpired,
}

impl LogoutReason {
    /// Human-readable notice to surface before redirecting, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::UserRequested => None,
            Self::SessionExpired => Some("Your session has expired. Please sign in again."),
        }
    }
}
