// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Campus client core: the authenticated-session lifecycle manager behind
//! the campus learning-management front end.
//!
//! Screens, CRUD forms, and routing consume this through [`session::SessionManager`]
//! snapshots and [`event::SessionEvent`] subscriptions; nothing in here
//! renders or navigates.

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod persist;
pub mod profile;
pub mod session;
pub mod token;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::event::SessionEvent;
use crate::session::SessionManager;

/// Run the session agent until shutdown.
///
/// Headless mode: validates persisted state, logs in from
/// `CAMPUS_EMAIL`/`CAMPUS_PASSWORD` when unauthenticated, and keeps the token
/// renewed. SIGHUP stands in for the host's "became visible" signal.
pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let (manager, mut events) = SessionManager::new(&config);
    manager.initialize().await;

    if !manager.session().await.is_authenticated {
        let email = std::env::var("CAMPUS_EMAIL").ok();
        let password = std::env::var("CAMPUS_PASSWORD").ok();
        match (email, password) {
            (Some(email), Some(password)) => {
                manager
                    .login(&email, &password)
                    .await
                    .map_err(|e| anyhow::anyhow!("login failed: {e}"))?;
            }
            _ => anyhow::bail!("not authenticated and CAMPUS_EMAIL/CAMPUS_PASSWORD are unset"),
        }
    }

    let mut foreground = signal(SignalKind::hangup())?;
    info!("session agent running (SIGHUP re-checks the token, ctrl-c exits)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            _ = foreground.recv() => {
                manager.on_visible().await;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::Authenticated { user }) => {
                    info!(email = %user.email, role = %user.role, "authenticated");
                }
                Ok(SessionEvent::Refreshed { expires_at }) => {
                    debug!(?expires_at, "token renewed");
                }
                Ok(SessionEvent::LoggedOut { reason }) => {
                    info!(?reason, "session ended; exiting");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }

    manager.shutdown().await;
    Ok(())
}
