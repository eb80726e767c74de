// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session manager: establishes, validates, silently renews, and tears down
//! the authenticated session across the lifetime of the client process.
//!
//! One manager owns one session. It is an explicit context object rather
//! than a process-wide singleton, so tests (and embedders) can run several
//! independent sessions side by side.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::event::{LogoutReason, SessionEvent};
use crate::persist::{PersistedSession, SessionStore};
use crate::profile::Profile;
use crate::token::{self, Claims};

/// In-memory record of the current authentication state.
///
/// `claims` is a pure derivation of `token` and is recomputed whenever the
/// token changes; `is_authenticated` implies `token` is present.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub claims: Option<Claims>,
    pub user: Option<Profile>,
    pub is_authenticated: bool,
    /// True only during the startup validation window; the application must
    /// not render protected content while this is set.
    pub is_initializing: bool,
}

/// The single outstanding renewal timer.
struct PendingTimer {
    cancel: CancellationToken,
    /// Delay the timer was armed with (observable for diagnostics and tests).
    delay: Duration,
}

/// Owns the authenticated-session lifecycle.
pub struct SessionManager {
    state: RwLock<Session>,
    api: ApiClient,
    store: SessionStore,
    safety_buffer: Duration,
    event_tx: broadcast::Sender<SessionEvent>,
    /// At most one logical timer exists at any time; arming always cancels
    /// the predecessor inside the same critical section.
    timer: Mutex<Option<PendingTimer>>,
    /// Guards against a fired timer and a visibility trigger refreshing
    /// concurrently: the loser observes the winner's token and no-ops.
    refresh_inflight: AtomicBool,
}

impl SessionManager {
    /// Create a manager from config. The session starts in the initializing
    /// state; call [`initialize`](Self::initialize) once at startup.
    pub fn new(config: &ClientConfig) -> (Arc<Self>, broadcast::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = broadcast::channel(64);
        let manager = Arc::new(Self {
            state: RwLock::new(Session { is_initializing: true, ..Session::default() }),
            api: ApiClient::new(&config.api_url, config.request_timeout()),
            store: SessionStore::new(config.state_path()),
            safety_buffer: config.safety_buffer(),
            event_tx,
            timer: Mutex::new(None),
            refresh_inflight: AtomicBool::new(false),
        });
        (manager, event_rx)
    }

    /// Snapshot of the current session state.
    pub async fn session(&self) -> Session {
        self.state.read().await.clone()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Startup validation: decide whether persisted state is trusted,
    /// revalidated remotely, or discarded.
    ///
    /// Fully contains its own failures; the outcome is only ever a state
    /// transition (plus events), never an error to the caller.
    pub async fn initialize(self: &Arc<Self>) {
        let Some(persisted) = self.store.load() else {
            let mut s = self.state.write().await;
            s.is_initializing = false;
            info!("no persisted session; starting unauthenticated");
            return;
        };

        // Hold the candidate token in state (still unauthenticated) while
        // validating, so the escalation path knows there is something to
        // tear down if the server rejects it.
        {
            let mut s = self.state.write().await;
            s.claims = token::decode(&persisted.token);
            s.token = Some(persisted.token.clone());
        }

        match self.api.current_profile(&persisted.token).await {
            Ok(user) => {
                {
                    let mut s = self.state.write().await;
                    s.user = Some(user.clone());
                    s.is_authenticated = true;
                }
                // Refresh the profile cache alongside the validated token.
                let record =
                    PersistedSession { token: persisted.token, user: Some(user.clone()) };
                if let Err(e) = self.store.save(&record) {
                    warn!("failed to persist revalidated session: {e}");
                }
                info!(email = %user.email, "persisted session revalidated");
                let _ = self.event_tx.send(SessionEvent::Authenticated { user });
                self.schedule().await;
            }
            Err(ApiError::AuthDenied(msg)) => {
                // The server was reachable and said no. Definitive.
                warn!("persisted token rejected by server: {msg}");
                self.force_logout().await;
            }
            Err(ApiError::Transient(msg)) => match persisted.user {
                Some(user) => {
                    // Availability over strict consistency: keep the session
                    // usable on the cached profile until the server is
                    // reachable again. Silent — no user-visible notice.
                    warn!("profile revalidation unavailable, trusting cached profile: {msg}");
                    {
                        let mut s = self.state.write().await;
                        s.user = Some(user.clone());
                        s.is_authenticated = true;
                    }
                    let _ = self.event_tx.send(SessionEvent::Authenticated { user });
                    self.schedule().await;
                }
                None => {
                    warn!("profile revalidation unavailable and no cached profile: {msg}");
                    self.force_logout().await;
                }
            },
        }

        self.state.write().await.is_initializing = false;
    }

    /// Exchange credentials for a new session.
    ///
    /// Failures (invalid credentials, server errors) are surfaced to the
    /// caller; they never touch the escalation path.
    pub async fn login(self: &Arc<Self>, email: &str, password: &str) -> Result<Profile, ApiError> {
        let payload = self.api.login(email, password).await?;

        {
            let mut s = self.state.write().await;
            s.claims = token::decode(&payload.token);
            s.token = Some(payload.token.clone());
            s.user = Some(payload.user.clone());
            s.is_authenticated = true;
        }
        let record =
            PersistedSession { token: payload.token, user: Some(payload.user.clone()) };
        if let Err(e) = self.store.save(&record) {
            warn!("failed to persist session after login: {e}");
        }

        info!(email = %payload.user.email, "logged in");
        let _ = self.event_tx.send(SessionEvent::Authenticated { user: payload.user.clone() });
        self.schedule().await;
        Ok(payload.user)
    }

    /// (Re)arm the renewal timer from the current session state.
    ///
    /// Idempotent. The previous timer is cancelled unconditionally, even when
    /// no new one ends up armed — a stale timer must never fire against a
    /// superseded session. A token already inside its renewal window triggers
    /// an immediate refresh instead of arming a timer.
    pub async fn schedule(self: &Arc<Self>) {
        let mut slot = self.timer.lock().await;
        if let Some(old) = slot.take() {
            old.cancel.cancel();
        }

        let (authenticated, claims) = {
            let s = self.state.read().await;
            (s.is_authenticated, s.claims.clone())
        };
        if !authenticated {
            return;
        }
        let Some(claims) = claims else {
            // Undecodable token or no expiry claim: renewal only happens via
            // a manual trigger or the next visibility transition.
            debug!("current token has no usable expiry claim; renewal timer not armed");
            return;
        };

        let now = epoch_secs();
        let fire_at = claims.expires_at.saturating_sub(self.safety_buffer.as_secs());
        if fire_at <= now {
            debug!("token already inside its renewal window; refreshing now");
            tokio::spawn(refresh_task(Arc::clone(self)));
            return;
        }

        let delay = Duration::from_secs(fire_at - now);
        let cancel = CancellationToken::new();
        let fired = cancel.clone();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = fired.cancelled() => {}
                _ = tokio::time::sleep(delay) => refresh_task(manager).await,
            }
        });
        debug!(delay_secs = delay.as_secs(), "renewal timer armed");
        *slot = Some(PendingTimer { cancel, delay });
    }

    /// Renew the current token and commit the result.
    ///
    /// Safe to invoke from concurrent triggers: a second invocation while one
    /// is in flight is a no-op. A failed renewal is terminal for the session
    /// — there is no local retry; callers wanting resilience add backoff at
    /// this boundary.
    pub async fn refresh(self: &Arc<Self>) {
        if self.refresh_inflight.swap(true, Ordering::SeqCst) {
            debug!("refresh already in flight; skipping");
            return;
        }
        let result = self.do_refresh().await;
        self.refresh_inflight.store(false, Ordering::SeqCst);

        match result {
            Ok(true) => self.schedule().await,
            Ok(false) => {}
            Err(e) => {
                warn!("token renewal failed, ending session: {e}");
                self.force_logout().await;
            }
        }
    }

    /// One renewal round trip. Returns `Ok(false)` when there is nothing to
    /// refresh (the session ended before we ran).
    async fn do_refresh(&self) -> Result<bool, ApiError> {
        let current = {
            let s = self.state.read().await;
            if s.is_authenticated { s.token.clone() } else { None }
        };
        let Some(current) = current else {
            debug!("not authenticated; nothing to refresh");
            return Ok(false);
        };

        let payload = self.api.refresh(&current).await?;

        let (record, expires_at) = {
            let mut s = self.state.write().await;
            // The session may have ended (or the token moved) while the round
            // trip was in flight; committing now would resurrect it.
            if !s.is_authenticated || s.token.as_deref() != Some(current.as_str()) {
                debug!("session changed while renewal was in flight; discarding result");
                return Ok(false);
            }
            s.claims = token::decode(&payload.token);
            s.token = Some(payload.token.clone());
            // Reuse the cached profile; a renewal is not a reason to re-fetch.
            if s.user.is_none() {
                s.user = Some(payload.user);
            }
            (
                PersistedSession { token: payload.token, user: s.user.clone() },
                s.claims.as_ref().map(|c| c.expires_at),
            )
        };
        if let Err(e) = self.store.save(&record) {
            warn!("failed to persist renewed session: {e}");
        }

        info!("session token renewed");
        let _ = self.event_tx.send(SessionEvent::Refreshed { expires_at });
        Ok(true)
    }

    /// Foreground transition: timers are unreliable while backgrounded, and
    /// another process may have renewed the token in the meantime. Adopt the
    /// persisted token if it moved, then re-run scheduling from scratch.
    pub async fn on_visible(self: &Arc<Self>) {
        if !self.state.read().await.is_authenticated {
            return;
        }
        if let Some(persisted) = self.store.load() {
            let mut s = self.state.write().await;
            if s.is_authenticated && s.token.as_deref() != Some(persisted.token.as_str()) {
                debug!("adopting token renewed by another process");
                s.claims = token::decode(&persisted.token);
                s.token = Some(persisted.token);
                if s.user.is_none() {
                    s.user = persisted.user;
                }
            }
        }
        self.schedule().await;
    }

    /// Explicit user logout: best-effort server-side invalidation, then the
    /// same local teardown as [`force_logout`](Self::force_logout).
    pub async fn logout(self: &Arc<Self>) {
        // Cancel first so a renewal cannot revive the session mid-teardown.
        self.cancel_timer().await;

        let current = self.state.read().await.token.clone();
        if let Some(current) = current {
            let api = self.api.clone();
            tokio::spawn(async move {
                if let Err(e) = api.logout(&current).await {
                    debug!("server-side logout failed (ignored): {e}");
                }
            });
        }

        self.clear_session(LogoutReason::UserRequested).await;
    }

    /// Terminal failure path: unconditional, idempotent teardown.
    ///
    /// Cancels the renewal timer, clears persisted and in-memory state, and
    /// emits a [`SessionEvent::LoggedOut`] carrying the "session expired"
    /// notice. Nothing outside this manager issues a competing logout.
    pub async fn force_logout(&self) {
        self.clear_session(LogoutReason::SessionExpired).await;
    }

    /// Release the manager's resources. Pairs with [`new`](Self::new);
    /// in-memory and persisted session state are left untouched.
    pub async fn shutdown(&self) {
        self.cancel_timer().await;
    }

    async fn clear_session(&self, reason: LogoutReason) {
        self.cancel_timer().await;

        let had_session = {
            let mut s = self.state.write().await;
            let had = s.is_authenticated || s.token.is_some();
            *s = Session { is_initializing: s.is_initializing, ..Session::default() };
            had
        };
        self.store.clear();

        // Repeated teardowns stay silent; the user sees one logout.
        if had_session {
            match reason.notice() {
                Some(notice) => warn!("{notice}"),
                None => info!("signed out"),
            }
            let _ = self.event_tx.send(SessionEvent::LoggedOut { reason });
        }
    }

    async fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().await.take() {
            timer.cancel.cancel();
        }
    }
}

/// Type-erased refresh future for the timer spawn sites. `schedule` and
/// `refresh` await each other, so spawning `refresh` directly would give the
/// two opaque futures mutually recursive types; boxing cuts the knot.
fn refresh_task(manager: Arc<SessionManager>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move { manager.refresh().await })
}

fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
