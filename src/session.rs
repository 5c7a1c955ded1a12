//! Session store: who is logged in, and with which bearer token.
//!
//! ARCHITECTURE
//! ============
//! `SessionStore` is a cheap-to-clone handle over shared state. The HTTP
//! wrapper, the login flow, and any UI component hold clones of the same
//! store; nothing is global.
//!
//! GENERATIONS
//! ===========
//! Every change of credentials (login success, logout, expiry) bumps
//! `generation`. Requests read the token together with the generation at send
//! time, and a 401 only ends the session if that generation is still current.
//! A late 401 from a request issued before a re-login is ignored.
//!
//! Login attempts carry their own counter. `logout()` bumps it, so a login
//! that settles after a logout is discarded instead of resurrecting the
//! session.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::error::{LoginError, SESSION_EXPIRED_MESSAGE};
use crate::types::User;

const EVENT_CAPACITY: usize = 16;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    LoggedOut,
    LoggingIn,
    LoggedIn,
}

/// Lifecycle notifications. UI layers subscribe to show alerts or redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: i64 },
    /// Explicit logout.
    LoggedOut,
    /// A 401 ended the session. `message` is the notice to show the user.
    Expired { message: &'static str },
}

/// Point-in-time copy of the session fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub generation: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::LoggingIn
        } else if self.token.is_some() {
            SessionPhase::LoggedIn
        } else {
            SessionPhase::LoggedOut
        }
    }
}

/// Token plus the generation it belongs to, read at request send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerGrant {
    pub token: String,
    pub generation: u64,
}

/// Proof that `begin_login` admitted this attempt.
#[derive(Debug)]
#[must_use]
pub struct LoginTicket {
    attempt: u64,
}

/// User and token live in one value so they can only be set or cleared together.
#[derive(Debug, Clone)]
struct Credentials {
    user: User,
    token: String,
}

#[derive(Debug, Default)]
struct SessionInner {
    credentials: Option<Credentials>,
    loading: bool,
    error: Option<String>,
    generation: u64,
    attempt: u64,
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<SessionInner>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { inner: Arc::new(Mutex::new(SessionInner::default())), events }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Subscribe to lifecycle events from this point on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            user: inner.credentials.as_ref().map(|c| c.user.clone()),
            token: inner.credentials.as_ref().map(|c| c.token.clone()),
            is_loading: inner.loading,
            error: inner.error.clone(),
            generation: inner.generation,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.snapshot().phase()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().credentials.as_ref().map(|c| c.user.clone())
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.lock().credentials.as_ref().map(|c| c.token.clone())
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().credentials.is_some()
    }

    /// Current token and generation, if logged in.
    #[must_use]
    pub fn bearer(&self) -> Option<BearerGrant> {
        let inner = self.lock();
        inner
            .credentials
            .as_ref()
            .map(|c| BearerGrant { token: c.token.clone(), generation: inner.generation })
    }

    // -------------------------------------------------------------------------
    // Login transitions
    // -------------------------------------------------------------------------

    /// Enter `LoggingIn`. Clears the previous error.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::InFlight`] if another attempt has not settled.
    pub fn begin_login(&self) -> Result<LoginTicket, LoginError> {
        let mut inner = self.lock();
        if inner.loading {
            return Err(LoginError::InFlight);
        }
        inner.loading = true;
        inner.error = None;
        inner.attempt += 1;
        Ok(LoginTicket { attempt: inner.attempt })
    }

    /// Settle a successful attempt: store credentials and bump the generation.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Superseded`] if a logout happened after
    /// `begin_login`; the credentials are dropped.
    pub fn complete_login(&self, ticket: LoginTicket, user: User, token: String) -> Result<(), LoginError> {
        let user_id = user.id;
        {
            let mut inner = self.lock();
            if inner.attempt != ticket.attempt {
                return Err(LoginError::Superseded);
            }
            inner.credentials = Some(Credentials { user, token });
            inner.loading = false;
            inner.error = None;
            inner.generation += 1;
        }
        self.emit(SessionEvent::LoggedIn { user_id });
        Ok(())
    }

    /// Settle a failed attempt. Credentials are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Superseded`] if a logout happened after
    /// `begin_login`; the message is not recorded.
    pub fn fail_login(&self, ticket: LoginTicket, message: String) -> Result<(), LoginError> {
        let mut inner = self.lock();
        if inner.attempt != ticket.attempt {
            return Err(LoginError::Superseded);
        }
        inner.loading = false;
        inner.error = Some(message);
        Ok(())
    }

    /// Replace the stored user after a profile edit, keeping the token.
    ///
    /// Returns `false` without touching anything if the session has ended or
    /// changed since `generation` was read.
    pub fn refresh_user(&self, generation: u64, user: User) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        match inner.credentials.as_mut() {
            Some(credentials) => {
                credentials.user = user;
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Logout transitions
    // -------------------------------------------------------------------------

    /// Clear credentials and cancel any in-flight login. Idempotent.
    pub fn logout(&self) {
        let had_credentials = {
            let mut inner = self.lock();
            let had_credentials = inner.credentials.take().is_some();
            if inner.loading {
                inner.loading = false;
                inner.attempt += 1;
            }
            if had_credentials {
                inner.generation += 1;
            }
            had_credentials
        };
        if had_credentials {
            tracing::info!("logged out");
            self.emit(SessionEvent::LoggedOut);
        }
    }

    /// End the session because a request issued under `generation` got a 401.
    ///
    /// Returns `true` only for the call that actually ended the session; later
    /// 401s from the same or older generations return `false`.
    pub fn expire(&self, generation: u64) -> bool {
        {
            let mut inner = self.lock();
            if inner.credentials.is_none() || inner.generation != generation {
                return false;
            }
            inner.credentials = None;
            inner.generation += 1;
        }
        tracing::warn!(generation, "session expired");
        self.emit(SessionEvent::Expired { message: SESSION_EXPIRED_MESSAGE });
        true
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("authenticated", &inner.credentials.is_some())
            .field("loading", &inner.loading)
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}
