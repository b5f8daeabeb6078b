//! Session store - the single answer to "is someone logged in"
//!
//! Holds the session in memory and mirrors it to a [`KeyValueStore`] under
//! two keys so a restart can pick it up again. Passed around as
//! `Arc<SessionStore>`; there is no global instance.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::domain::result::{Error, Result};
use crate::domain::{Credentials, Session, SessionState, UserProfile};
use crate::ports::KeyValueStore;

/// Persisted credentials entry
pub const LOGIN_KEY: &str = "login-sendo";
/// Persisted profile entry
pub const USER_INFO_KEY: &str = "user-info";

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    ttl: Duration,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Empty store; nothing is read from storage
    pub fn new(storage: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self {
            storage,
            ttl,
            state: Mutex::new(SessionState::Anonymous),
        }
    }

    /// Rebuild the session from storage
    ///
    /// Unreadable entries are dropped and leave the store anonymous; an
    /// entry older than the TTL leaves it expired.
    pub fn rehydrate(storage: Arc<dyn KeyValueStore>, ttl: Duration) -> Result<Self> {
        let store = Self::new(storage, ttl);

        let credentials = match store.storage.get(LOGIN_KEY)? {
            Some(raw) => match serde_json::from_str::<Credentials>(&raw) {
                Ok(credentials) if !credentials.access_token.is_empty() => Some(credentials),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable stored credentials");
                    None
                }
            },
            None => None,
        };

        let Some(credentials) = credentials else {
            store.remove_entries()?;
            return Ok(store);
        };

        if credentials.is_expired_at(Utc::now(), ttl) {
            tracing::info!("stored session is past its lifetime");
            store.remove_entries()?;
            *store.lock() = SessionState::Expired;
            return Ok(store);
        }

        let profile = store
            .storage
            .get(USER_INFO_KEY)?
            .and_then(|raw| serde_json::from_str::<UserProfile>(&raw).ok());

        *store.lock() = SessionState::Authenticated(Session {
            credentials,
            profile,
        });
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // a poisoned lock still holds a coherent state value
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove_entries(&self) -> Result<()> {
        self.storage.remove(LOGIN_KEY)?;
        self.storage.remove(USER_INFO_KEY)?;
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current state, after applying the lifetime limit
    pub fn state(&self) -> SessionState {
        self.check_expiry_at(Utc::now());
        self.lock().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn current(&self) -> Option<Session> {
        match self.state() {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Bearer token for the next request
    pub fn access_token(&self) -> Result<String> {
        match self.state() {
            SessionState::Authenticated(session) => Ok(session.credentials.access_token),
            SessionState::Expired => Err(Error::SessionExpired),
            SessionState::Anonymous => Err(Error::NotAuthenticated),
        }
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.current().and_then(|s| s.profile)
    }

    /// Start a session from a login response and persist it
    pub fn establish(&self, mut credentials: Credentials) -> Result<Session> {
        if credentials.access_token.is_empty() {
            return Err(Error::validation("Login response did not include an access token"));
        }
        if credentials.issued_at.is_none() {
            credentials.issued_at = Some(Utc::now());
        }

        self.storage
            .set(LOGIN_KEY, &serde_json::to_string(&credentials)?)?;
        self.storage.remove(USER_INFO_KEY)?;

        let session = Session {
            credentials,
            profile: None,
        };
        *self.lock() = SessionState::Authenticated(session.clone());
        Ok(session)
    }

    /// Attach the `/users/me` profile to the live session
    pub fn set_profile(&self, profile: UserProfile) -> Result<()> {
        let mut state = self.lock();
        let SessionState::Authenticated(session) = &mut *state else {
            return Err(Error::NotAuthenticated);
        };
        self.storage
            .set(USER_INFO_KEY, &serde_json::to_string(&profile)?)?;
        session.profile = Some(profile);
        Ok(())
    }

    /// Back to anonymous; both persisted entries are removed
    pub fn clear(&self) -> Result<()> {
        *self.lock() = SessionState::Anonymous;
        self.remove_entries()
    }

    /// The server rejected the session or its lifetime ran out
    pub fn expire(&self) -> Result<()> {
        {
            let mut state = self.lock();
            if matches!(*state, SessionState::Anonymous) {
                return Ok(());
            }
            *state = SessionState::Expired;
        }
        tracing::info!("session expired");
        self.remove_entries()
    }

    /// Apply the absolute lifetime as of `now`; true if this call expired it
    pub fn check_expiry_at(&self, now: DateTime<Utc>) -> bool {
        let expired = match &*self.lock() {
            SessionState::Authenticated(session) => session.credentials.is_expired_at(now, self.ttl),
            _ => false,
        };
        if expired {
            if let Err(e) = self.expire() {
                tracing::warn!(error = %e, "failed to remove expired session entries");
            }
        }
        expired
    }
}
