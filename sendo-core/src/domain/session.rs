//! Session domain model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Credentials returned by `POST /auth/login`, persisted as `login-sendo`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub device_id: Option<String>,
    /// When the session was opened; older entries without it are treated as fresh
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, device_id: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            device_id,
            issued_at: Some(Utc::now()),
        }
    }

    /// Absolute expiry: no renewal on activity
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.issued_at {
            Some(issued) => now >= issued + ttl,
            None => false,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub credentials: Credentials,
    pub profile: Option<UserProfile>,
}

impl Session {
    pub fn user_id(&self) -> Option<i64> {
        self.profile.as_ref().map(|p| p.id)
    }

    pub fn device_id(&self) -> Option<&str> {
        self.credentials.device_id.as_deref()
    }

    pub fn merchant_id(&self) -> Option<i64> {
        self.profile.as_ref().and_then(|p| p.merchant_id())
    }
}

/// Session lifecycle
#[derive(Debug, Clone)]
pub enum SessionState {
    Anonymous,
    Authenticated(Session),
    /// Ended by the lifetime limit or a 401 from the server
    Expired,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated(_) => "authenticated",
            Self::Expired => "expired",
        }
    }
}
