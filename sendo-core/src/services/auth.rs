//! Login, logout and the periodic forced logout

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::domain::result::{Error, Result};
use crate::domain::{Session, SessionState};
use crate::services::api::SendoApi;
use crate::services::session::SessionStore;

pub struct AuthService {
    api: Arc<SendoApi>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<SendoApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// `POST /auth/login`, then `GET /users/me`
    ///
    /// A failed profile fetch is logged and the session stays
    /// authenticated without a profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::validation("Email and password are required"));
        }

        let credentials = self.api.login(email, password).await?;
        self.session.establish(credentials)?;
        tracing::info!("logged in");

        match self.api.me().await {
            Ok(profile) => self.session.set_profile(profile)?,
            Err(e) => tracing::warn!(error = %e, "could not load the user profile after login"),
        }

        self.session.current().ok_or(Error::Unauthorized)
    }

    /// `POST /auth/logout`; the local session is cleared whatever happens
    pub async fn logout(&self) -> Result<()> {
        let device_id = match self.session.state() {
            SessionState::Authenticated(session) => session.credentials.device_id,
            SessionState::Anonymous | SessionState::Expired => {
                self.session.clear()?;
                return Ok(());
            }
        };

        let Some(device_id) = device_id.filter(|d| !d.is_empty()) else {
            self.session.clear()?;
            return Err(Error::validation("Device id is required to log out"));
        };

        let result = self.api.logout(&device_id).await;
        self.session.clear()?;

        match result {
            Ok(()) | Err(Error::Unauthorized) => {
                tracing::info!("logged out");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Force a logout every `period` until `cancel` fires
    ///
    /// The first logout happens one full period after spawning.
    pub fn spawn_auto_logout(
        self: &Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let auth = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        tracing::info!("periodic logout");
                        if let Err(e) = auth.logout().await {
                            tracing::warn!(error = %e, "periodic logout failed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::adapters::scripted::{Scripted, ScriptedGateway};
    use crate::domain::Credentials;
    use crate::ports::{KeyValueStore, Method};
    use crate::services::session::{LOGIN_KEY, USER_INFO_KEY};

    struct Fixture {
        gateway: Arc<ScriptedGateway>,
        storage: Arc<MemoryStore>,
        session: Arc<SessionStore>,
        auth: Arc<AuthService>,
    }

    fn fixture() -> Fixture {
        let gateway = Arc::new(ScriptedGateway::new());
        let storage = Arc::new(MemoryStore::new());
        let session = Arc::new(SessionStore::new(storage.clone(), chrono::Duration::hours(24)));
        let api = Arc::new(SendoApi::new(gateway.clone(), session.clone()));
        let auth = Arc::new(AuthService::new(api, session.clone()));
        Fixture {
            gateway,
            storage,
            session,
            auth,
        }
    }

    fn script_login(gateway: &ScriptedGateway) {
        gateway.on(
            Method::Post,
            "/auth/login",
            Scripted::data(serde_json::json!({ "accessToken": "tok", "deviceId": "dev-1" })),
        );
    }

    #[tokio::test]
    async fn test_login_stores_credentials_and_profile() {
        let f = fixture();
        script_login(&f.gateway);
        f.gateway.on(
            Method::Get,
            "/users/me",
            Scripted::data(serde_json::json!({ "id": 7, "firstname": "Awa" })),
        );

        let session = f.auth.login("awa@example.com", "secret").await.unwrap();
        assert_eq!(session.user_id(), Some(7));
        assert!(f.storage.get(LOGIN_KEY).unwrap().is_some());
        assert!(f.storage.get(USER_INFO_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_survives_profile_failure() {
        let f = fixture();
        script_login(&f.gateway);
        f.gateway.on(Method::Get, "/users/me", Scripted::fail(500, "boom"));

        let session = f.auth.login("awa@example.com", "secret").await.unwrap();
        assert!(session.profile.is_none());
        assert!(f.session.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let f = fixture();
        assert!(matches!(
            f.auth.login("  ", "secret").await,
            Err(Error::Validation(_))
        ));
        assert_eq!(f.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_api_fails() {
        let f = fixture();
        f.session
            .establish(Credentials::new("tok", Some("dev-1".into())))
            .unwrap();
        f.gateway.on(Method::Post, "/auth/logout", Scripted::fail(500, "down"));

        assert!(f.auth.logout().await.is_err());
        assert!(matches!(f.session.state(), SessionState::Anonymous));
        assert!(f.storage.is_empty());

        let call = &f.gateway.calls()[0];
        assert_eq!(call.json.as_ref().unwrap()["deviceId"], "dev-1");
    }

    #[tokio::test]
    async fn test_logout_without_device_id() {
        let f = fixture();
        f.session.establish(Credentials::new("tok", None)).unwrap();

        assert!(matches!(f.auth.logout().await, Err(Error::Validation(_))));
        assert!(matches!(f.session.state(), SessionState::Anonymous));
        assert_eq!(f.gateway.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_logout_fires_after_period() {
        let f = fixture();
        f.session
            .establish(Credentials::new("tok", Some("dev-1".into())))
            .unwrap();
        f.gateway.on(Method::Post, "/auth/logout", Scripted::data(serde_json::Value::Null));

        let cancel = CancellationToken::new();
        let period = Duration::from_secs(24 * 60 * 60);
        let handle = f.auth.spawn_auto_logout(period, cancel.clone());

        tokio::time::sleep(period / 2).await;
        assert!(f.session.is_logged_in());

        tokio::time::sleep(period / 2 + Duration::from_secs(1)).await;
        assert!(matches!(f.session.state(), SessionState::Anonymous));
        assert_eq!(f.gateway.calls_to(Method::Post, "/auth/logout").len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }
}
