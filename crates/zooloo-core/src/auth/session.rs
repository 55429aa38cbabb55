use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{AuthClient, AuthError};
use crate::models::{Credentials, LoginResponse, User};

/// Where the application stands with respect to authentication.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Startup check in flight; no navigation decision may be taken.
    #[default]
    Unknown,
    Authenticated {
        user: User,
        /// Only known right after a login; restored sessions don't carry it.
        expires_at: Option<DateTime<Utc>>,
    },
    Unauthenticated,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionState::Authenticated { expires_at, .. } => *expires_at,
            _ => None,
        }
    }
}

/// Owns the session state and publishes every change to subscribers.
///
/// Construct one per process, share it behind an `Arc`, call
/// [`init`](Self::init) once at startup and [`shutdown`](Self::shutdown)
/// on exit.
pub struct SessionManager {
    client: AuthClient,
    state_tx: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new(client: AuthClient) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unknown);
        Self { client, state_tx }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    fn publish(&self, state: SessionState) {
        debug!(
            authenticated = state.is_authenticated(),
            loading = state.is_loading(),
            "Session state changed"
        );
        self.state_tx.send_replace(state);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resolve the startup state from stored credentials.
    ///
    /// Without a stored token no request is made. A token the server rejects
    /// is left in storage; only [`logout`](Self::logout) clears it.
    pub async fn init(&self) -> SessionState {
        info!("Checking authentication status");
        let state = self.resolve_stored_session().await;
        info!(authenticated = state.is_authenticated(), "Authentication status resolved");
        self.publish(state.clone());
        state
    }

    /// Re-run the startup check, passing through `Unknown` again.
    pub async fn refresh(&self) -> SessionState {
        self.publish(SessionState::Unknown);
        self.init().await
    }

    /// Close the state channel. Subscribers see `changed()` return an error.
    pub fn shutdown(self) {
        debug!(
            subscribers = self.state_tx.receiver_count(),
            "Session manager shutting down"
        );
    }

    async fn resolve_stored_session(&self) -> SessionState {
        let Some(token) = self.client.stored_token() else {
            debug!("No stored token");
            return SessionState::Unauthenticated;
        };

        if !self.client.validate_token(&token).await {
            info!("Stored token is no longer valid");
            return SessionState::Unauthenticated;
        }

        match self.client.stored_user() {
            Some(user) => SessionState::Authenticated {
                user,
                expires_at: None,
            },
            None => {
                warn!("Token is valid but no user profile is stored");
                SessionState::Unauthenticated
            }
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Log in. Any failure leaves the session unauthenticated and is
    /// returned to the caller as is; nothing is retried.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let result = self.client.login(credentials).await.and_then(|response| {
            match response.user.clone() {
                Some(user) if response.success => Ok((user, response)),
                _ => Err(AuthError::MissingUser),
            }
        });

        match result {
            Ok((user, response)) => {
                self.publish(SessionState::Authenticated {
                    user,
                    expires_at: response.expires_at(),
                });
                Ok(response)
            }
            Err(e) => {
                self.publish(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Log out. Always ends unauthenticated, whatever the server does.
    pub async fn logout(&self) {
        self.client.logout().await;
        self.publish(SessionState::Unauthenticated);
    }

    /// Renew the stored token. The session state is left untouched.
    pub async fn refresh_token(&self) -> Result<String, AuthError> {
        let token = self.client.stored_token().ok_or(AuthError::NoToken)?;
        self.client.try_refresh_token(&token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialStore;

    fn sample_user() -> User {
        User {
            id: "1".to_string(),
            login: "admin".to_string(),
            name: "Administrator".to_string(),
            email: "admin@example.com".to_string(),
            active: "Y".to_string(),
        }
    }

    fn offline_manager() -> SessionManager {
        let client = AuthClient::new("http://127.0.0.1:9/rest.php", CredentialStore::in_memory())
            .expect("client should build");
        SessionManager::new(client)
    }

    #[test]
    fn test_state_accessors() {
        assert!(SessionState::Unknown.is_loading());
        assert!(!SessionState::Unknown.is_authenticated());
        assert!(SessionState::Unknown.user().is_none());

        let authed = SessionState::Authenticated {
            user: sample_user(),
            expires_at: None,
        };
        assert!(!authed.is_loading());
        assert!(authed.is_authenticated());
        assert_eq!(authed.user().map(|u| u.login.as_str()), Some("admin"));

        assert!(!SessionState::Unauthenticated.is_loading());
        assert!(!SessionState::Unauthenticated.is_authenticated());
    }

    #[test]
    fn test_default_state_is_unknown() {
        assert_eq!(SessionState::default(), SessionState::Unknown);
    }

    #[tokio::test]
    async fn test_new_manager_starts_unknown() {
        let manager = offline_manager();
        assert!(manager.current().is_loading());
        assert!(manager.subscribe().borrow().is_loading());
    }

    #[tokio::test]
    async fn test_init_without_token_is_unauthenticated() {
        // Port 9 (discard) would fail if a request were attempted; no token
        // means no request at all.
        let manager = offline_manager();
        assert_eq!(manager.init().await, SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_shutdown_closes_subscribers() {
        let manager = offline_manager();
        let mut rx = manager.subscribe();
        manager.shutdown();
        assert!(rx.changed().await.is_err());
    }
}
