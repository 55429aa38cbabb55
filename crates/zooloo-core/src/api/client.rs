//! Client for the application authentication REST service.
//!
//! Every operation is a single JSON POST to one endpoint; the `method` field
//! of the body selects the operation. The client keeps the credential store
//! in sync with what the server reports.

use std::time::Duration;

use reqwest::Client;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::auth::CredentialStore;
use crate::models::{Credentials, LoginResponse, User};

use super::AuthError;

// ============================================================================
// Constants
// ============================================================================

/// Service class name expected by the server's REST dispatcher.
const SERVICE_CLASS: &str = "ApplicationAuthenticationRestService";

/// Envelope status for a handled request.
const STATUS_SUCCESS: &str = "success";

/// HTTP request timeout in seconds.
/// Without it a hung server would leave the login screen spinning forever.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_LOGIN_FAILURE: &str = "Login failed";
const DEFAULT_REFRESH_FAILURE: &str = "Token refresh rejected";

/// Remote operations exposed by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Login,
    ValidateToken,
    RefreshToken,
    Logout,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Login => "login",
            AuthMethod::ValidateToken => "validateToken",
            AuthMethod::RefreshToken => "refreshToken",
            AuthMethod::Logout => "logout",
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    class: &'static str,
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Credentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default, deserialize_with = "payload_or_message")]
    data: LoginResponse,
}

/// `data` is a payload object on handled requests, but the dispatcher puts a
/// bare message string there when it reports an error.
fn payload_or_message<'de, D>(deserializer: D) -> Result<LoginResponse, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => {
            LoginResponse::deserialize(Value::Object(map)).map_err(D::Error::custom)
        }
        Value::String(message) => Ok(LoginResponse {
            message,
            ..LoginResponse::default()
        }),
        _ => Ok(LoginResponse::default()),
    }
}

impl ApiResponse {
    fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS && self.data.success
    }

    fn message_or(self, fallback: &str) -> String {
        if self.data.message.trim().is_empty() {
            fallback.to_string()
        } else {
            self.data.message
        }
    }
}

/// Auth service client.
/// Clone is cheap - reqwest::Client and the store backend are shared.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    endpoint: String,
    store: CredentialStore,
}

impl AuthClient {
    /// Create a client with the default request timeout
    pub fn new(endpoint: impl Into<String>, store: CredentialStore) -> Result<Self, AuthError> {
        Self::with_timeout(
            endpoint,
            store,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        store: CredentialStore,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AuthError::from_transport)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            store,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    async fn call(
        &self,
        method: AuthMethod,
        data: Option<&Credentials>,
        token: Option<&str>,
    ) -> Result<ApiResponse, AuthError> {
        let body = RpcRequest {
            class: SERVICE_CLASS,
            method: method.as_str(),
            data,
            token,
        };

        debug!(method = method.as_str(), endpoint = %self.endpoint, "Sending auth request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(AuthError::from_transport)?;

        // The server reports failures inside the envelope, sometimes with a
        // non-2xx status. Only fall back to the HTTP status when there is no
        // envelope to read.
        match serde_json::from_str::<ApiResponse>(&text) {
            Ok(parsed) => {
                debug!(
                    method = method.as_str(),
                    http_status = status.as_u16(),
                    status = %parsed.status,
                    success = parsed.data.success,
                    "Auth response received"
                );
                Ok(parsed)
            }
            Err(_) if !status.is_success() => Err(AuthError::from_status(status, &text)),
            Err(e) => Err(AuthError::MalformedResponse(e.to_string())),
        }
    }

    // =========================================================================
    // Remote operations
    // =========================================================================

    /// Log in and persist the returned token and user.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        info!(login = %credentials.login, "Logging in");

        let response = match self.call(AuthMethod::Login, Some(credentials), None).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return Err(e);
            }
        };

        if !response.is_success() {
            let message = response.message_or(DEFAULT_LOGIN_FAILURE);
            warn!(%message, "Login rejected by server");
            return Err(AuthError::Rejected(message));
        }

        let data = response.data;
        if let Some(ref token) = data.token {
            self.store.set_token(token)?;
        }
        if let Some(ref user) = data.user {
            self.store.set_user(user)?;
        }

        info!(has_token = data.token.is_some(), has_user = data.user.is_some(), "Login successful");
        Ok(data)
    }

    /// Ask the server whether `token` is still valid, keeping the failure cause.
    pub async fn check_token(&self, token: &str) -> Result<bool, AuthError> {
        if token.is_empty() {
            return Ok(false);
        }
        let response = self.call(AuthMethod::ValidateToken, None, Some(token)).await?;
        Ok(response.is_success())
    }

    /// Fail-closed validation: any error counts as an invalid token.
    pub async fn validate_token(&self, token: &str) -> bool {
        match self.check_token(token).await {
            Ok(valid) => {
                debug!(valid, "Token validated");
                valid
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed, treating token as invalid");
                false
            }
        }
    }

    /// Exchange `token` for a new one and persist it.
    pub async fn try_refresh_token(&self, token: &str) -> Result<String, AuthError> {
        let response = self.call(AuthMethod::RefreshToken, None, Some(token)).await?;

        match response.data.token.clone() {
            Some(new_token) if response.is_success() => {
                self.store.set_token(&new_token)?;
                info!("Session token refreshed");
                Ok(new_token)
            }
            _ => Err(AuthError::Rejected(response.message_or(DEFAULT_REFRESH_FAILURE))),
        }
    }

    /// Like [`try_refresh_token`](Self::try_refresh_token), but any failure yields `None`.
    pub async fn refresh_token(&self, token: &str) -> Option<String> {
        match self.try_refresh_token(token).await {
            Ok(new_token) => Some(new_token),
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                None
            }
        }
    }

    /// Clear local credentials, then notify the server (best effort).
    ///
    /// Local state is gone before the request is sent, so an aborted or
    /// hung remote call can't leave a session behind. This never fails.
    pub async fn logout(&self) {
        let token = match self.store.token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token during logout");
                None
            }
        };

        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear stored credentials");
        }

        match token {
            Some(token) => {
                if let Err(e) = self.call(AuthMethod::Logout, None, Some(&token)).await {
                    warn!(error = %e, "Remote logout failed, local session already cleared");
                }
            }
            None => debug!("No stored token, skipping remote logout"),
        }
        info!("Logged out");
    }

    // =========================================================================
    // Local state
    // =========================================================================

    pub fn stored_token(&self) -> Option<String> {
        self.store.token().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read stored token");
            None
        })
    }

    pub fn stored_user(&self) -> Option<User> {
        self.store.user().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read stored user");
            None
        })
    }

    /// Stored token that the server still accepts. No token means no request.
    pub async fn is_authenticated(&self) -> bool {
        match self.stored_token() {
            Some(token) => self.validate_token(&token).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(AuthMethod::Login.as_str(), "login");
        assert_eq!(AuthMethod::ValidateToken.as_str(), "validateToken");
        assert_eq!(AuthMethod::RefreshToken.as_str(), "refreshToken");
        assert_eq!(AuthMethod::Logout.as_str(), "logout");
    }

    #[test]
    fn test_login_request_body() {
        let creds = Credentials::new("admin", "secret");
        let body = RpcRequest {
            class: SERVICE_CLASS,
            method: AuthMethod::Login.as_str(),
            data: Some(&creds),
            token: None,
        };
        let json = serde_json::to_value(&body).expect("Failed to serialize request");
        assert_eq!(
            json,
            serde_json::json!({
                "class": "ApplicationAuthenticationRestService",
                "method": "login",
                "data": {"login": "admin", "password": "secret"}
            })
        );
    }

    #[test]
    fn test_token_request_body_omits_data() {
        let body = RpcRequest {
            class: SERVICE_CLASS,
            method: AuthMethod::ValidateToken.as_str(),
            data: None,
            token: Some("abc123"),
        };
        let json = serde_json::to_value(&body).expect("Failed to serialize request");
        assert_eq!(json["token"], "abc123");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_parse_success_envelope() {
        let json = r#"{"status": "success", "data": {"success": true, "message": "ok", "token": "abc123", "expires_at": "2025-03-01 12:00:00", "user": {"id": "1", "login": "admin", "name": "Administrator", "email": "admin@example.com", "active": "Y"}}}"#;
        let resp: ApiResponse = serde_json::from_str(json).expect("Failed to parse envelope");
        assert!(resp.is_success());
        assert_eq!(resp.data.token.as_deref(), Some("abc123"));
        assert_eq!(resp.data.user.as_ref().map(|u| u.login.as_str()), Some("admin"));
    }

    #[test]
    fn test_envelope_needs_both_flags() {
        let json = r#"{"status": "error", "data": {"success": true, "message": ""}}"#;
        let resp: ApiResponse = serde_json::from_str(json).expect("Failed to parse envelope");
        assert!(!resp.is_success());
        assert_eq!(resp.message_or("fallback"), "fallback");

        let json = r#"{"status": "success", "data": {"success": false, "message": "Bad password"}}"#;
        let resp: ApiResponse = serde_json::from_str(json).expect("Failed to parse envelope");
        assert!(!resp.is_success());
        assert_eq!(resp.message_or("fallback"), "Bad password");
    }

    #[test]
    fn test_parse_error_envelope_with_message_string() {
        let json = r#"{"status": "error", "data": "Invalid login or password"}"#;
        let resp: ApiResponse = serde_json::from_str(json).expect("Failed to parse envelope");
        assert!(!resp.is_success());
        assert_eq!(resp.message_or("fallback"), "Invalid login or password");
    }

    #[test]
    fn test_parse_error_envelope_without_usable_data() {
        for json in [
            r#"{"status": "error", "data": null}"#,
            r#"{"status": "error", "data": 42}"#,
            r#"{"status": "error"}"#,
        ] {
            let resp: ApiResponse = serde_json::from_str(json).expect("Failed to parse envelope");
            assert!(!resp.is_success());
            assert_eq!(resp.message_or("fallback"), "fallback");
        }
    }

    #[test]
    fn test_malformed_payload_object_is_rejected() {
        let json = r#"{"status": "success", "data": {"success": "yes"}}"#;
        assert!(serde_json::from_str::<ApiResponse>(json).is_err());
    }
}
