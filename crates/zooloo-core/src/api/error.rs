use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The server answered and refused the request; carries its message.
    #[error("{0}")]
    Rejected(String),

    #[error("Unable to connect to server. Check your network connection.")]
    Connection(#[source] reqwest::Error),

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    MalformedResponse(String),

    #[error("Login succeeded but the server sent no user profile")]
    MissingUser,

    #[error("No stored session token")]
    NoToken,

    #[error("Credential storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AuthError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        AuthError::Status {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }

    /// Classify a transport-level failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else if err.is_decode() {
            AuthError::MalformedResponse(err.to_string())
        } else {
            AuthError::Connection(err)
        }
    }

    /// True when the failure happened before the server could answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Connection(_) | AuthError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_server_message() {
        let err = AuthError::Rejected("Invalid login or password".to_string());
        assert_eq!(err.to_string(), "Invalid login or password");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_from_status_truncates_long_bodies() {
        let body = "x".repeat(800);
        match AuthError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body) {
            AuthError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.starts_with(&"x".repeat(500)));
                assert!(body.ends_with("(truncated, 800 total bytes)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(400);
        let truncated = AuthError::truncate_body(&body);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_timeout_is_transport() {
        assert!(AuthError::Timeout.is_transport());
        assert!(!AuthError::MissingUser.is_transport());
    }
}
