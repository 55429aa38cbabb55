use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Format used by the server for timestamps without an offset.
const SERVER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Payload of every auth service response (`data` in the envelope).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl LoginResponse {
    /// Token expiry, if the server sent one in a format we understand.
    /// Offset-less timestamps are taken as UTC.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expires_at.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, SERVER_DATETIME_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn with_expiry(raw: Option<&str>) -> LoginResponse {
        LoginResponse {
            expires_at: raw.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_expires_at_rfc3339() {
        let resp = with_expiry(Some("2025-03-01T12:30:00-03:00"));
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 15, 30, 0).unwrap();
        assert_eq!(resp.expires_at(), Some(expected));
    }

    #[test]
    fn test_expires_at_server_format() {
        let resp = with_expiry(Some("2025-03-01 12:30:00"));
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(resp.expires_at(), Some(expected));
    }

    #[test]
    fn test_expires_at_missing_or_garbage() {
        assert_eq!(with_expiry(None).expires_at(), None);
        assert_eq!(with_expiry(Some("tomorrow")).expires_at(), None);
    }

    #[test]
    fn test_parse_minimal_failure_payload() {
        let json = r#"{"success": false, "message": "Invalid login"}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("Failed to parse payload");
        assert!(!resp.success);
        assert_eq!(resp.message, "Invalid login");
        assert!(resp.user.is_none());
        assert!(resp.token.is_none());
    }
}
