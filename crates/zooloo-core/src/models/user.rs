use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Value of `active` for an enabled account.
const ACTIVE_FLAG: &str = "Y";

/// Name shown when the server did not send one.
const FALLBACK_DISPLAY_NAME: &str = "User";

/// Profile of the logged-in user, as returned by the auth service.
///
/// The local copy is a cache of server state and is never treated as
/// authoritative on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub active: String,
}

/// Ids come back as strings or numbers depending on the server backend.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "invalid user id: expected string or number, got {}",
            other
        ))),
    }
}

impl User {
    pub fn is_active(&self) -> bool {
        self.active == ACTIVE_FLAG
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            FALLBACK_DISPLAY_NAME
        } else {
            &self.name
        }
    }

    pub fn status_display(&self) -> &'static str {
        if self.is_active() {
            "Active"
        } else {
            "Inactive"
        }
    }
}
