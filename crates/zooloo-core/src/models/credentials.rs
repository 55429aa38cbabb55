use std::fmt;

use serde::Serialize;

/// Login form values. Held in memory only until submission, never persisted.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Trimmed copy of the credentials, or `None` if either field is blank.
    pub fn normalized(&self) -> Option<Self> {
        let login = self.login.trim();
        let password = self.password.trim();
        if login.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self::new(login, password))
    }
}

// Keep passwords out of log output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}
