//! Application configuration management.
//!
//! Configuration covers where the auth service lives, how long requests may
//! take, which backend stores the session, and the last login used.
//!
//! Configuration is stored at `~/.config/zooloo/config.json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::auth::{CredentialStore, FileStore, KeyringStore};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "zooloo";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Host used when neither an endpoint nor a host is configured
const DEFAULT_HOST: &str = "localhost";

/// Path of the REST dispatcher on the server
const REST_PATH: &str = "rest.php";

pub const ENV_ENDPOINT: &str = "ZOOLOO_ENDPOINT";
pub const ENV_HOST: &str = "ZOOLOO_HOST";

/// Where the session token and user profile are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

impl StorageBackend {
    pub fn display_name(&self) -> &'static str {
        match self {
            StorageBackend::File => "file",
            StorageBackend::Keyring => "OS keychain",
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Full endpoint URL; wins over `host` when set.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Server host, optionally with a `:port` suffix that is ignored.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub last_login: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            host: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            storage: StorageBackend::default(),
            last_login: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply `ZOOLOO_ENDPOINT` / `ZOOLOO_HOST` on top of the file values.
    pub fn apply_env(&mut self) {
        if let Some(endpoint) = non_empty_env(ENV_ENDPOINT) {
            self.endpoint = Some(endpoint);
        }
        if let Some(host) = non_empty_env(ENV_HOST) {
            self.host = Some(host);
        }
    }

    pub fn endpoint_url(&self) -> String {
        match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
            _ => resolve_base_url(self.host.as_deref()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Open the configured credential backend.
    pub fn open_store(&self) -> Result<CredentialStore> {
        let store = match self.storage {
            StorageBackend::File => {
                CredentialStore::new(Arc::new(FileStore::new(self.cache_dir()?)))
            }
            StorageBackend::Keyring => CredentialStore::new(Arc::new(KeyringStore::new())),
        };
        Ok(store)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build `http://<host>/rest.php`, dropping any port from `host`.
pub fn resolve_base_url(host: Option<&str>) -> String {
    let host = host
        .map(str::trim)
        .and_then(|h| h.split(':').next())
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_HOST);
    format!("http://{}/{}", host, REST_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url_strips_port() {
        assert_eq!(
            resolve_base_url(Some("192.168.100.234:8081")),
            "http://192.168.100.234/rest.php"
        );
        assert_eq!(resolve_base_url(Some("api.local")), "http://api.local/rest.php");
    }

    #[test]
    fn test_resolve_base_url_defaults_to_localhost() {
        assert_eq!(resolve_base_url(None), "http://localhost/rest.php");
        assert_eq!(resolve_base_url(Some("")), "http://localhost/rest.php");
        assert_eq!(resolve_base_url(Some(":8081")), "http://localhost/rest.php");
    }

    #[test]
    fn test_endpoint_wins_over_host() {
        let config = Config {
            endpoint: Some("https://auth.example.com/rest.php".to_string()),
            host: Some("10.0.2.2".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "https://auth.example.com/rest.php");

        let config = Config {
            endpoint: Some("  ".to_string()),
            host: Some("10.0.2.2".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "http://10.0.2.2/rest.php");
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"storage": "keyring"}"#)
            .expect("Failed to parse config");
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_request_timeout_never_zero() {
        let config = Config {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
