//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use portal_api::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use portal_session::DEFAULT_TOKEN_KEY;

use crate::error::CoreError;
use crate::Result;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the client storage database
    pub database_path: PathBuf,
    /// Base URL of the authentication API
    pub api_base_url: String,
    /// Storage key holding the session token
    pub token_key: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("portal.db"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Defaults overridden by environment variables.
    ///
    /// - `PORTAL_DATA_DIR`: directory holding `portal.db`
    /// - `PORTAL_API_URL`: auth API base URL
    /// - `PORTAL_TOKEN_KEY`: storage key for the token
    /// - `PORTAL_REQUEST_TIMEOUT_SECS`, `PORTAL_CONNECT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = var("PORTAL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);
        let mut config = Self::new(data_dir);

        if let Some(url) = var("PORTAL_API_URL") {
            config.api_base_url = url;
        }
        if let Some(key) = var("PORTAL_TOKEN_KEY") {
            config.token_key = key;
        }
        if let Some(raw) = var("PORTAL_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_secs("PORTAL_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = var("PORTAL_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout_secs = parse_secs("PORTAL_CONNECT_TIMEOUT_SECS", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base_url).map_err(|e| {
            CoreError::Config(format!("Invalid API URL {}: {e}", self.api_base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "API URL must be http or https: {}",
                self.api_base_url
            )));
        }

        if self.token_key.trim().is_empty() {
            return Err(CoreError::Config("Token key cannot be empty".to_string()));
        }

        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(CoreError::Config("Timeouts must be positive".to_string()));
        }

        Ok(())
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("portal"))
            .unwrap_or_else(|| PathBuf::from(".portal"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| CoreError::Config(format!("{key} must be a whole number of seconds, got {raw}")))
}

// Per-platform data directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/tmp/portal"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/portal/portal.db"));
        assert_eq!(config.token_key, "auth_token");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_vars_overrides() {
        let config = Config::from_vars(vars(&[
            ("PORTAL_DATA_DIR", "/var/lib/portal"),
            ("PORTAL_API_URL", "https://api.example.com/v2"),
            ("PORTAL_TOKEN_KEY", "site.token"),
            ("PORTAL_REQUEST_TIMEOUT_SECS", "5"),
            ("PORTAL_CONNECT_TIMEOUT_SECS", " 2 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/portal/portal.db"));
        assert_eq!(config.api_base_url, "https://api.example.com/v2");
        assert_eq!(config.token_key, "site.token");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 2);
    }

    #[test]
    fn test_from_vars_rejects_bad_values() {
        assert!(matches!(
            Config::from_vars(vars(&[("PORTAL_API_URL", "ftp://files.example.com")])),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("PORTAL_REQUEST_TIMEOUT_SECS", "soon")])),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("PORTAL_CONNECT_TIMEOUT_SECS", "0")])),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("PORTAL_TOKEN_KEY", "  ")])),
            Err(CoreError::Config(_))
        ));
    }
}
