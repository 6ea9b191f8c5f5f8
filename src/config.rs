//! Configuration Management
//!
//! Handles persistent configuration storage for fieldform.

use crate::client::ApiSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "FIELDFORM_API_URL";
pub const ENV_TOKEN: &str = "FIELDFORM_TOKEN";
pub const ENV_ACCOUNT: &str = "FIELDFORM_ACCOUNT";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Base URL of the remote API
    #[serde(default)]
    pub api_url: Option<String>,
    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,
    /// Account scoping every request
    #[serde(default)]
    pub account: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fieldform").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config {:?}", path))?;

        Ok(())
    }

    /// Get effective API URL (CLI > env > config)
    pub fn effective_api_url(&self, cli: Option<&str>) -> Option<String> {
        pick(cli, ENV_API_URL, self.api_url.as_deref())
    }

    /// Get effective token (env > config)
    pub fn effective_token(&self) -> Option<String> {
        pick(None, ENV_TOKEN, self.token.as_deref())
    }

    /// Get effective account (CLI > env > config)
    pub fn effective_account(&self, cli: Option<&str>) -> Option<String> {
        pick(cli, ENV_ACCOUNT, self.account.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Connection settings for the API client
    pub fn api_settings(&self, api_url: Option<&str>, account: Option<&str>) -> Result<ApiSettings> {
        let base_url = self.effective_api_url(api_url).with_context(|| {
            format!("No API URL configured. Pass --api-url or set {}", ENV_API_URL)
        })?;
        Ok(ApiSettings {
            base_url,
            token: self.effective_token(),
            account: self.effective_account(account),
            timeout: self.timeout(),
        })
    }
}

fn pick(cli: Option<&str>, env_key: &str, file: Option<&str>) -> Option<String> {
    cli.map(String::from)
        .or_else(|| std::env::var(env_key).ok().filter(|v| !v.is_empty()))
        .or_else(|| file.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_wins_over_file() {
        let config = Config {
            api_url: Some("https://file.example".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.effective_api_url(Some("https://cli.example")).as_deref(),
            Some("https://cli.example")
        );
        assert_eq!(
            config.effective_api_url(None).as_deref(),
            Some("https://file.example")
        );
    }

    #[test]
    fn test_file_and_default_timeout() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let config = Config {
            timeout_secs: Some(5),
            account: Some("act-1".to_string()),
            ..Config::default()
        };
        let settings = config
            .api_settings(Some("https://cli.example"), Some("act-2"))
            .unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.account.as_deref(), Some("act-2"));
    }

    #[test]
    fn test_api_url_is_required() {
        if std::env::var(ENV_API_URL).is_ok() {
            return;
        }
        let err = Config::default().api_settings(None, None).unwrap_err();
        assert!(err.to_string().contains(ENV_API_URL));
    }

    #[test]
    fn test_missing_fields_deserialize() {
        let config: Config = serde_json::from_str(r#"{"account": "act-1"}"#).unwrap();
        assert_eq!(config.account.as_deref(), Some("act-1"));
        assert_eq!(config.api_url, None);
    }
}
