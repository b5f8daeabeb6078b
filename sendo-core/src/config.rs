//! Configuration management
//!
//! Settings live in `settings.json` inside the Sendo directory:
//! ```json
//! {
//!   "apiUrl": "https://dev.api.sf-e.ca/api",
//!   "authPath": "/auth",
//!   "sessionTtlHours": 24,
//!   "requestTimeoutSecs": 30,
//!   "pageSize": 10,
//!   "clearPinOnFailure": false
//! }
//! ```
//! Keys this crate does not know about are kept when saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_API_URL: &str = "https://dev.api.sf-e.ca/api";
pub const DEFAULT_AUTH_PATH: &str = "/auth";
pub const DEFAULT_SESSION_TTL_HOURS: u32 = 24;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Environment override for the API base URL
pub const API_URL_ENV: &str = "SENDO_API_URL";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_ttl_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
    #[serde(default)]
    clear_pin_on_failure: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Sendo client configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub auth_path: String,
    pub session_ttl_hours: u32,
    /// `0` disables the timeout
    pub request_timeout_secs: u64,
    pub page_size: u32,
    pub clear_pin_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_path: DEFAULT_AUTH_PATH.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            clear_pin_on_failure: false,
        }
    }
}

fn read_settings(settings_path: &Path) -> Result<SettingsFile> {
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable settings file");
        SettingsFile::default()
    }))
}

impl Config {
    /// Load config from the Sendo directory
    ///
    /// The API URL can be overridden with `SENDO_API_URL`.
    pub fn load(sendo_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(sendo_dir)?;
        config.apply_api_override(std::env::var(API_URL_ENV).ok())?;
        Ok(config)
    }

    /// Settings file only, no environment
    pub fn load_file(sendo_dir: &Path) -> Result<Self> {
        let raw = read_settings(&sendo_dir.join(SETTINGS_FILE))?;
        let defaults = Self::default();

        let config = Self {
            api_url: raw.api_url.unwrap_or(defaults.api_url),
            auth_path: raw.auth_path.unwrap_or(defaults.auth_path),
            session_ttl_hours: raw.session_ttl_hours.unwrap_or(defaults.session_ttl_hours),
            request_timeout_secs: raw
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            page_size: raw.page_size.unwrap_or(defaults.page_size),
            clear_pin_on_failure: raw.clear_pin_on_failure,
        };
        config.validate()?;
        Ok(config)
    }

    fn apply_api_override(&mut self, api_url: Option<String>) -> Result<()> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.set_api_url(&url)
                .with_context(|| format!("Invalid {}", API_URL_ENV))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.api_base()?;
        if self.session_ttl_hours == 0 {
            bail!("sessionTtlHours must be at least 1");
        }
        if self.page_size == 0 {
            bail!("pageSize must be at least 1");
        }
        Ok(())
    }

    /// Parsed API base URL; only http and https are accepted
    pub fn api_base(&self) -> Result<Url> {
        let url = Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API URL '{}'", self.api_url))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => bail!("Unsupported API URL scheme '{}'", other),
        }
    }

    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        let previous = std::mem::replace(&mut self.api_url, url.trim().to_string());
        if let Err(e) = self.api_base() {
            self.api_url = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.session_ttl_hours))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Save config to the Sendo directory
    /// Preserves other settings that the CLI doesn't manage
    pub fn save(&self, sendo_dir: &Path) -> Result<()> {
        self.validate()?;
        let settings_path = sendo_dir.join(SETTINGS_FILE);
        let mut settings = read_settings(&settings_path)?;

        settings.api_url = Some(self.api_url.clone());
        settings.auth_path = Some(self.auth_path.clone());
        settings.session_ttl_hours = Some(self.session_ttl_hours);
        settings.request_timeout_secs = Some(self.request_timeout_secs);
        settings.page_size = Some(self.page_size);
        settings.clear_pin_on_failure = self.clear_pin_on_failure;

        std::fs::create_dir_all(sendo_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }
}
