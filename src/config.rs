//! TOML configuration parsing.
//!
//! The client reads one file (default `./config/docqa.toml`). A missing file
//! is not an error: [`load_config`] falls back to [`Config::minimal`], which
//! points at a backend on `http://localhost:8000`.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 0
//!
//! [session]
//! path = "/home/me/.local/share/docqa/session.json"
//!
//! [ui]
//! notifications = "auto"
//! health_check = true
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::notify::NotifyMode;

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "DOCQA_API_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds. `0` disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: 0,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// Where the credential is persisted. Defaults to the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(p) => p.clone(),
            None => dirs::data_dir()
                .map(|d| d.join("docqa"))
                .unwrap_or_else(|| PathBuf::from(".docqa"))
                .join("session.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_notifications")]
    pub notifications: String,
    #[serde(default = "default_health_check")]
    pub health_check: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notifications: default_notifications(),
            health_check: default_health_check(),
        }
    }
}

fn default_notifications() -> String {
    "auto".to_string()
}
fn default_health_check() -> bool {
    true
}

impl UiConfig {
    /// Resolve the configured notification sink. Assumes a validated config.
    pub fn notify_mode(&self) -> NotifyMode {
        match self.notifications.as_str() {
            "human" => NotifyMode::Human,
            "json" => NotifyMode::Json,
            "off" => NotifyMode::Off,
            _ => NotifyMode::default_for_tty(),
        }
    }
}

impl Config {
    /// All defaults; used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Apply `--api-url` / `DOCQA_API_URL`, flag first, then re-validate.
    pub fn with_api_override(mut self, flag: Option<String>) -> Result<Self> {
        let env = std::env::var(API_URL_ENV).ok().filter(|v| !v.is_empty());
        if let Some(url) = flag.or(env) {
            self.api.base_url = url;
        }
        validate(&mut self)?;
        Ok(self)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let mut config = Config::minimal();
        validate(&mut config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&mut config)?;
    Ok(config)
}

fn validate(config: &mut Config) -> Result<()> {
    let trimmed = config.api.base_url.trim().trim_end_matches('/').to_string();
    let url = reqwest::Url::parse(&trimmed)
        .with_context(|| format!("api.base_url is not a valid URL: '{}'", trimmed))?;
    match url.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("api.base_url must use http or https, got '{}'", other),
    }
    config.api.base_url = trimmed;

    match config.ui.notifications.as_str() {
        "auto" | "human" | "json" | "off" => {}
        other => anyhow::bail!(
            "Unknown ui.notifications mode: '{}'. Must be auto, human, json, or off.",
            other
        ),
    }

    Ok(())
}
