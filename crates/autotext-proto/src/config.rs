use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

/// Environment variable that replaces `api.base_url` when set.
pub const API_URL_ENV: &str = "AUTOTEXT_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub message_log: MessageLogConfig,
}

/// Where the lead service lives and how we talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sent as `X-CSRFToken` on every POST when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueueConfig {
    /// When true, skipping a lead also moves it out of the pending tab until
    /// the next poll says otherwise.
    #[serde(default)]
    pub skip_marks_handled: bool,
}

/// Message-log stub: both the service's bind settings and the dashboard's
/// client side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLogConfig {
    /// Dashboard posts every message it sends to `url`.
    #[serde(default)]
    pub record_sends: bool,
    #[serde(default = "default_log_url")]
    pub url: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_log_port")]
    pub port: u16,
    #[serde(default = "default_table_file")]
    pub table_file: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            csrf_token: None,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl PollingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(50))
    }
}

impl Default for MessageLogConfig {
    fn default() -> Self {
        Self {
            record_sends: false,
            url: default_log_url(),
            bind_address: default_bind_address(),
            port: default_log_port(),
            table_file: default_table_file(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_log_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_port() -> u16 {
    5000
}

fn default_table_file() -> PathBuf {
    platform::data_dir().join("messages.jsonl")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let config = if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            config
        } else {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)?
        };

        Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Replace `api.base_url` with `url` when it is set and non-blank.
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        self
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
