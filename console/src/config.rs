//! Console configuration with TOML file support.

use callverify_provider::{Credentials, DuoSettings};
use callverify_utils::{mask_secret, LogFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::ConsoleError;

/// Configuration for an operator console.
///
/// Loaded from a TOML file via [`ConsoleConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Address the HTTP console binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Delay before the caller narrative reads "completed".
    #[serde(default = "default_completion_delay_ms")]
    pub completion_delay_ms: u64,

    #[serde(default)]
    pub duo: DuoConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// `[duo]` section: the Duo Auth API application.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DuoConfig {
    #[serde(default)]
    pub api_url: String,

    #[serde(default)]
    pub integration_key: String,

    #[serde(default)]
    pub secret_key: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    /// Fixed handle list from `identities`.
    #[default]
    Static,
    /// `GET {url}/identities`.
    Http,
}

/// `[directory]` section: where the identity list comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub kind: DirectoryKind,

    #[serde(default = "default_identities")]
    pub identities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_directory_timeout_secs")]
    pub timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_completion_delay_ms() -> u64 {
    2_000
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_poll_timeout_secs() -> u64 {
    60
}

fn default_identities() -> Vec<String> {
    callverify_directory::fixed::DEFAULT_HANDLES
        .iter()
        .map(|h| h.to_string())
        .collect()
}

fn default_directory_timeout_secs() -> u64 {
    10
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ConsoleConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConsoleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConsoleError> {
        toml::from_str(s).map_err(|e| ConsoleError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConsoleError> {
        toml::to_string_pretty(self).map_err(|e| ConsoleError::Config(e.to_string()))
    }

    /// Same as [`to_toml_string`](Self::to_toml_string) with credentials masked.
    pub fn to_masked_toml_string(&self) -> Result<String, ConsoleError> {
        let mut masked = self.clone();
        masked.duo.integration_key = mask_secret(&self.duo.integration_key);
        masked.duo.secret_key = mask_secret(&self.duo.secret_key);
        masked.to_toml_string()
    }

    /// Check the parts that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        self.socket_addr()?;
        if self.directory.kind == DirectoryKind::Http
            && self.directory.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConsoleError::Config(
                "directory.url is required when directory.kind = \"http\"".into(),
            ));
        }
        if self.duo.poll_interval_secs == 0 {
            return Err(ConsoleError::Config("duo.poll_interval_secs must be positive".into()));
        }
        if self.duo.poll_timeout_secs < self.duo.poll_interval_secs {
            return Err(ConsoleError::Config(
                "duo.poll_timeout_secs must not be shorter than duo.poll_interval_secs".into(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConsoleError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| {
                ConsoleError::Config(format!(
                    "invalid bind address {}:{}: {e}",
                    self.bind_address, self.port
                ))
            })
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            completion_delay_ms: default_completion_delay_ms(),
            duo: DuoConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl DuoConfig {
    pub fn settings(&self) -> DuoSettings {
        let mut settings = DuoSettings::new(
            self.api_url.clone(),
            Credentials::new(self.integration_key.clone(), self.secret_key.clone()),
        );
        settings.poll_interval = Duration::from_secs(self.poll_interval_secs);
        settings.poll_timeout = Duration::from_secs(self.poll_timeout_secs);
        settings
    }
}

impl Default for DuoConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            integration_key: String::new(),
            secret_key: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for DuoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuoConfig")
            .field("api_url", &self.api_url)
            .field("integration_key", &mask_secret(&self.integration_key))
            .field("secret_key", &mask_secret(&self.secret_key))
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            kind: DirectoryKind::default(),
            identities: default_identities(),
            url: None,
            timeout_secs: default_directory_timeout_secs(),
        }
    }
}
