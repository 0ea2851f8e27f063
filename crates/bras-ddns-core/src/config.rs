//! Configuration types for the Bras DDNS system
//!
//! The configuration is a single JSON document loaded once at startup:
//!
//! ```json
//! {
//!   "general": { "interval": 10 },
//!   "bras":    { "username": "user", "password": "pass" },
//!   "dnspod":  { "id": "12345", "token": "abcdef", "domain": "example.com", "sub_domain": "home" }
//! }
//! ```
//!
//! The `dnspod` section is optional; without it the daemon only keeps the
//! portal session alive.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Default portal host
pub const DEFAULT_PORTAL_BASE_URL: &str = "http://p.nju.edu.cn";

/// Default DnsPod API host
pub const DEFAULT_DNSPOD_BASE_URL: &str = "https://dnsapi.cn";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Loop settings
    pub general: GeneralConfig,

    /// Portal credentials
    pub bras: BrasConfig,

    /// DnsPod settings; `None` disables DNS updates
    #[serde(default)]
    pub dnspod: Option<DnsPodConfig>,
}

impl AppConfig {
    /// Load and validate the configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        raw.parse()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.general.validate()?;
        self.bras.validate()?;
        if let Some(ref dnspod) = self.dnspod {
            dnspod.validate()?;
        }
        Ok(())
    }

    /// Whether DNS updates are configured
    pub fn ddns_enabled(&self) -> bool {
        self.dnspod.is_some()
    }

    /// Derive the engine settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            interval: self.general.interval(),
            ..EngineConfig::default()
        }
    }
}

impl FromStr for AppConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(s)
            .map_err(|e| Error::parse(format!("cannot parse config json: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

/// General loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Minutes between two cycles
    pub interval: u64,
}

/// Longest accepted cycle interval: one week
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl GeneralConfig {
    fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(Error::config("general.interval must be > 0 minutes"));
        }
        if self.interval > MAX_INTERVAL_MINUTES {
            return Err(Error::config(format!(
                "general.interval must be at most {} minutes, got {}",
                MAX_INTERVAL_MINUTES, self.interval
            )));
        }
        Ok(())
    }

    /// Interval between two cycles, clamped to [`MAX_INTERVAL_MINUTES`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.min(MAX_INTERVAL_MINUTES) * 60)
    }
}

/// Portal credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct BrasConfig {
    pub username: String,

    /// ⚠️ NEVER log this value
    pub password: String,

    #[serde(default = "default_portal_base_url")]
    pub base_url: String,
}

impl BrasConfig {
    fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(Error::config("bras.username cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(Error::config("bras.password cannot be empty"));
        }
        validate_base_url("bras.base_url", &self.base_url)
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for BrasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrasConfig")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// DnsPod account and record selection
#[derive(Clone, Serialize, Deserialize)]
pub struct DnsPodConfig {
    /// API token id
    pub id: String,

    /// API token secret
    /// ⚠️ NEVER log this value
    pub token: String,

    /// Zone, e.g. "example.com"
    pub domain: String,

    /// Record host, e.g. "home"
    pub sub_domain: String,

    #[serde(default = "default_dnspod_base_url")]
    pub base_url: String,

    /// Treat `status.code != 1` as fatal instead of a warning
    #[serde(default)]
    pub strict_status: bool,
}

impl DnsPodConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("dnspod.id", &self.id),
            ("dnspod.token", &self.token),
            ("dnspod.domain", &self.domain),
            ("dnspod.sub_domain", &self.sub_domain),
        ] {
            if value.is_empty() {
                return Err(Error::config(format!("{} cannot be empty", field)));
            }
        }
        validate_base_url("dnspod.base_url", &self.base_url)
    }

    /// The `login_token` form value: `<id>,<token>`
    pub fn login_token(&self) -> String {
        format!("{},{}", self.id, self.token)
    }
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for DnsPodConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsPodConfig")
            .field("id", &self.id)
            .field("token", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("sub_domain", &self.sub_domain)
            .field("base_url", &self.base_url)
            .field("strict_status", &self.strict_status)
            .finish()
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time between two periodic cycles
    pub interval: Duration,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn validate_base_url(field: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, url
        )));
    }
    Ok(())
}

fn default_portal_base_url() -> String {
    DEFAULT_PORTAL_BASE_URL.to_string()
}

fn default_dnspod_base_url() -> String {
    DEFAULT_DNSPOD_BASE_URL.to_string()
}

fn default_event_channel_capacity() -> usize {
    256
}
