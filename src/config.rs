//! Configuration Management
//!
//! Credentials and endpoints for armsnap. Values are layered: explicit
//! overrides (CLI flags) > environment > `<config_dir>/armsnap/config.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Public Azure Resource Manager endpoint
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Public Microsoft Entra ID authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Environment variable names per setting. The bare names are what the
/// function app settings have always used; the `AZURE_` names follow the
/// Azure SDK convention.
const TENANT_ID_VARS: &[&str] = &["TenantId", "AZURE_TENANT_ID"];
const CLIENT_ID_VARS: &[&str] = &["ClientId", "AZURE_CLIENT_ID"];
const CLIENT_SECRET_VARS: &[&str] = &["ClientSecret", "AZURE_CLIENT_SECRET"];
const SUBSCRIPTION_ID_VARS: &[&str] = &["SubscriptionId", "AZURE_SUBSCRIPTION_ID"];
const MANAGEMENT_ENDPOINT_VARS: &[&str] = &["AZURE_MANAGEMENT_ENDPOINT"];
const AUTHORITY_HOST_VARS: &[&str] = &["AZURE_AUTHORITY_HOST"];

/// Partially specified configuration, as read from any one layer
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub management_endpoint: Option<String>,
    #[serde(default)]
    pub authority_host: Option<String>,
}

/// Fully resolved configuration
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub management_endpoint: String,
    pub authority_host: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .field("management_endpoint", &self.management_endpoint)
            .field("authority_host", &self.authority_host)
            .finish()
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armsnap").join("config.json"))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config file: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; the first non-empty variable
    /// listed for a setting wins
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        Self {
            tenant_id: read(TENANT_ID_VARS),
            client_id: read(CLIENT_ID_VARS),
            client_secret: read(CLIENT_SECRET_VARS),
            subscription_id: read(SUBSCRIPTION_ID_VARS),
            management_endpoint: read(MANAGEMENT_ENDPOINT_VARS),
            authority_host: read(AUTHORITY_HOST_VARS),
        }
    }

    /// Overlay `other` on top of `self`; set values in `other` win
    pub fn merge(self, other: Config) -> Self {
        Self {
            tenant_id: other.tenant_id.or(self.tenant_id),
            client_id: other.client_id.or(self.client_id),
            client_secret: other.client_secret.or(self.client_secret),
            subscription_id: other.subscription_id.or(self.subscription_id),
            management_endpoint: other.management_endpoint.or(self.management_endpoint),
            authority_host: other.authority_host.or(self.authority_host),
        }
    }

    /// Check required values are present and fill in endpoint defaults
    pub fn resolve(self) -> Result<Settings> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &'static str| {
            value.unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        let tenant_id = require(self.tenant_id, "TenantId");
        let client_id = require(self.client_id, "ClientId");
        let client_secret = require(self.client_secret, "ClientSecret");
        let subscription_id = require(self.subscription_id, "SubscriptionId");

        if !missing.is_empty() {
            anyhow::bail!("Missing required configuration: {}", missing.join(", "));
        }

        let management_endpoint = self
            .management_endpoint
            .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string());
        let authority_host = self
            .authority_host
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        url::Url::parse(&management_endpoint)
            .with_context(|| format!("Invalid management endpoint: {}", management_endpoint))?;
        url::Url::parse(&authority_host)
            .with_context(|| format!("Invalid authority host: {}", authority_host))?;

        Ok(Settings {
            tenant_id,
            client_id,
            client_secret,
            subscription_id,
            management_endpoint: management_endpoint.trim_end_matches('/').to_string(),
            authority_host: authority_host.trim_end_matches('/').to_string(),
        })
    }
}
