//! Azure Authentication
//!
//! Client-credentials (service principal) tokens for the Resource Manager,
//! cached until shortly before they expire.

use super::http::ArmHttpClient;
use crate::config::Settings;
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// TTL assumed when the token response carries no usable `expires_in`
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Service principal credentials with token caching
#[derive(Clone)]
pub struct AzureCredentials {
    http: ArmHttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl AzureCredentials {
    pub fn new(settings: &Settings, http: ArmHttpClient) -> Self {
        Self {
            http,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                settings.authority_host, settings.tenant_id
            ),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            scope: format!("{}/.default", settings.management_endpoint),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let response = self
            .http
            .post_form(
                &self.token_url,
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("scope", self.scope.as_str()),
                ],
            )
            .await
            .context("Failed to acquire access token")?;

        let token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .context("Token response has no access_token")?
            .to_string();

        let ttl = token_ttl(&response);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!("New token cached, expires in ~{} minutes", ttl.as_secs() / 60);

        Ok(token)
    }
}

/// Token lifetime from `expires_in`, which the v1 endpoint sends as a string
fn token_ttl(response: &Value) -> Duration {
    let seconds = match response.get("expires_in") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };

    seconds
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL)
}
