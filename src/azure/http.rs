//! HTTP utilities for Azure REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

/// Non-success HTTP status returned by an Azure endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("API request failed: {status}")]
pub struct ApiError {
    pub status: StatusCode,
}

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body for logging and drop non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let printable: String = body
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    if printable.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &printable[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        printable
    }
}

/// HTTP client wrapper for Azure API calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("armsnap/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make an authenticated GET request
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        Self::read_json(response).await
    }

    /// POST a url-encoded form, without authentication
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .context("Failed to send request")?;

        Self::read_json(response).await
    }

    async fn read_json(response: Response) -> Result<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only the sanitized body is logged; token responses can echo secrets
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError { status }.into());
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format an Azure API error for display
///
/// The message is picked from the HTTP status carried by an [`ApiError`]
/// anywhere in the chain; context strings are never inspected for codes.
pub fn format_arm_error(error: &anyhow::Error) -> String {
    if let Some(api_error) = error.chain().find_map(|e| e.downcast_ref::<ApiError>()) {
        return describe_status(api_error.status).to_string();
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

fn describe_status(status: StatusCode) -> &'static str {
    match status.as_u16() {
        403 => "Permission denied. Check the service principal's role assignments.",
        401 => "Authentication failed. Check TenantId, ClientId and ClientSecret.",
        404 => "Resource not found.",
        429 => "Rate limit exceeded. Please try again later.",
        400 => "Invalid request. Check your parameters.",
        500..=599 => "Azure service temporarily unavailable. Please try again.",
        _ => "Request failed. Check your network connection and try again.",
    }
}
