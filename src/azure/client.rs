//! ARM Client
//!
//! Main client for Azure Resource Manager, combining authentication,
//! HTTP and URL building. Implements [`ManagementApi`] for the collector.

use super::auth::AzureCredentials;
use super::http::ArmHttpClient;
use super::{providers, resources};
use crate::config::Settings;
use crate::model::{Provider, ResourceSummary};
use crate::snapshot::ManagementApi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// api-version of the Microsoft.Resources endpoints used for listings
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// Upper bound on `nextLink` pages followed for one listing
const MAX_PAGES: usize = 1000;

/// Main ARM client
#[derive(Clone)]
pub struct ArmClient {
    pub credentials: AzureCredentials,
    pub http: ArmHttpClient,
    pub subscription_id: String,
    endpoint: Url,
}

impl ArmClient {
    /// Create a new ARM client
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = ArmHttpClient::new()?;
        let credentials = AzureCredentials::new(settings, http.clone());
        let endpoint = Url::parse(&settings.management_endpoint).with_context(|| {
            format!("Invalid management endpoint: {}", settings.management_endpoint)
        })?;

        Ok(Self {
            credentials,
            http,
            subscription_id: settings.subscription_id.clone(),
            endpoint,
        })
    }

    /// Make a GET request to an ARM API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.credentials.get_token().await?;
        self.http.get(url, &token).await
    }

    /// GET a collection and follow `nextLink` until exhausted, returning
    /// the concatenated `value` arrays
    pub async fn get_all_pages(&self, url: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                anyhow::bail!("Listing exceeded {} pages", MAX_PAGES);
            }

            let response = self.get(&url).await?;

            if let Some(values) = response.get("value").and_then(|v| v.as_array()) {
                items.extend(values.iter().cloned());
            }

            next = response
                .get("nextLink")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|link| self.check_next_link(link))
                .transpose()?;
        }

        Ok(items)
    }

    /// A `nextLink` must point back at the management endpoint; the bearer
    /// token is never sent anywhere else
    fn check_next_link(&self, link: &str) -> Result<String> {
        let url = Url::parse(link).with_context(|| format!("Invalid nextLink: {}", link))?;
        if url.origin() != self.endpoint.origin() {
            anyhow::bail!(
                "nextLink host {} does not match management endpoint {}",
                url.origin().ascii_serialization(),
                self.endpoint.origin().ascii_serialization()
            );
        }
        Ok(url.into())
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    fn base(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }

    /// Build subscription-scoped URL
    pub fn subscription_url(&self, path: &str) -> String {
        format!("{}/subscriptions/{}/{}", self.base(), self.subscription_id, path)
    }

    /// Provider listing URL
    pub fn providers_url(&self) -> String {
        format!(
            "{}?api-version={}",
            self.subscription_url("providers"),
            RESOURCES_API_VERSION
        )
    }

    /// Resources-in-group listing URL
    pub fn resource_group_resources_url(&self, resource_group: &str) -> String {
        format!(
            "{}?api-version={}",
            self.subscription_url(&format!(
                "resourceGroups/{}/resources",
                urlencoding::encode(resource_group)
            )),
            RESOURCES_API_VERSION
        )
    }

    /// URL of a single resource at a given api-version
    pub fn resource_url(&self, resource_id: &str, api_version: &str) -> Result<String> {
        let mut url = self
            .endpoint
            .join(resource_id)
            .with_context(|| format!("Invalid resource id: {}", resource_id))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url.into())
    }
}

#[async_trait]
impl ManagementApi for ArmClient {
    async fn list_providers(&self) -> Result<Vec<Provider>> {
        providers::list_providers(self).await
    }

    async fn list_resource_group(&self, resource_group: &str) -> Result<Vec<ResourceSummary>> {
        resources::list_resource_group(self, resource_group).await
    }

    async fn get_resource_properties(
        &self,
        resource_id: &str,
        api_version: &str,
    ) -> Result<String> {
        resources::get_resource_properties(self, resource_id, api_version).await
    }
}
