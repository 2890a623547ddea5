//! Resource Providers
//!
//! Listing of registered and unregistered providers with the api-versions
//! each resource type supports.

use super::client::ArmClient;
use crate::model::Provider;
use anyhow::{Context, Result};

/// List all resource providers visible to the subscription
pub async fn list_providers(client: &ArmClient) -> Result<Vec<Provider>> {
    let items = client.get_all_pages(&client.providers_url()).await?;

    let providers = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<Provider>(item)
                .with_context(|| format!("Failed to parse provider at index {}", i))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("Listed {} resource providers", providers.len());
    Ok(providers)
}
