//! Resources
//!
//! Resource group listing and single-resource reads.

use super::client::ArmClient;
use crate::model::ResourceSummary;
use anyhow::{Context, Result};
use serde_json::Value;

/// List the resources in a resource group, in the order ARM returns them
pub async fn list_resource_group(
    client: &ArmClient,
    resource_group: &str,
) -> Result<Vec<ResourceSummary>> {
    let url = client.resource_group_resources_url(resource_group);
    let items = client
        .get_all_pages(&url)
        .await
        .with_context(|| format!("Failed to list resource group {}", resource_group))?;

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).context("Failed to parse resource summary"))
        .collect()
}

/// Read a resource and serialize its `properties` object.
///
/// The payload is kept as opaque text; its shape depends on the resource
/// type and api-version. A resource without properties yields `null`.
pub async fn get_resource_properties(
    client: &ArmClient,
    resource_id: &str,
    api_version: &str,
) -> Result<String> {
    let url = client.resource_url(resource_id, api_version)?;
    let resource = client
        .get(&url)
        .await
        .with_context(|| format!("Failed to get resource {}", resource_id))?;

    let properties = resource.get("properties").unwrap_or(&Value::Null);
    serde_json::to_string(properties).context("Failed to serialize resource properties")
}
