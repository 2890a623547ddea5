//! Management API seam
//!
//! The three read operations the collector needs from the resource
//! management plane. [`crate::azure::client::ArmClient`] is the production
//! implementation.

use crate::model::{Provider, ResourceSummary};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// List every provider with its resource types and api-versions
    async fn list_providers(&self) -> Result<Vec<Provider>>;

    /// List the resources currently in a resource group
    async fn list_resource_group(&self, resource_group: &str) -> Result<Vec<ResourceSummary>>;

    /// Read one resource and return its `properties` serialized as JSON text
    async fn get_resource_properties(
        &self,
        resource_id: &str,
        api_version: &str,
    ) -> Result<String>;
}
