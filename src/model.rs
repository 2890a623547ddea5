//! Data Model
//!
//! Shapes exchanged with Azure Resource Manager and the snapshot document
//! handed to the output sink. Serialized field names on [`SnapshotDocument`]
//! and everything below it are consumed downstream and must not change.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// =============================================================================
// Provider metadata
// =============================================================================

/// A resource provider and the resource types it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub namespace: String,
    #[serde(default)]
    pub resource_types: Vec<ResourceTypeDescriptor>,
}

impl Provider {
    /// Find a resource type by exact name (first match wins)
    pub fn resource_type(&self, resource_type: &str) -> Option<&ResourceTypeDescriptor> {
        self.resource_types
            .iter()
            .find(|t| t.resource_type == resource_type)
    }
}

/// One resource type and its supported API versions, most preferred first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeDescriptor {
    pub resource_type: String,
    #[serde(default)]
    pub api_versions: Vec<String>,
}

impl ResourceTypeDescriptor {
    /// The version listed first by the provider.
    ///
    /// Ordering is taken on trust from the provider listing; no date
    /// comparison is done here.
    pub fn preferred_version(&self) -> Option<&str> {
        self.api_versions.first().map(String::as_str)
    }
}

// =============================================================================
// Resources
// =============================================================================

/// A resource as reported by a resource group listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Captured state of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub name: String,
    pub id: String,
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    /// Serialized `properties` object, kept as raw text
    #[serde(rename = "resourceProperties")]
    pub resource_properties: String,
}

impl ResourceStatus {
    pub fn new(summary: &ResourceSummary, resource_properties: String) -> Self {
        Self {
            name: summary.name.clone(),
            id: summary.id.clone(),
            resource_type: summary.resource_type.clone(),
            resource_properties,
        }
    }
}

// =============================================================================
// Trigger event
// =============================================================================

/// Event Grid event that triggers a collection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub data_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,
    /// Any other fields the delivery carried, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TriggerEvent {
    /// Parse a delivery body holding either one event or a batch of them
    pub fn parse_batch(input: &str) -> Result<Vec<Self>> {
        let value: Value = serde_json::from_str(input).context("Event payload is not valid JSON")?;

        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_json::from_value(item)
                        .with_context(|| format!("Failed to parse event at index {}", i))
                })
                .collect(),
            other => {
                let event = serde_json::from_value(other).context("Failed to parse event")?;
                Ok(vec![event])
            }
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// All resources of one group, correlated with the event that triggered
/// the capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroupSnapshot {
    #[serde(rename = "gridEvent")]
    pub grid_event: TriggerEvent,
    pub resources: Vec<ResourceStatus>,
}

impl ResourceGroupSnapshot {
    pub fn new(grid_event: TriggerEvent, resources: Vec<ResourceStatus>) -> Self {
        Self {
            grid_event,
            resources,
        }
    }
}

/// Record handed to the sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub id: Uuid,
    pub snapshot: ResourceGroupSnapshot,
}

impl SnapshotDocument {
    /// Wrap a finished snapshot under a fresh identifier
    pub fn new(snapshot: ResourceGroupSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            snapshot,
        }
    }
}
