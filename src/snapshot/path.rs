//! Resource Path Convention
//!
//! ARM identifiers and Event Grid topics are slash-delimited paths whose
//! meaningful parts sit at fixed positions:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}
//! 0 1             2     3              4       5         6           7      8
//! ```
//!
//! Segment 0 is the empty string before the leading slash.

use super::error::CollectError;

pub const SEGMENT_SEPARATOR: char = '/';

/// Segment holding the resource group name
pub const RESOURCE_GROUP_SEGMENT: usize = 4;

/// Segment holding the provider namespace
pub const PROVIDER_NAMESPACE_SEGMENT: usize = 6;

/// Segment holding the top-level resource type
pub const RESOURCE_TYPE_SEGMENT: usize = 7;

/// Provider namespace and resource type parsed from a resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentifier {
    pub resource_group: String,
    pub provider_namespace: String,
    pub resource_type: String,
    pub path: String,
}

impl ResourceIdentifier {
    /// Parse a resource path using the fixed segment convention
    pub fn parse(path: &str) -> Result<Self, CollectError> {
        let segments: Vec<&str> = path.split(SEGMENT_SEPARATOR).collect();

        if segments.len() <= RESOURCE_TYPE_SEGMENT {
            return Err(CollectError::MalformedIdentifier {
                path: path.to_string(),
                expected: RESOURCE_TYPE_SEGMENT + 1,
                found: segments.len(),
            });
        }

        Ok(Self {
            resource_group: segments[RESOURCE_GROUP_SEGMENT].to_string(),
            provider_namespace: segments[PROVIDER_NAMESPACE_SEGMENT].to_string(),
            resource_type: segments[RESOURCE_TYPE_SEGMENT].to_string(),
            path: path.to_string(),
        })
    }
}

/// Extract the resource group name from an Event Grid topic
pub fn extract_group_name(topic: &str) -> Result<String, CollectError> {
    topic
        .split(SEGMENT_SEPARATOR)
        .nth(RESOURCE_GROUP_SEGMENT)
        .map(str::to_string)
        .ok_or_else(|| CollectError::MalformedTopic {
            topic: topic.to_string(),
        })
}
