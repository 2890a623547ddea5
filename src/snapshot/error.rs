//! Collection Errors
//!
//! Every way a collection run can end without emitting a snapshot.
//! Failures from the management API and the sink arrive as
//! [`anyhow::Error`] and are wrapped into the variant for the phase
//! they happened in.

/// Errors that abort a collection run
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("Failed to initialize provider metadata: {0:#}")]
    InitializationFailed(anyhow::Error),

    #[error("Topic '{topic}' does not name a resource group")]
    MalformedTopic { topic: String },

    #[error("Failed to enumerate resource group '{resource_group}': {cause:#}")]
    EnumerationFailed {
        resource_group: String,
        cause: anyhow::Error,
    },

    #[error("Malformed resource identifier '{path}': expected at least {expected} segments, found {found}")]
    MalformedIdentifier {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("Resource '{resource_id}' belongs to group '{found}', not '{expected}'")]
    GroupMismatch {
        resource_id: String,
        expected: String,
        found: String,
    },

    #[error("Provider '{namespace}' not found for resource '{resource_id}'")]
    ProviderNotFound {
        namespace: String,
        resource_id: String,
    },

    #[error("Resource type '{resource_type}' not found in provider '{namespace}' for resource '{resource_id}'")]
    ResourceTypeNotFound {
        namespace: String,
        resource_type: String,
        resource_id: String,
    },

    #[error("Failed to fetch resource '{resource_id}' at api-version {api_version}: {cause:#}")]
    FetchFailed {
        resource_id: String,
        api_version: String,
        cause: anyhow::Error,
    },

    #[error("Snapshot sink rejected document: {0:#}")]
    SinkFailed(anyhow::Error),
}

impl CollectError {
    /// Short stable name of the failure, for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitializationFailed(_) => "InitializationFailed",
            Self::MalformedTopic { .. } => "MalformedTopic",
            Self::EnumerationFailed { .. } => "EnumerationFailed",
            Self::MalformedIdentifier { .. } => "MalformedIdentifier",
            Self::GroupMismatch { .. } => "GroupMismatch",
            Self::ProviderNotFound { .. } => "ProviderNotFound",
            Self::ResourceTypeNotFound { .. } => "ResourceTypeNotFound",
            Self::FetchFailed { .. } => "FetchFailed",
            Self::SinkFailed(_) => "SinkFailed",
        }
    }
}
