//! API Version Resolution
//!
//! Picks the api-version used to read a resource, from an immutable index
//! of provider metadata. No I/O happens here.

use super::error::CollectError;
use super::path::ResourceIdentifier;
use crate::model::Provider;
use std::collections::HashMap;

/// Providers keyed by namespace
#[derive(Debug, Default)]
pub struct ProviderIndex {
    providers: HashMap<String, Provider>,
}

impl ProviderIndex {
    /// Build the index; on duplicate namespaces the first listing wins
    pub fn new(providers: Vec<Provider>) -> Self {
        let mut map = HashMap::with_capacity(providers.len());
        for provider in providers {
            map.entry(provider.namespace.clone()).or_insert(provider);
        }
        Self { providers: map }
    }

    pub fn provider(&self, namespace: &str) -> Option<&Provider> {
        self.providers.get(namespace)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Preferred version for a namespace and resource type, if known
    pub fn lookup(&self, namespace: &str, resource_type: &str) -> Option<&str> {
        self.provider(namespace)?
            .resource_type(resource_type)?
            .preferred_version()
    }
}

/// Resolve the api-version to fetch `identifier` with
pub fn resolve(
    index: &ProviderIndex,
    identifier: &ResourceIdentifier,
) -> Result<String, CollectError> {
    let provider = index.provider(&identifier.provider_namespace).ok_or_else(|| {
        CollectError::ProviderNotFound {
            namespace: identifier.provider_namespace.clone(),
            resource_id: identifier.path.clone(),
        }
    })?;

    provider
        .resource_type(&identifier.resource_type)
        .and_then(|descriptor| descriptor.preferred_version())
        .map(str::to_string)
        .ok_or_else(|| CollectError::ResourceTypeNotFound {
            namespace: identifier.provider_namespace.clone(),
            resource_type: identifier.resource_type.clone(),
            resource_id: identifier.path.clone(),
        })
}
