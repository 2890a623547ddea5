//! Provider Metadata Cache
//!
//! Holds the provider listing for the lifetime of the process. The listing
//! is fetched on first use and published as one immutable [`ProviderIndex`],
//! so a reader either sees no index or the complete one.

use super::resolver::ProviderIndex;
use super::source::ManagementApi;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Population lifecycle of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Populating,
    Populated,
}

/// Process-wide provider metadata, shared by every collection run
pub struct ProviderCache {
    api: Arc<dyn ManagementApi>,
    index: RwLock<Option<Arc<ProviderIndex>>>,
    /// Serializes population so only one listing request is in flight
    populate_lock: Mutex<()>,
    populating: AtomicBool,
}

impl ProviderCache {
    pub fn new(api: Arc<dyn ManagementApi>) -> Self {
        Self {
            api,
            index: RwLock::new(None),
            populate_lock: Mutex::new(()),
            populating: AtomicBool::new(false),
        }
    }

    /// Fetch the provider listing unless a non-empty one is already held.
    ///
    /// On failure nothing is stored and the error is returned, so the next
    /// call tries again.
    pub async fn ensure_populated(&self) -> Result<()> {
        if self.snapshot().await.is_some() {
            return Ok(());
        }

        let _guard = self.populate_lock.lock().await;

        // Another caller may have finished while we waited
        if self.snapshot().await.is_some() {
            return Ok(());
        }

        let result = {
            let _populating = PopulatingFlag::raise(&self.populating);
            self.api.list_providers().await
        };

        let providers = result.context("Failed to list resource providers")?;

        if providers.is_empty() {
            tracing::warn!("Provider listing came back empty, cache left unpopulated");
            return Ok(());
        }

        let index = ProviderIndex::new(providers);
        tracing::info!("Cached metadata for {} resource providers", index.len());

        *self.index.write().await = Some(Arc::new(index));
        Ok(())
    }

    /// The published index, if population has completed
    pub async fn snapshot(&self) -> Option<Arc<ProviderIndex>> {
        self.index.read().await.clone()
    }

    /// Preferred api-version for a provider namespace and resource type
    pub async fn lookup(&self, namespace: &str, resource_type: &str) -> Option<String> {
        let index = self.snapshot().await?;
        index.lookup(namespace, resource_type).map(str::to_string)
    }

    pub async fn state(&self) -> CacheState {
        if self.index.read().await.is_some() {
            CacheState::Populated
        } else if self.populating.load(Ordering::SeqCst) {
            CacheState::Populating
        } else {
            CacheState::Empty
        }
    }
}

/// Holds `populating` up for its lifetime, including when the fetch is
/// cancelled mid-flight
struct PopulatingFlag<'a>(&'a AtomicBool);

impl<'a> PopulatingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for PopulatingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
