//! In-memory management API and sink for unit tests

use super::sink::SnapshotSink;
use super::source::ManagementApi;
use crate::azure::http::ApiError;
use crate::model::{Provider, ResourceSummary, ResourceTypeDescriptor, SnapshotDocument};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct MockManagementApi {
    providers: Mutex<Vec<Provider>>,
    groups: Mutex<HashMap<String, Vec<ResourceSummary>>>,
    properties: Mutex<HashMap<String, String>>,
    fetches: Mutex<Vec<(String, String)>>,
    provider_delay: Mutex<Duration>,
    fail_providers: AtomicBool,
    provider_calls: AtomicUsize,
}

impl MockManagementApi {
    pub fn with_storage_provider() -> Self {
        let api = Self::default();
        api.providers.lock().unwrap().extend([
            Provider {
                namespace: "Microsoft.Storage".to_string(),
                resource_types: vec![ResourceTypeDescriptor {
                    resource_type: "storageAccounts".to_string(),
                    api_versions: vec!["2021-09-01".to_string(), "2019-06-01".to_string()],
                }],
            },
            Provider {
                namespace: "Microsoft.Web".to_string(),
                resource_types: vec![
                    ResourceTypeDescriptor {
                        resource_type: "sites".to_string(),
                        api_versions: vec!["2022-03-01".to_string()],
                    },
                    ResourceTypeDescriptor {
                        resource_type: "serverFarms".to_string(),
                        api_versions: vec!["2021-02-01".to_string(), "2020-12-01".to_string()],
                    },
                ],
            },
        ]);
        api
    }

    /// Register a resource in `group`; `None` properties makes its fetch fail
    pub fn add_resource(
        &self,
        group: &str,
        namespace_type: &str,
        name: &str,
        properties: Option<&str>,
    ) {
        let id = format!(
            "/subscriptions/sub-1/resourceGroups/{}/providers/{}/{}",
            group, namespace_type, name
        );
        self.add_listed(group, &id, namespace_type, properties);
    }

    /// Register a listing entry in `group` with `id` taken verbatim
    pub fn add_listed(
        &self,
        group: &str,
        id: &str,
        resource_type: &str,
        properties: Option<&str>,
    ) {
        let name = id.rsplit('/').next().unwrap_or_default();
        self.groups
            .lock()
            .unwrap()
            .entry(group.to_string())
            .or_default()
            .push(ResourceSummary {
                id: id.to_string(),
                name: name.to_string(),
                resource_type: resource_type.to_string(),
            });
        if let Some(properties) = properties {
            self.properties
                .lock()
                .unwrap()
                .insert(id.to_string(), properties.to_string());
        }
    }

    pub fn add_group(&self, group: &str) {
        self.groups
            .lock()
            .unwrap()
            .entry(group.to_string())
            .or_default();
    }

    pub fn fail_providers(&self, fail: bool) {
        self.fail_providers.store(fail, Ordering::SeqCst);
    }

    pub fn set_provider_delay(&self, delay: Duration) {
        *self.provider_delay.lock().unwrap() = delay;
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::SeqCst)
    }

    /// `(resource id, api-version)` of every detail fetch, in call order
    pub fn fetches(&self) -> Vec<(String, String)> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManagementApi for MockManagementApi {
    async fn list_providers(&self) -> Result<Vec<Provider>> {
        self.provider_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.provider_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_providers.load(Ordering::SeqCst) {
            return Err(ApiError {
                status: StatusCode::SERVICE_UNAVAILABLE,
            }
            .into());
        }
        Ok(self.providers.lock().unwrap().clone())
    }

    async fn list_resource_group(&self, resource_group: &str) -> Result<Vec<ResourceSummary>> {
        self.groups
            .lock()
            .unwrap()
            .get(resource_group)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn get_resource_properties(
        &self,
        resource_id: &str,
        api_version: &str,
    ) -> Result<String> {
        self.fetches
            .lock()
            .unwrap()
            .push((resource_id.to_string(), api_version.to_string()));

        self.properties
            .lock()
            .unwrap()
            .get(resource_id)
            .cloned()
            .ok_or_else(not_found)
    }
}

fn not_found() -> anyhow::Error {
    ApiError {
        status: StatusCode::NOT_FOUND,
    }
    .into()
}

/// Sink that keeps every accepted document in memory
#[derive(Default)]
pub struct RecordingSink {
    documents: Mutex<Vec<SnapshotDocument>>,
    fail: AtomicBool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn documents(&self) -> Vec<SnapshotDocument> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotSink for RecordingSink {
    async fn write(&self, document: &SnapshotDocument) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("sink unavailable"));
        }
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }
}
