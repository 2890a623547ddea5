//! Collector
//!
//! Entry point for one trigger event. A run walks four phases and stops at
//! the first failure:
//!
//! 1. make sure provider metadata is cached
//! 2. list the resource group named by the event topic
//! 3. for each resource in listing order: parse its id, resolve an
//!    api-version, fetch its properties
//! 4. assemble the snapshot and hand it to the sink
//!
//! Nothing reaches the sink unless every resource was captured.

use super::cache::ProviderCache;
use super::error::CollectError;
use super::path::{extract_group_name, ResourceIdentifier};
use super::resolver::{resolve, ProviderIndex};
use super::sink::SnapshotSink;
use super::source::ManagementApi;
use crate::model::{
    ResourceGroupSnapshot, ResourceStatus, ResourceSummary, SnapshotDocument, TriggerEvent,
};
use std::sync::Arc;
use uuid::Uuid;

/// Captures resource group snapshots for trigger events
#[derive(Clone)]
pub struct Collector {
    api: Arc<dyn ManagementApi>,
    cache: Arc<ProviderCache>,
    sink: Arc<dyn SnapshotSink>,
}

impl Collector {
    pub fn new(
        api: Arc<dyn ManagementApi>,
        cache: Arc<ProviderCache>,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self { api, cache, sink }
    }

    /// Build a collector with its own provider cache over `api`
    pub fn with_api(api: Arc<dyn ManagementApi>, sink: Arc<dyn SnapshotSink>) -> Self {
        let cache = Arc::new(ProviderCache::new(api.clone()));
        Self::new(api, cache, sink)
    }

    /// Capture and emit a snapshot for `event`; returns the document id
    pub async fn run(&self, event: TriggerEvent) -> Result<Uuid, CollectError> {
        tracing::info!("Collecting snapshot for event {} ({})", event.id, event.event_type);

        let document = self.collect(event).await?;
        let id = document.id;

        self.sink
            .write(&document)
            .await
            .map_err(CollectError::SinkFailed)?;

        tracing::info!(
            "Emitted snapshot {} with {} resources",
            id,
            document.snapshot.resources.len()
        );
        Ok(id)
    }

    /// Capture a snapshot for `event` without emitting it
    pub async fn collect(&self, event: TriggerEvent) -> Result<SnapshotDocument, CollectError> {
        self.cache
            .ensure_populated()
            .await
            .map_err(CollectError::InitializationFailed)?;

        // An empty listing leaves nothing cached; resolution then reports
        // every provider as missing
        let index = self.cache.snapshot().await.unwrap_or_default();

        let resource_group = extract_group_name(&event.topic)?;
        let summaries = self
            .api
            .list_resource_group(&resource_group)
            .await
            .map_err(|cause| CollectError::EnumerationFailed {
                resource_group: resource_group.clone(),
                cause,
            })?;

        tracing::debug!(
            "Resource group {} holds {} resources",
            resource_group,
            summaries.len()
        );

        let mut resources = Vec::with_capacity(summaries.len());
        for summary in &summaries {
            resources.push(self.capture(&index, &resource_group, summary).await?);
        }

        let snapshot = ResourceGroupSnapshot::new(event, resources);
        Ok(SnapshotDocument::new(snapshot))
    }

    async fn capture(
        &self,
        index: &ProviderIndex,
        resource_group: &str,
        summary: &ResourceSummary,
    ) -> Result<ResourceStatus, CollectError> {
        let identifier = ResourceIdentifier::parse(&summary.id)?;

        // Group names compare case-insensitively in ARM
        if !identifier.resource_group.eq_ignore_ascii_case(resource_group) {
            return Err(CollectError::GroupMismatch {
                resource_id: summary.id.clone(),
                expected: resource_group.to_string(),
                found: identifier.resource_group,
            });
        }

        let api_version = resolve(index, &identifier)?;
        tracing::debug!("Fetching {} at api-version {}", summary.id, api_version);

        let properties = self
            .api
            .get_resource_properties(&summary.id, &api_version)
            .await
            .map_err(|cause| CollectError::FetchFailed {
                resource_id: summary.id.clone(),
                api_version: api_version.clone(),
                cause,
            })?;

        Ok(ResourceStatus::new(summary, properties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::mock::{MockManagementApi, RecordingSink};
    use serde_json::json;

    fn event(topic: &str) -> TriggerEvent {
        serde_json::from_value(json!({
            "id": "evt-1",
            "topic": topic,
            "subject": topic,
            "eventType": "Microsoft.Resources.ResourceWriteSuccess",
            "eventTime": "2024-03-01T12:00:00Z",
            "data": {"status": "Succeeded"},
            "dataVersion": "",
            "metadataVersion": "1"
        }))
        .unwrap()
    }

    fn setup(api: MockManagementApi) -> (Arc<MockManagementApi>, Arc<RecordingSink>, Collector) {
        let api = Arc::new(api);
        let sink = Arc::new(RecordingSink::default());
        let collector = Collector::with_api(api.clone(), sink.clone());
        (api, sink, collector)
    }

    #[tokio::test]
    async fn test_three_resources_in_listing_order() {
        let api = MockManagementApi::with_storage_provider();
        api.add_resource("my-rg", "Microsoft.Storage/storageAccounts", "acct1", Some(r#"{"a":1}"#));
        api.add_resource("my-rg", "Microsoft.Web/serverFarms", "plan1", Some(r#"{"b":2}"#));
        api.add_resource("my-rg", "Microsoft.Web/sites", "app1", Some(r#"{"c":3}"#));
        let (api, sink, collector) = setup(api);

        let id = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap();

        let documents = sink.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, id);

        let names: Vec<_> = documents[0]
            .snapshot
            .resources
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["acct1", "plan1", "app1"]);
        assert_eq!(documents[0].snapshot.resources[1].resource_properties, r#"{"b":2}"#);
        assert_eq!(documents[0].snapshot.grid_event.id, "evt-1");

        let versions: Vec<_> = api.fetches().into_iter().map(|(_, v)| v).collect();
        assert_eq!(versions, ["2021-09-01", "2021-02-01", "2022-03-01"]);
    }

    #[tokio::test]
    async fn test_unresolvable_type_emits_nothing() {
        let api = MockManagementApi::with_storage_provider();
        api.add_resource("my-rg", "Microsoft.Storage/storageAccounts", "acct1", Some("{}"));
        api.add_resource("my-rg", "Microsoft.Storage/fileShares", "share1", Some("{}"));
        api.add_resource("my-rg", "Microsoft.Web/sites", "app1", Some("{}"));
        let (api, sink, collector) = setup(api);

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::ResourceTypeNotFound { .. }));
        assert!(sink.documents().is_empty());
        // Processing stopped at the failing resource
        assert_eq!(api.fetches().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_identifier_emits_nothing() {
        let api = MockManagementApi::with_storage_provider();
        api.add_resource("my-rg", "Microsoft.Storage/storageAccounts", "acct1", Some("{}"));
        api.add_listed("my-rg", "/subscriptions/s/resourceGroups/my-rg", "Unknown", Some("{}"));
        api.add_resource("my-rg", "Microsoft.Web/sites", "app1", Some("{}"));
        let (api, sink, collector) = setup(api);

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap_err();

        match err {
            CollectError::MalformedIdentifier { path, expected, found } => {
                assert_eq!(path, "/subscriptions/s/resourceGroups/my-rg");
                assert_eq!(expected, 8);
                assert_eq!(found, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sink.documents().is_empty());
        assert_eq!(api.fetches().len(), 1);
    }

    #[tokio::test]
    async fn test_resource_from_other_group_emits_nothing() {
        let api = MockManagementApi::with_storage_provider();
        api.add_resource("my-rg", "Microsoft.Web/sites", "app1", Some("{}"));
        api.add_listed(
            "my-rg",
            "/subscriptions/sub-1/resourceGroups/other-rg/providers/Microsoft.Web/sites/app2",
            "Microsoft.Web/sites",
            Some("{}"),
        );
        let (api, sink, collector) = setup(api);

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectError::GroupMismatch { ref expected, ref found, .. }
                if expected == "my-rg" && found == "other-rg"
        ));
        assert!(sink.documents().is_empty());
        assert_eq!(api.fetches().len(), 1);
    }

    #[tokio::test]
    async fn test_group_match_ignores_case() {
        let api = MockManagementApi::with_storage_provider();
        api.add_listed(
            "my-rg",
            "/subscriptions/sub-1/resourceGroups/MY-RG/providers/Microsoft.Web/sites/app1",
            "Microsoft.Web/sites",
            Some("{}"),
        );
        let (_api, sink, collector) = setup(api);

        collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap();

        assert_eq!(sink.documents()[0].snapshot.resources.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_provider_emits_nothing() {
        let api = MockManagementApi::with_storage_provider();
        api.add_resource("my-rg", "Microsoft.Sql/servers", "db1", Some("{}"));
        let (_api, sink, collector) = setup(api);

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ProviderNotFound");
        assert!(sink.documents().is_empty());
    }

    #[tokio::test]
    async fn test_vanished_resource_fails_run() {
        let api = MockManagementApi::with_storage_provider();
        api.add_resource("my-rg", "Microsoft.Storage/storageAccounts", "acct1", Some("{}"));
        api.add_resource("my-rg", "Microsoft.Web/sites", "gone", None);
        let (_api, sink, collector) = setup(api);

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap_err();

        match err {
            CollectError::FetchFailed { resource_id, api_version, .. } => {
                assert!(resource_id.ends_with("/gone"));
                assert_eq!(api_version, "2022-03-01");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sink.documents().is_empty());
    }

    #[tokio::test]
    async fn test_initialization_failure() {
        let api = MockManagementApi::with_storage_provider();
        api.fail_providers(true);
        let (_api, sink, collector) = setup(api);

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::InitializationFailed(_)));
        assert!(sink.documents().is_empty());
    }

    #[tokio::test]
    async fn test_missing_group_is_enumeration_failure() {
        let (_api, sink, collector) = setup(MockManagementApi::with_storage_provider());

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/nope"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectError::EnumerationFailed { ref resource_group, .. } if resource_group == "nope"
        ));
        assert!(sink.documents().is_empty());
    }

    #[tokio::test]
    async fn test_short_topic_fails_before_listing() {
        let (_api, _sink, collector) = setup(MockManagementApi::with_storage_provider());

        let err = collector
            .run(event("/subscriptions/sub-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::MalformedTopic { .. }));
    }

    #[tokio::test]
    async fn test_empty_group_emits_empty_snapshot() {
        let api = MockManagementApi::with_storage_provider();
        api.add_group("empty-rg");
        let (api, sink, collector) = setup(api);

        collector
            .run(event("/subscriptions/sub-1/resourceGroups/empty-rg"))
            .await
            .unwrap();

        assert!(sink.documents()[0].snapshot.resources.is_empty());
        assert!(api.fetches().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported() {
        let api = Arc::new(MockManagementApi::with_storage_provider());
        api.add_resource("my-rg", "Microsoft.Web/sites", "app1", Some("{}"));
        let collector = Collector::with_api(api, Arc::new(RecordingSink::failing()));

        let err = collector
            .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::SinkFailed(_)));
    }

    #[tokio::test]
    async fn test_cache_shared_across_runs() {
        let api = MockManagementApi::with_storage_provider();
        api.add_resource("my-rg", "Microsoft.Web/sites", "app1", Some("{}"));
        let (api, sink, collector) = setup(api);

        for _ in 0..3 {
            collector
                .run(event("/subscriptions/sub-1/resourceGroups/my-rg"))
                .await
                .unwrap();
        }

        assert_eq!(api.provider_calls(), 1);
        let documents = sink.documents();
        assert_eq!(documents.len(), 3);
        assert_ne!(documents[0].id, documents[1].id);
    }
}
