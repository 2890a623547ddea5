//! armsnap - resource group snapshots for Azure
//!
//! When Event Grid reports a change in a resource group, armsnap lists every
//! resource in that group, reads each one at the api-version its provider
//! lists first, and emits one document tying those states to the event.

pub mod azure;
pub mod config;
pub mod model;
pub mod snapshot;

pub use model::{ResourceGroupSnapshot, ResourceStatus, SnapshotDocument, TriggerEvent};
pub use snapshot::{CollectError, Collector};
