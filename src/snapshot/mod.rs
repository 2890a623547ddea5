//! Resource group snapshots
//!
//! Everything between "a resource group changed" and "a snapshot document
//! was accepted by the sink".
//!
//! # Module Structure
//!
//! - [`path`] - Fixed-position parsing of topics and resource ids
//! - [`resolver`] - Provider index and api-version resolution
//! - [`cache`] - Process-wide, lazily populated provider metadata
//! - [`source`] - The management API operations the collector consumes
//! - [`sink`] - Destinations for finished documents
//! - [`collector`] - Orchestrates one collection run per trigger event
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use armsnap::snapshot::{Collector, DirectorySink};
//!
//! async fn example(client: Arc<armsnap::azure::client::ArmClient>, event: armsnap::model::TriggerEvent) -> anyhow::Result<()> {
//!     let collector = Collector::with_api(client, Arc::new(DirectorySink::new("snapshots")));
//!     let id = collector.run(event).await?;
//!     println!("wrote snapshot {id}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod collector;
pub mod error;
pub mod path;
pub mod resolver;
pub mod sink;
pub mod source;

#[cfg(test)]
pub(crate) mod mock;

pub use cache::{CacheState, ProviderCache};
pub use collector::Collector;
pub use error::CollectError;
pub use path::{extract_group_name, ResourceIdentifier};
pub use resolver::{resolve, ProviderIndex};
pub use sink::{DirectorySink, SnapshotSink, StdoutSink};
pub use source::ManagementApi;
