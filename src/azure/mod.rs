//! Azure Resource Manager interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Service principal (client credentials) tokens
//! - [`client`] - Main ARM client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`providers`] - Resource provider listing
//! - [`resources`] - Resource group listing and resource reads
//!
//! # Example
//!
//! ```ignore
//! use armsnap::azure::client::ArmClient;
//! use armsnap::config::Config;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let settings = Config::from_env().resolve()?;
//!     let client = ArmClient::new(&settings)?;
//!     let providers = client.get_all_pages(&client.providers_url()).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod providers;
pub mod resources;
