//! New Relic infrastructure provider.
//!
//! Exposes New Relic resources to an infrastructure-as-code host over a
//! gRPC provider protocol. Each resource maps configuration attributes onto
//! NerdGraph calls and maps the responses back into state.
//!
//! # Resources
//!
//! - `newrelic_data_partition_rule`: routes matching log records into a
//!   `Log_` data partition
//! - `newrelic_synthetics_private_location`: a private location for
//!   synthetic monitors
//!
//! # Running
//!
//! ```ignore
//! use newrelic_provider::{init_logging, serve, NewRelicProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), newrelic_provider::ProviderError> {
//!     init_logging();
//!     serve(NewRelicProvider::new()).await
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! On startup the provider prints one line to stdout:
//!
//! ```text
//! NEWRELIC_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `NEWRELIC_PROVIDER|<protocol_version>|<address>`. The host spawns
//! the provider as a subprocess, reads this line and connects over gRPC.
//! Logs go to stderr so they never interleave with the handshake.
//!
//! # Provider Protocol
//!
//! - **GetMetadata**: capabilities and resource names
//! - **GetSchema**: schemas for the provider config and every resource
//! - **ValidateProviderConfig** / **Configure**: credentials and region
//! - **Stop**: graceful shutdown
//! - **ValidateResourceConfig**, **UpgradeResourceState**, **Plan**
//! - **Create/Read/Update/Delete**: resource lifecycle
//! - **ImportResourceState**: adopt existing objects

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use client::{ClientError, Credentials, NewRelicClient, Region};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::NewRelicProvider;
pub use resources::{ProviderMeta, Resource};
pub use schema::ProviderSchema;
pub use server::{
    handshake_line, serve, serve_on, serve_on_with_options, serve_with_options, ProviderService,
    ServeOptions,
};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

pub use async_trait::async_trait;
pub use serde_json;
