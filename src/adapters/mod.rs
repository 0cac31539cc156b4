//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the two external capabilities
//! the pipeline depends on: the property API and the pinning service.

pub mod attom;
pub mod memory;
pub mod pinata;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ContentAddress, FetchError, PropertyPage, PropertyQuery, PublishError};

// Re-export the adapters
pub use attom::AttomClient;
pub use memory::{MemoryPublisher, StaticSource};
pub use pinata::PinataClient;

/// Source of raw property records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Fetch one page of properties
    async fn fetch(&self, query: &PropertyQuery) -> Result<PropertyPage, FetchError>;
}

/// Content-addressed publishing capability
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Publish `bytes` under `label`, returning their content address
    async fn publish(&self, bytes: &[u8], label: &str) -> Result<ContentAddress, PublishError>;

    /// Credential / reachability check
    async fn health_check(&self) -> Result<()>;
}
