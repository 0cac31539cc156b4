//! In-process adapters.
//!
//! [`StaticSource`] serves a fixed page (a saved response snapshot, or
//! records built in code) and [`MemoryPublisher`] derives deterministic
//! content addresses from a SHA-256 digest instead of pinning anything.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{ContentPublisher, RecordSource};
use crate::domain::{
    ContentAddress, FetchError, PropertyPage, PropertyQuery, PublishError, RawRecord,
};

/// Record source that always returns the same page (or the same error)
pub struct StaticSource {
    page: Result<PropertyPage, FetchError>,
}

impl StaticSource {
    /// Serve a previously captured response body
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            page: PropertyPage::parse(body),
        }
    }

    /// Serve records built in code
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self {
            page: PropertyPage::from_records(records)
                .map_err(|e| FetchError::MalformedResponse(e.to_string())),
        }
    }

    /// Fail every fetch with `error`
    pub fn failing(error: FetchError) -> Self {
        Self { page: Err(error) }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, _query: &PropertyQuery) -> Result<PropertyPage, FetchError> {
        self.page.clone()
    }
}

/// A blob handed to [`MemoryPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedBlob {
    pub label: String,
    pub bytes: Vec<u8>,
    pub address: ContentAddress,
}

/// Publisher that keeps blobs in memory
#[derive(Default)]
pub struct MemoryPublisher {
    /// Labels whose publish attempts fail
    failing_labels: HashSet<String>,
    published: Mutex<Vec<PublishedBlob>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make publishing under `label` fail
    pub fn failing_on(mut self, label: impl Into<String>) -> Self {
        self.failing_labels.insert(label.into());
        self
    }

    /// Address this publisher assigns to `bytes`
    pub fn address_for(bytes: &[u8]) -> ContentAddress {
        let digest = Sha256::digest(bytes);
        ContentAddress::new(format!("sha256:{}", hex::encode(digest)))
    }

    /// Blobs published so far, in order
    pub fn published(&self) -> Vec<PublishedBlob> {
        self.published
            .lock()
            .map(|blobs| blobs.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl ContentPublisher for MemoryPublisher {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(&self, bytes: &[u8], label: &str) -> Result<ContentAddress, PublishError> {
        if self.failing_labels.contains(label) {
            return Err(PublishError::new(format!("refused to publish {}", label)));
        }

        let address = Self::address_for(bytes);
        let mut published = self
            .published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        published.push(PublishedBlob {
            label: label.to_string(),
            bytes: bytes.to_vec(),
            address: address.clone(),
        });

        Ok(address)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_publisher_is_deterministic() {
        let publisher = MemoryPublisher::new();
        let a = publisher.publish(b"hello", "one").await.unwrap();
        let b = publisher.publish(b"hello", "two").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(publisher.published().len(), 2);
    }

    #[tokio::test]
    async fn test_memory_publisher_failing_label() {
        let publisher = MemoryPublisher::new().failing_on("metadata_2.json");
        assert!(publisher.publish(b"x", "metadata_1.json").await.is_ok());
        assert!(publisher.publish(b"x", "metadata_2.json").await.is_err());
        assert_eq!(publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn test_static_source_failing() {
        let source = StaticSource::failing(FetchError::UpstreamUnavailable("down".to_string()));
        let err = source.fetch(&PropertyQuery::default()).await.unwrap_err();
        assert_eq!(err, FetchError::UpstreamUnavailable("down".to_string()));
    }

    #[tokio::test]
    async fn test_static_source_from_body() {
        let source = StaticSource::from_body(
            r#"{"property":[{"identifier":{"Id":7},"address":{"line1":"7 ELM ST","locality":"Bedford","postal1":"03110"}}]}"#,
        );
        let page = source.fetch(&PropertyQuery::default()).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].identifier_text(), "7");
    }
}
