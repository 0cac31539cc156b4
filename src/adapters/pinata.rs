//! Pinata pinning adapter.
//!
//! Uploads each blob with `pinFileToIPFS` and returns the resulting CID.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::ContentPublisher;
use crate::domain::{ContentAddress, PublishError};

/// Default API host
pub const DEFAULT_API_URL: &str = "https://api.pinata.cloud";

/// Pinata API client
pub struct PinataClient {
    /// API host
    api_url: String,
    /// `pinata_api_key` header
    api_key: String,
    /// `pinata_secret_api_key` header
    secret_key: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response from pinFileToIPFS
#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataClient {
    /// Create a new client; `timeout` bounds each request end to end
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();
        if api_key.trim().is_empty() || secret_key.trim().is_empty() {
            anyhow::bail!(
                "Pinata credentials are not configured (set ESTATEPIN_PINATA_API_KEY and ESTATEPIN_PINATA_SECRET_KEY)"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_url: api_url.into(),
            api_key,
            secret_key,
            client,
        })
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), path)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
    }
}

#[async_trait]
impl ContentPublisher for PinataClient {
    fn name(&self) -> &str {
        "pinata"
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn publish(&self, bytes: &[u8], label: &str) -> Result<ContentAddress, PublishError> {
        let file_part = Part::bytes(bytes.to_vec())
            .file_name(label.to_string())
            .mime_str("application/json")
            .map_err(|e| PublishError::new(format!("Invalid upload part: {}", e)))?;

        let form = Form::new()
            .part("file", file_part)
            .text("pinataMetadata", serde_json::json!({ "name": label }).to_string());

        let response = self
            .authed(self.client.post(self.api_url("pinning/pinFileToIPFS")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::new(format!("Failed to reach Pinata: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::new(format!(
                "Pinata API error (HTTP {}): {}",
                status,
                body.trim()
            )));
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|e| PublishError::new(format!("Failed to parse Pinata response: {}", e)))?;

        if pinned.ipfs_hash.is_empty() {
            return Err(PublishError::new("Pinata returned an empty IpfsHash"));
        }

        debug!(cid = %pinned.ipfs_hash, "Pinned");
        Ok(ContentAddress::new(pinned.ipfs_hash))
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .authed(self.client.get(self.api_url("data/testAuthentication")))
            .send()
            .await
            .context("Failed to reach Pinata")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Pinata authentication failed (HTTP {}): {}", status, body.trim());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PinataClient {
        PinataClient::new(DEFAULT_API_URL, "KEY", "SECRET", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            client().api_url("pinning/pinFileToIPFS"),
            "https://api.pinata.cloud/pinning/pinFileToIPFS"
        );
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        assert!(PinataClient::new(DEFAULT_API_URL, "KEY", "", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_pin_response_parsing() {
        let body = r#"{"IpfsHash":"QmT5NvUtoM5nWFfrQdVrFtvGfKFmG7AHE8P34isapyhCxX","PinSize":120,"Timestamp":"2024-01-01T00:00:00Z"}"#;
        let parsed: PinResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.ipfs_hash, "QmT5NvUtoM5nWFfrQdVrFtvGfKFmG7AHE8P34isapyhCxX");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_publish_error() {
        let pinata = PinataClient::new("http://127.0.0.1:9", "KEY", "SECRET", Duration::from_secs(2)).unwrap();
        let err = pinata.publish(b"{}", "metadata_1.json").await.unwrap_err();
        assert!(!err.0.is_empty());
    }
}
