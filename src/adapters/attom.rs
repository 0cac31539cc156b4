//! Property API adapter (ATTOM property/address endpoint).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::{debug, instrument};

use super::RecordSource;
use crate::domain::{FetchError, PropertyPage, PropertyQuery};

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://api.gateway.attomdata.com";

const ADDRESS_PATH: &str = "propertyapi/v1.0.0/property/address";

/// HTTP client for the property API
pub struct AttomClient {
    /// API host, without trailing path
    base_url: String,
    /// Value of the `apikey` header
    api_key: String,
    /// HTTP client
    client: reqwest::Client,
}

impl AttomClient {
    /// Create a new client; `timeout` bounds each request end to end
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            anyhow::bail!("Property API key is not configured (set ESTATEPIN_ATTOM_API_KEY)");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client,
        })
    }

    /// Build the address endpoint URL
    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), ADDRESS_PATH)
    }
}

#[async_trait]
impl RecordSource for AttomClient {
    fn name(&self) -> &str {
        "attom"
    }

    #[instrument(skip(self), fields(postal_code = %query.postal_code, page = query.page))]
    async fn fetch(&self, query: &PropertyQuery) -> Result<PropertyPage, FetchError> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("postalcode", query.postal_code.clone()),
                ("page", query.page.to_string()),
                ("pagesize", query.page_size.to_string()),
            ])
            .header(ACCEPT, "application/json")
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| FetchError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::UpstreamUnavailable(e.to_string()))?;
        debug!(bytes = body.len(), "Property page received");

        PropertyPage::parse(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = AttomClient::new(DEFAULT_BASE_URL, "KEY", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.gateway.attomdata.com/propertyapi/v1.0.0/property/address"
        );
        assert_eq!(client.name(), "attom");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = AttomClient::new("http://localhost:8080/", "KEY", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/propertyapi/v1.0.0/property/address"
        );
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        assert!(AttomClient::new(DEFAULT_BASE_URL, "  ", Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_unavailable() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let client = AttomClient::new("http://127.0.0.1:9", "KEY", Duration::from_secs(2)).unwrap();
        let err = client.fetch(&PropertyQuery::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::UpstreamUnavailable(_)));
    }
}
