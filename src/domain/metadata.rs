//! Metadata objects published for each property.

use serde::{Deserialize, Serialize};

use super::address::ContentAddress;

/// Token metadata for one property, in the shape NFT tooling expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// "Real Estate # {identifier}"
    pub name: String,

    /// Address line, locality and postal code, comma separated
    pub description: String,

    /// Gateway URI of the image assigned to this property
    pub image: String,

    /// Upstream identifier coerced to an integer
    #[serde(rename = "estateID")]
    pub estate_id: i64,
}

impl Metadata {
    /// Deterministic file name, also used as the publish label
    pub fn file_name(&self) -> String {
        format!("metadata_{}.json", self.estate_id)
    }

    /// Serialized form written to disk and published (2-space pretty JSON)
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// A property that made it all the way through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedProperty {
    #[serde(rename = "estateID")]
    pub estate_id: u32,
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(rename = "ipfsCid")]
    pub content_address: ContentAddress,
}

impl PublishedProperty {
    pub fn new(metadata: Metadata, estate_id: u32, content_address: ContentAddress) -> Self {
        Self {
            estate_id,
            name: metadata.name,
            description: metadata.description,
            image: metadata.image,
            content_address,
        }
    }
}
