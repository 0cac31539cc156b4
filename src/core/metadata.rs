//! Mapping raw property records to token metadata.

use crate::domain::{Metadata, RawRecord, RecordError};

/// Public IPFS gateway used when none is configured
pub const DEFAULT_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";

/// Builds [`Metadata`] from raw records.
///
/// Images are assigned by position, cycling through the configured
/// references, so record `i` gets `image_refs[i % image_refs.len()]`.
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    gateway: String,
    image_refs: Vec<String>,
}

impl MetadataBuilder {
    pub fn new(gateway: impl Into<String>, image_refs: Vec<String>) -> Self {
        Self {
            gateway: gateway.into(),
            image_refs,
        }
    }

    pub fn image_refs(&self) -> &[String] {
        &self.image_refs
    }

    /// Build metadata for the record at `index` in fetch order
    pub fn build(&self, record: &RawRecord, index: usize) -> Result<Metadata, RecordError> {
        if self.image_refs.is_empty() {
            return Err(RecordError::NoImageReferencesConfigured);
        }

        let estate_id = parse_identifier(&record.identifier_text())?;
        let address = &record.address;

        Ok(Metadata {
            name: format!("Real Estate # {}", estate_id),
            description: format!(
                "{}, {}, {}",
                address.line1, address.locality, address.postal1
            ),
            image: self.image_uri(index),
            estate_id,
        })
    }

    fn image_uri(&self, index: usize) -> String {
        let reference = &self.image_refs[index % self.image_refs.len()];
        if self.gateway.ends_with('/') {
            format!("{}{}", self.gateway, reference)
        } else {
            format!("{}/{}", self.gateway, reference)
        }
    }
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY, Vec::new())
    }
}

/// Parse an identifier as a signed integer.
///
/// Integers too wide for `i64` are out of range rather than invalid; the
/// 32-bit bound itself is enforced when the entry is encoded.
fn parse_identifier(raw: &str) -> Result<i64, RecordError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RecordError::InvalidIdentifier {
            raw: raw.to_string(),
        });
    }

    trimmed
        .parse::<i64>()
        .map_err(|_| RecordError::IdentifierOutOfRange {
            raw: trimmed.to_string(),
        })
}
