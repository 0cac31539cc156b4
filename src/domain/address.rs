//! Content addresses returned by the publishing service.

use serde::{Deserialize, Serialize};

/// Opaque handle for a published blob (an IPFS CID in production).
///
/// No internal structure is assumed; the value is carried verbatim into
/// the index and the encoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContentAddress {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContentAddress {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
