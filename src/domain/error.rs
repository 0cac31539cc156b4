//! Error taxonomy for a pipeline run.
//!
//! Two families exist:
//! - Fatal errors ([`FetchError`], [`PipelineError`]) abort the whole run.
//! - Per-record errors ([`RecordError`]) skip a single record and the run
//!   continues with the rest.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::payload::EncodeError;

/// Failure to obtain the property page. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network failure, timeout, or a non-2xx response
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Body could not be parsed as the expected schema
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Failure reported by a content publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PublishError(pub String);

impl PublishError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Reason a single record was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("invalid identifier: {raw:?} is not an integer")]
    InvalidIdentifier { raw: String },

    #[error("no image references configured")]
    NoImageReferencesConfigured,

    #[error("identifier {raw} does not fit in 32 unsigned bits")]
    IdentifierOutOfRange { raw: String },

    #[error("publish failed: {0}")]
    PublishFailed(String),
}

impl RecordError {
    /// Stable short label, used when summarising skipped records
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::InvalidIdentifier { .. } => "invalid_identifier",
            RecordError::NoImageReferencesConfigured => "no_image_references",
            RecordError::IdentifierOutOfRange { .. } => "identifier_out_of_range",
            RecordError::PublishFailed(_) => "publish_failed",
        }
    }
}

impl From<PublishError> for RecordError {
    fn from(err: PublishError) -> Self {
        RecordError::PublishFailed(err.0)
    }
}

impl From<EncodeError> for RecordError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::IdentifierOutOfRange(id) => RecordError::IdentifierOutOfRange {
                raw: id.to_string(),
            },
        }
    }
}

/// Fatal errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wrap a `std::io::Error` with the artifact path it concerns
    pub fn artifact(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Artifact {
            path: path.into(),
            source,
        }
    }
}
