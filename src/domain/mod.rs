//! Domain types for the property pipeline.
//!
//! This module contains the core data structures:
//! - Property: Raw upstream records and the query that fetches them
//! - Metadata: Per-property token metadata
//! - Outcome: Per-record and per-run results
//! - Error: Fatal and per-record error taxonomy

pub mod address;
pub mod error;
pub mod metadata;
pub mod outcome;
pub mod property;

// Re-export commonly used types
pub use address::ContentAddress;
pub use error::{FetchError, PipelineError, PublishError, RecordError};
pub use metadata::{Metadata, PublishedProperty};
pub use outcome::{RecordOutcome, RecordStage, RecordState, RunOutcome, RunReport};
pub use property::{Address, Identifier, PropertyPage, PropertyQuery, RawRecord};
