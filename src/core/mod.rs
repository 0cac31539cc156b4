//! Core pipeline logic.
//!
//! This module contains:
//! - MetadataBuilder: Raw record to token metadata
//! - Payload: ABI encoding and decoding of entries and the aggregate
//! - Index: estateID -> content address mapping
//! - ArtifactStore: Flat-file outputs of a run
//! - Orchestrator: Main execution engine

pub mod artifacts;
pub mod index;
pub mod metadata;
pub mod orchestrator;
pub mod payload;

// Re-export commonly used types
pub use artifacts::ArtifactStore;
pub use index::{IndexMap, IndexWriter};
pub use metadata::{MetadataBuilder, DEFAULT_GATEWAY};
pub use orchestrator::Orchestrator;
pub use payload::{
    decode_aggregate, decode_entry, encode_aggregate, encode_entry, DecodeError, DecodedEntry,
    EncodeError,
};
