//! estatepin - property records to content-addressed metadata and
//! on-chain verification payloads.
//!
//! # Architecture
//!
//! One run walks a single page of property records through a fixed chain:
//! - Fetch the page from the property API
//! - Build token metadata per record and write it to disk
//! - Publish the metadata to a pinning service, getting back a CID
//! - ABI-encode `(estateID, description, cid)` and record `estateID -> cid`
//!
//! Afterwards the encoded entries are wrapped into one `bytes[]` payload and
//! the index is flushed. A record that fails at any stage is skipped and
//! reported; only fetch and artifact failures abort the run.
//!
//! # Modules
//!
//! - `adapters`: External system integrations (property API, Pinata, in-memory)
//! - `core`: Pipeline logic (MetadataBuilder, payload codec, index, Orchestrator)
//! - `domain`: Data structures (RawRecord, Metadata, outcomes, errors)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Fetch, pin and encode
//! estatepin run --postal-code 03110
//!
//! # Same, without pinning anything
//! estatepin run --dry-run
//!
//! # Decode the produced payload
//! estatepin inspect out/payload.hex --index out/estate_index.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{ArtifactStore, IndexMap, IndexWriter, MetadataBuilder, Orchestrator};
pub use adapters::{ContentPublisher, MemoryPublisher, RecordSource, StaticSource};
pub use config::{Config, PipelineSettings};
pub use domain::{
    ContentAddress, FetchError, Metadata, PipelineError, RawRecord, RecordError, RecordOutcome,
    RunOutcome, RunReport,
};
