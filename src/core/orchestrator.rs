//! Main orchestrator for a pipeline run.
//!
//! Fetches one page, walks every record through metadata, publishing and
//! encoding in fetch order, then builds the aggregate payload and the index.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{ContentPublisher, RecordSource};
use crate::config::PipelineSettings;
use crate::domain::{
    ContentAddress, Metadata, PipelineError, PublishedProperty, RawRecord, RecordError,
    RecordOutcome, RecordStage, RunOutcome, RunReport,
};

use super::artifacts::ArtifactStore;
use super::index::IndexWriter;
use super::metadata::MetadataBuilder;
use super::payload::{self, EncodeError};

/// State owned by one run
struct RunState {
    index: IndexWriter,
    entries: Vec<Vec<u8>>,
    outcomes: Vec<RecordOutcome>,
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    settings: PipelineSettings,
    builder: MetadataBuilder,
    source: Arc<dyn RecordSource>,
    publisher: Arc<dyn ContentPublisher>,
    artifacts: Option<ArtifactStore>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        settings: PipelineSettings,
        source: Arc<dyn RecordSource>,
        publisher: Arc<dyn ContentPublisher>,
    ) -> Self {
        let builder = MetadataBuilder::new(settings.gateway.clone(), settings.image_refs.clone());
        Self {
            settings,
            builder,
            source,
            publisher,
            artifacts: None,
        }
    }

    /// Persist snapshot, metadata files, index and property list to `store`
    pub fn with_artifacts(mut self, store: ArtifactStore) -> Self {
        self.artifacts = Some(store);
        self
    }

    /// Execute one full run.
    ///
    /// Returns `Err` only for fatal failures; skipped records are reported
    /// inside the [`RunReport`].
    #[instrument(skip(self), fields(source = self.source.name(), publisher = self.publisher.name()))]
    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, postal_code = %self.settings.query.postal_code, "Starting run");

        let page = self.source.fetch(&self.settings.query).await?;

        if let Some(store) = &self.artifacts {
            let removed = store.clear_run_artifacts().await?;
            debug!(removed, "Cleared previous run artifacts");
            store.write_snapshot(&page.raw).await?;
        }

        if page.is_empty() {
            info!(%run_id, "No properties found");
            debug!(response = %page.raw, "Full response");
            return Ok(RunOutcome::NoProperties { run_id });
        }

        info!(count = page.records.len(), "Fetched properties");

        let mut state = RunState {
            index: IndexWriter::new(),
            entries: Vec::with_capacity(page.records.len()),
            outcomes: Vec::with_capacity(page.records.len()),
        };

        for (position, record) in page.records.iter().enumerate() {
            let outcome = self.process_record(position, record, &mut state).await?;
            if let Some(reason) = outcome.skip_reason() {
                warn!(
                    position,
                    identifier = %outcome.identifier,
                    stage = ?outcome.stage(),
                    reason = %reason,
                    "Record skipped"
                );
            }
            state.outcomes.push(outcome);
        }

        let payload = payload::encode_aggregate(&state.entries);
        let index_bytes = state.index.flush()?;

        let report = RunReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            outcomes: state.outcomes,
            index: state.index.into_map(),
            payload,
        };

        if let Some(store) = &self.artifacts {
            store.write_index(&index_bytes).await?;
            let properties: Vec<&PublishedProperty> = report.properties().collect();
            store.write_properties(&properties).await?;
        }

        info!(
            %run_id,
            indexed = report.indexed_count(),
            skipped = report.outcomes.len() - report.indexed_count(),
            payload_bytes = report.payload.len(),
            "Run completed"
        );

        Ok(RunOutcome::Completed(report))
    }

    /// Walk one record through the stages.
    ///
    /// Per-record failures become `Skipped` outcomes; only artifact and
    /// serialization failures escape as errors.
    async fn process_record(
        &self,
        position: usize,
        record: &RawRecord,
        state: &mut RunState,
    ) -> Result<RecordOutcome, PipelineError> {
        let identifier = record.identifier_text();
        let skip = |stage: RecordStage, reason: RecordError| {
            RecordOutcome::skipped(position, identifier.clone(), stage, reason)
        };

        // Fetched -> MetadataBuilt
        let metadata = match self.builder.build(record, position) {
            Ok(metadata) => metadata,
            Err(reason) => return Ok(skip(RecordStage::Fetched, reason)),
        };

        let label = metadata.file_name();
        let bytes = metadata.to_json_bytes()?;
        if let Some(store) = &self.artifacts {
            store.write_metadata(&label, &bytes).await?;
        }

        // MetadataBuilt -> Published
        let address = match self.publisher.publish(&bytes, &label).await {
            Ok(address) => address,
            Err(e) => return Ok(skip(RecordStage::MetadataBuilt, e.into())),
        };

        // Published -> EncodedAndIndexed
        let (estate_id, entry) = match encode(&metadata, &address) {
            Ok(encoded) => encoded,
            Err(e) => return Ok(skip(RecordStage::Published, e.into())),
        };

        info!(
            estate_id,
            description = %metadata.description,
            cid = %address,
            "Property published"
        );

        state.entries.push(entry);
        state.index.record(estate_id, address.clone());

        Ok(RecordOutcome::indexed(
            position,
            identifier,
            PublishedProperty::new(metadata, estate_id, address),
        ))
    }
}

fn encode(metadata: &Metadata, address: &ContentAddress) -> Result<(u32, Vec<u8>), EncodeError> {
    let estate_id = payload::checked_id(metadata.estate_id)?;
    let entry = payload::encode_entry(metadata.estate_id, &metadata.description, address.as_str())?;
    Ok((estate_id, entry))
}
