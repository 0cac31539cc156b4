//! Per-record and per-run outcomes.
//!
//! Each record walks `Fetched -> MetadataBuilt -> Published -> EncodedAndIndexed`
//! and either reaches the end or stops with a [`RecordError`]. Skips are
//! values, not errors, so callers see the distinction in the types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::index::IndexMap;

use super::error::RecordError;
use super::metadata::PublishedProperty;

/// Stages a record passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStage {
    Fetched,
    MetadataBuilt,
    Published,
    EncodedAndIndexed,
}

/// Terminal state of one record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    /// Encoded into the payload and present in the index
    Indexed(PublishedProperty),

    /// Dropped after reaching `stage`
    Skipped {
        stage: RecordStage,
        reason: RecordError,
    },
}

/// What happened to a single fetched record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    /// Position in fetch order
    pub position: usize,

    /// Upstream identifier as text
    pub identifier: String,

    pub state: RecordState,
}

impl RecordOutcome {
    pub fn indexed(position: usize, identifier: String, property: PublishedProperty) -> Self {
        Self {
            position,
            identifier,
            state: RecordState::Indexed(property),
        }
    }

    pub fn skipped(
        position: usize,
        identifier: String,
        stage: RecordStage,
        reason: RecordError,
    ) -> Self {
        Self {
            position,
            identifier,
            state: RecordState::Skipped { stage, reason },
        }
    }

    /// Last stage this record reached
    pub fn stage(&self) -> RecordStage {
        match &self.state {
            RecordState::Indexed(_) => RecordStage::EncodedAndIndexed,
            RecordState::Skipped { stage, .. } => *stage,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.state, RecordState::Indexed(_))
    }

    pub fn skip_reason(&self) -> Option<&RecordError> {
        match &self.state {
            RecordState::Skipped { reason, .. } => Some(reason),
            RecordState::Indexed(_) => None,
        }
    }
}

/// Result of a run that processed at least one record
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// One outcome per fetched record, in fetch order
    pub outcomes: Vec<RecordOutcome>,

    /// estateID -> content address, processing order
    pub index: IndexMap,

    /// ABI `bytes[]` of every indexed record's entry
    pub payload: Vec<u8>,
}

impl RunReport {
    /// Properties that reached the end of the pipeline, in order
    pub fn properties(&self) -> impl Iterator<Item = &PublishedProperty> {
        self.outcomes.iter().filter_map(|o| match &o.state {
            RecordState::Indexed(property) => Some(property),
            RecordState::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.is_indexed())
    }

    pub fn indexed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_indexed()).count()
    }

    /// Skip counts keyed by [`RecordError::kind`]
    pub fn skip_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for reason in self.outcomes.iter().filter_map(RecordOutcome::skip_reason) {
            *summary.entry(reason.kind()).or_insert(0) += 1;
        }
        summary
    }
}

/// How a run ended when no fatal error occurred
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The page was empty; nothing was encoded or indexed
    NoProperties { run_id: Uuid },

    Completed(RunReport),
}

impl RunOutcome {
    pub fn run_id(&self) -> Uuid {
        match self {
            RunOutcome::NoProperties { run_id } => *run_id,
            RunOutcome::Completed(report) => report.run_id,
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::NoProperties { .. } => None,
        }
    }

    /// Aggregate payload, absent when there were no properties
    pub fn payload(&self) -> Option<&[u8]> {
        self.report().map(|r| r.payload.as_slice())
    }
}
