//! Enrichment lifecycle events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use tasks_core::FailureKind;

/// Event emitted by the enrichment pipeline.
///
/// Delivered over a broadcast channel; slow subscribers may lag and miss
/// events, the pipeline itself never waits on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum EnrichmentEvent {
    /// The subscription loop is running.
    ServiceStarted,
    /// The subscription loop exited.
    ServiceStopped,
    /// An enrichment attempt was spawned for a resolved record.
    Dispatched { record_id: Uuid, index: usize },
    /// An extracted date was committed onto a record.
    DateWritten {
        record_id: Uuid,
        date: DateTime<Utc>,
    },
    /// Inference returned no usable date/time entity.
    NoDate { record_id: Uuid },
    /// The record had no text to send.
    Skipped { record_id: Uuid },
    /// A notification index no longer mapped to a record.
    ResolutionFailed { record_type: String, index: usize },
    /// The change feed overflowed; `missed` notifications were dropped and
    /// the watched collection is being rescanned for undated records.
    FeedLagged { missed: u64 },
    /// An attempt was abandoned.
    Failed {
        record_id: Uuid,
        kind: FailureKind,
        error: String,
    },
}

impl EnrichmentEvent {
    /// Record the event concerns, if any.
    pub fn record_id(&self) -> Option<Uuid> {
        match self {
            Self::Dispatched { record_id, .. }
            | Self::DateWritten { record_id, .. }
            | Self::NoDate { record_id }
            | Self::Skipped { record_id }
            | Self::Failed { record_id, .. } => Some(*record_id),
            Self::ServiceStarted
            | Self::ServiceStopped
            | Self::ResolutionFailed { .. }
            | Self::FeedLagged { .. } => None,
        }
    }

    /// True for events that end an enrichment attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::DateWritten { .. } | Self::NoDate { .. } | Self::Skipped { .. } | Self::Failed { .. }
        )
    }
}
