//! Change notification handling.

use tokio::sync::broadcast;
use tracing::{debug, error, trace, warn};

use tasks_core::{ChangeNotification, Error, RecordStore, ResolvedRecord, WriteOrigin};

use crate::enricher::RecordEnricher;
use crate::events::EnrichmentEvent;

/// Turns change notifications into enrichment attempts.
///
/// Resolution happens synchronously against one snapshot taken when the
/// notification is handled; the attempts themselves run detached.
#[derive(Clone)]
pub struct ChangeObserver {
    enricher: RecordEnricher,
    enrich_insertions: bool,
}

impl ChangeObserver {
    pub fn new(enricher: RecordEnricher, enrich_insertions: bool) -> Self {
        Self {
            enricher,
            enrich_insertions,
        }
    }

    /// Subscribe to enrichment events.
    pub fn events(&self) -> broadcast::Receiver<EnrichmentEvent> {
        self.enricher.events()
    }

    pub fn enricher(&self) -> &RecordEnricher {
        &self.enricher
    }

    /// Handle one notification, returning the number of attempts dispatched.
    ///
    /// Must run inside a tokio runtime. Does not wait for the attempts.
    pub fn on_change(&self, notification: &ChangeNotification) -> usize {
        let resolved = self.resolve(notification);
        let dispatched = resolved.len();

        for record in resolved {
            self.enricher.dispatch(record);
        }

        if dispatched > 0 {
            debug!(
                record_type = %notification.record_type,
                dispatched,
                op = "on_change",
                "Dispatched enrichment attempts"
            );
        }
        dispatched
    }

    /// Map a notification's indices to records of the current snapshot.
    ///
    /// All indices of one notification resolve against a single snapshot,
    /// never per-index `record_at` lookups that could straddle a write.
    ///
    /// Indices past the end of the snapshot are reported as resolution
    /// failures and skipped; the remaining indices are still resolved.
    pub fn resolve(&self, notification: &ChangeNotification) -> Vec<ResolvedRecord> {
        let record_type = self.enricher.record_type();
        if notification.record_type != record_type {
            trace!(record_type = %notification.record_type, "Ignoring unwatched record type");
            return Vec::new();
        }
        if notification.origin == WriteOrigin::Enrichment {
            trace!("Ignoring enrichment write-back");
            return Vec::new();
        }

        let mut indices: Vec<usize> = notification.modifications.clone();
        if self.enrich_insertions {
            indices.extend_from_slice(&notification.insertions);
        }
        if indices.is_empty() {
            return Vec::new();
        }

        let snapshot = match self.store().snapshot(record_type) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(record_type, error = %e, "Failed to read snapshot");
                return Vec::new();
            }
        };

        let mut resolved = Vec::with_capacity(indices.len());
        for index in indices {
            match snapshot.get(index) {
                Some(record) => resolved.push(ResolvedRecord::from_record(index, record)),
                None => {
                    let err = Error::Resolution {
                        record_type: record_type.to_string(),
                        index,
                        len: snapshot.len(),
                    };
                    warn!(record_type, index, failure_kind = "resolution", error = %err, "Stale change index");
                    self.enricher.emit(EnrichmentEvent::ResolutionFailed {
                        record_type: record_type.to_string(),
                        index,
                    });
                }
            }
        }
        resolved
    }

    /// Dispatch an attempt for every watched record that has no date yet.
    ///
    /// Used to recover after change notifications were dropped. Records
    /// with empty text are left alone.
    pub fn rescan(&self) -> usize {
        let record_type = self.enricher.record_type();
        let snapshot = match self.store().snapshot(record_type) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(record_type, error = %e, "Failed to read snapshot for rescan");
                return 0;
            }
        };

        let mut dispatched = 0;
        for (index, record) in snapshot.iter().enumerate() {
            if record.date.is_some() || record.text.trim().is_empty() {
                continue;
            }
            self.enricher
                .dispatch(ResolvedRecord::from_record(index, record));
            dispatched += 1;
        }
        debug!(record_type, dispatched, op = "rescan", "Rescanned watched records");
        dispatched
    }

    fn store(&self) -> &dyn RecordStore {
        self.enricher.store()
    }
}
