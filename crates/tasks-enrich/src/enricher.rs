//! Per-record enrichment: inference call, date extraction and write-back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, instrument, warn};

use tasks_core::{
    parse_timestamp, DatetimeLookup, EnrichmentOutcome, Error, FailureKind, InferenceClient,
    MessageOptions, RecordStore, RecordStoreExt, ResolvedRecord, WriteOrigin,
};

use crate::config::EnrichConfig;
use crate::events::EnrichmentEvent;

/// Runs enrichment attempts against one store and one inference client.
///
/// Cheap to clone; clones share the store, client, limiter and event channel.
#[derive(Clone)]
pub struct RecordEnricher {
    store: Arc<dyn RecordStore>,
    client: Arc<dyn InferenceClient>,
    record_type: String,
    timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
    event_tx: broadcast::Sender<EnrichmentEvent>,
}

impl RecordEnricher {
    /// Create an enricher with its own event channel.
    pub fn new(
        store: Arc<dyn RecordStore>,
        client: Arc<dyn InferenceClient>,
        config: &EnrichConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self::with_events(store, client, config, event_tx)
    }

    /// Create an enricher publishing on an existing event channel.
    pub fn with_events(
        store: Arc<dyn RecordStore>,
        client: Arc<dyn InferenceClient>,
        config: &EnrichConfig,
        event_tx: broadcast::Sender<EnrichmentEvent>,
    ) -> Self {
        Self {
            store,
            client,
            record_type: config.record_type.clone(),
            timeout: config.inference_timeout(),
            limiter: config
                .max_in_flight
                .map(|n| Arc::new(Semaphore::new(n.clamp(1, Semaphore::MAX_PERMITS)))),
            event_tx,
        }
    }

    /// Record type the enricher writes to.
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub(crate) fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Subscribe to enrichment events.
    pub fn events(&self) -> broadcast::Receiver<EnrichmentEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn emit(&self, event: EnrichmentEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Spawn a detached enrichment attempt.
    ///
    /// Returns immediately; the attempt's outcome is reported through logs
    /// and events only. When `max_in_flight` is set the spawned task waits
    /// for a permit, dispatch itself never blocks.
    pub fn dispatch(&self, record: ResolvedRecord) {
        let enricher = self.clone();
        debug!(
            record_id = %record.id,
            index = record.index,
            op = "dispatch",
            "Dispatching enrichment"
        );
        self.emit(EnrichmentEvent::Dispatched {
            record_id: record.id,
            index: record.index,
        });

        tokio::spawn(async move {
            let _permit = match enricher.limiter.clone() {
                Some(limiter) => match limiter.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };
            enricher.enrich(record).await;
        });
    }

    /// Run one enrichment attempt to completion.
    ///
    /// Never retries and never returns an error: failures are logged,
    /// emitted as [`EnrichmentEvent::Failed`] and leave the record unchanged.
    #[instrument(skip(self, record), fields(record_id = %record.id, index = record.index))]
    pub async fn enrich(&self, record: ResolvedRecord) -> EnrichmentOutcome {
        let start = Instant::now();
        let outcome = self.attempt(&record).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            EnrichmentOutcome::Enriched { date } => {
                info!(
                    record_id = %record.id,
                    date = %date.to_rfc3339(),
                    duration_ms,
                    "Date written to record"
                );
                self.emit(EnrichmentEvent::DateWritten {
                    record_id: record.id,
                    date: *date,
                });
            }
            EnrichmentOutcome::NoDate => {
                info!(record_id = %record.id, duration_ms, "No date found");
                self.emit(EnrichmentEvent::NoDate {
                    record_id: record.id,
                });
            }
            EnrichmentOutcome::SkippedEmpty => {
                debug!(record_id = %record.id, "Skipping record with empty text");
                self.emit(EnrichmentEvent::Skipped {
                    record_id: record.id,
                });
            }
            EnrichmentOutcome::Failed { kind, error } => {
                error!(
                    record_id = %record.id,
                    failure_kind = %kind,
                    error = %error,
                    duration_ms,
                    "Enrichment failed"
                );
                self.emit(EnrichmentEvent::Failed {
                    record_id: record.id,
                    kind: *kind,
                    error: error.clone(),
                });
            }
        }

        outcome
    }

    async fn attempt(&self, record: &ResolvedRecord) -> EnrichmentOutcome {
        if record.text.trim().is_empty() {
            return EnrichmentOutcome::SkippedEmpty;
        }

        debug!(
            text_len = record.text.len(),
            backend = self.client.name(),
            op = "enrich",
            "Requesting entity extraction"
        );

        let options = MessageOptions::default();
        let result = match tokio::time::timeout(
            self.timeout,
            self.client.message(&record.text, &options),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return EnrichmentOutcome::failed(FailureKind::Request, e),
            Err(_) => {
                return EnrichmentOutcome::failed(
                    FailureKind::Timeout,
                    Error::Timeout(self.timeout.as_secs()),
                )
            }
        };

        let value = match result.first_datetime() {
            DatetimeLookup::Found(entity) => match entity.timestamp_value() {
                Some(value) => value.to_string(),
                None => {
                    debug!("First datetime entity has no value");
                    return EnrichmentOutcome::NoDate;
                }
            },
            lookup => {
                debug!(?lookup, "No datetime entity in response");
                return EnrichmentOutcome::NoDate;
            }
        };

        let date = match parse_timestamp(&value) {
            Ok(date) => date,
            Err(e) => return EnrichmentOutcome::failed(FailureKind::Parse, e),
        };

        let id = record.id;
        match self
            .store
            .write(&self.record_type, WriteOrigin::Enrichment, move |scope| {
                scope.set_date(id, Some(date))
            }) {
            Ok(()) => EnrichmentOutcome::Enriched { date },
            Err(e) => {
                if matches!(e, Error::RecordNotFound(_)) {
                    warn!(record_id = %id, "Record deleted before date could be written");
                }
                EnrichmentOutcome::failed(FailureKind::Write, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tasks_core::{
        ChangeNotification, ChangeSet, InferenceResult, Mutator, Result, TaskRecord, WriteScope,
    };
    use tasks_inference::mock::MockInferenceClient;

    /// Minimal store for unit tests; `tests/` exercises the real one.
    struct VecStore {
        records: Mutex<Vec<TaskRecord>>,
        tx: broadcast::Sender<ChangeNotification>,
    }

    impl VecStore {
        fn with_texts(texts: &[&str]) -> Arc<Self> {
            let (tx, _) = broadcast::channel(16);
            Arc::new(Self {
                records: Mutex::new(texts.iter().map(|t| TaskRecord::new(*t)).collect()),
                tx,
            })
        }

        fn resolved(&self, index: usize) -> ResolvedRecord {
            ResolvedRecord::from_record(index, &self.records.lock().unwrap()[index])
        }
    }

    impl RecordStore for VecStore {
        fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
            self.tx.subscribe()
        }

        fn snapshot(&self, _record_type: &str) -> Result<Vec<TaskRecord>> {
            Ok(self.records.lock().unwrap().clone())
        }

        fn perform_write(
            &self,
            _record_type: &str,
            _origin: WriteOrigin,
            mutator: &mut Mutator<'_>,
        ) -> Result<ChangeSet> {
            let mut records = self.records.lock().unwrap();
            let mut staged = records.clone();
            let mut scope = WriteScope::new(&mut staged);
            mutator(&mut scope)?;
            let changes = scope.finish();
            *records = staged;
            Ok(changes)
        }
    }

    struct SlowClient;

    #[async_trait]
    impl InferenceClient for SlowClient {
        async fn message(&self, _text: &str, _options: &MessageOptions) -> Result<InferenceResult> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(InferenceResult::default())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn enricher(store: Arc<VecStore>, client: Arc<dyn InferenceClient>) -> RecordEnricher {
        RecordEnricher::new(store, client, &EnrichConfig::default())
    }

    #[tokio::test]
    async fn test_enrich_writes_date() {
        let store = VecStore::with_texts(&["call mom tomorrow at 5pm"]);
        let client = Arc::new(
            MockInferenceClient::new()
                .with_datetime("call mom tomorrow at 5pm", "2024-01-02T17:00:00.000-08:00"),
        );
        let enricher = enricher(store.clone(), client);

        let outcome = enricher.enrich(store.resolved(0)).await;

        let expected = parse_timestamp("2024-01-03T01:00:00Z").unwrap();
        assert_eq!(outcome, EnrichmentOutcome::Enriched { date: expected });
        assert_eq!(store.snapshot("Task").unwrap()[0].date, Some(expected));
    }

    #[tokio::test]
    async fn test_whitespace_text_is_skipped_without_request() {
        let store = VecStore::with_texts(&["   \n"]);
        let client = Arc::new(MockInferenceClient::new());
        let enricher = enricher(store.clone(), client.clone());

        assert_eq!(enricher.enrich(store.resolved(0)).await, EnrichmentOutcome::SkippedEmpty);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_failure_leaves_record_unchanged() {
        let store = VecStore::with_texts(&["offline"]);
        let client = Arc::new(MockInferenceClient::new().with_failure("offline", "connection refused"));
        let enricher = enricher(store.clone(), client);
        let mut events = enricher.events();

        let outcome = enricher.enrich(store.resolved(0)).await;
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Failed { kind: FailureKind::Request, .. }
        ));
        assert_eq!(store.snapshot("Task").unwrap()[0].date, None);
        assert!(matches!(
            events.try_recv().unwrap(),
            EnrichmentEvent::Failed { kind: FailureKind::Request, .. }
        ));
    }

    #[tokio::test]
    async fn test_unparseable_value_is_parse_failure() {
        let store = VecStore::with_texts(&["someday"]);
        let client = Arc::new(MockInferenceClient::new().with_datetime("someday", "whenever"));
        let enricher = enricher(store.clone(), client);

        let outcome = enricher.enrich(store.resolved(0)).await;
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Failed { kind: FailureKind::Parse, .. }
        ));
        assert_eq!(store.snapshot("Task").unwrap()[0].date, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_reported() {
        let store = VecStore::with_texts(&["tomorrow"]);
        let enricher = enricher(store.clone(), Arc::new(SlowClient));

        match enricher.enrich(store.resolved(0)).await {
            EnrichmentOutcome::Failed { kind, error } => {
                assert_eq!(kind, FailureKind::Timeout);
                assert_eq!(error, "Timed out after 10s");
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_in_flight_limit_builds_enricher() {
        let huge = usize::MAX.to_string();
        let config = EnrichConfig::from_lookup(|key| {
            (key == "ENRICH_MAX_IN_FLIGHT").then(|| huge.clone())
        });
        let store = VecStore::with_texts(&["tomorrow"]);
        let client = Arc::new(MockInferenceClient::new().with_datetime("tomorrow", "2024-01-02T00:00:00Z"));

        let enricher = RecordEnricher::new(store.clone(), client.clone(), &config);
        assert!(enricher.enrich(store.resolved(0)).await.is_enriched());

        // Fields are public; a raw oversized value is clamped as well.
        let raw = EnrichConfig {
            max_in_flight: Some(usize::MAX),
            ..EnrichConfig::default()
        };
        let _ = RecordEnricher::new(store, client, &raw);
    }

    #[tokio::test]
    async fn test_deleted_record_is_write_failure() {
        let store = VecStore::with_texts(&["tomorrow"]);
        let resolved = store.resolved(0);
        store.records.lock().unwrap().clear();

        let client = Arc::new(MockInferenceClient::new().with_datetime("tomorrow", "2024-01-02T00:00:00Z"));
        let outcome = enricher(store.clone(), client).enrich(resolved).await;
        assert!(matches!(
            outcome,
            EnrichmentOutcome::Failed { kind: FailureKind::Write, .. }
        ));
    }
}
