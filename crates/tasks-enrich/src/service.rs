//! Subscription loop driving the observer from a store's change feed.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use tasks_core::{ChangeNotification, Error, InferenceClient, RecordStore, Result};
use tasks_inference::WitClient;

use crate::config::EnrichConfig;
use crate::enricher::RecordEnricher;
use crate::events::EnrichmentEvent;
use crate::observer::ChangeObserver;

/// Handle for controlling a running service.
///
/// Dropping the handle without calling [`ServiceHandle::shutdown`] also stops
/// the loop, but does not wait for it.
pub struct ServiceHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<EnrichmentEvent>,
    join: JoinHandle<()>,
}

impl ServiceHandle {
    /// Signal the loop to stop and wait for it to exit.
    ///
    /// Attempts already dispatched keep running to completion.
    pub async fn shutdown(self) -> Result<()> {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Service loop already stopped");
        }
        self.join
            .await
            .map_err(|e| Error::Internal(format!("Service loop panicked: {}", e)))
    }

    /// Get a receiver for enrichment events.
    pub fn events(&self) -> broadcast::Receiver<EnrichmentEvent> {
        self.event_rx.resubscribe()
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Enrichment service bound to one store and one inference client.
pub struct EnrichmentService {
    store: Arc<dyn RecordStore>,
    observer: ChangeObserver,
    config: EnrichConfig,
}

impl EnrichmentService {
    /// Start building a service.
    pub fn builder(store: Arc<dyn RecordStore>, client: Arc<dyn InferenceClient>) -> ServiceBuilder {
        ServiceBuilder::new(store, client)
    }

    /// Build a service with a wit.ai client and config from the environment.
    pub fn from_env(store: Arc<dyn RecordStore>) -> Result<Self> {
        let config = EnrichConfig::load();
        let client = WitClient::from_env()?;
        Ok(Self::builder(store, Arc::new(client))
            .with_config(config)
            .build())
    }

    /// The observer notifications are routed to.
    pub fn observer(&self) -> &ChangeObserver {
        &self.observer
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Get a receiver for enrichment events.
    pub fn events(&self) -> broadcast::Receiver<EnrichmentEvent> {
        self.observer.events()
    }

    /// Subscribe to the change feed and start the loop.
    ///
    /// The subscription is registered before this returns, so every write
    /// committed afterwards is observed.
    pub fn start(self) -> ServiceHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let event_rx = self.observer.events();
        let changes = self.store.subscribe();

        let join = tokio::spawn(async move {
            self.run(changes, shutdown_rx).await;
        });

        ServiceHandle {
            shutdown_tx,
            event_rx,
            join,
        }
    }

    #[instrument(skip_all)]
    async fn run(
        self,
        mut changes: broadcast::Receiver<ChangeNotification>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        info!(
            inference_timeout_secs = self.config.inference_timeout_secs,
            max_in_flight = ?self.config.max_in_flight,
            enrich_insertions = self.config.enrich_insertions,
            "Enrichment service started"
        );
        self.observer.enricher().emit(EnrichmentEvent::ServiceStarted);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Enrichment service received shutdown signal");
                    break;
                }
                received = changes.recv() => match received {
                    Ok(notification) => {
                        self.observer.on_change(&notification);
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(missed = n, "Change feed lagged, missed notifications");
                        self.observer.enricher().emit(EnrichmentEvent::FeedLagged { missed: n });
                        let dispatched = self.observer.rescan();
                        info!(dispatched, "Rescanned after lagged change feed");
                    }
                    Err(RecvError::Closed) => {
                        info!("Change feed closed, enrichment service stopping");
                        break;
                    }
                }
            }
        }

        self.observer.enricher().emit(EnrichmentEvent::ServiceStopped);
        info!("Enrichment service stopped");
    }
}

/// Builder for an [`EnrichmentService`].
pub struct ServiceBuilder {
    store: Arc<dyn RecordStore>,
    client: Arc<dyn InferenceClient>,
    config: EnrichConfig,
}

impl ServiceBuilder {
    pub fn new(store: Arc<dyn RecordStore>, client: Arc<dyn InferenceClient>) -> Self {
        Self {
            store,
            client,
            config: EnrichConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EnrichConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the service.
    pub fn build(self) -> EnrichmentService {
        debug!(
            backend = self.client.name(),
            record_type = %self.config.record_type,
            "Building enrichment service"
        );
        let enricher = RecordEnricher::new(self.store.clone(), self.client, &self.config);
        let observer = ChangeObserver::new(enricher, self.config.enrich_insertions);
        EnrichmentService {
            store: self.store,
            observer,
            config: self.config,
        }
    }
}
