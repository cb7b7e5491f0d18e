//! Shared helpers for enrichment integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use tasks_enrich::{EnrichConfig, EnrichmentEvent, EnrichmentService, InferenceClient};
use tasks_store::MemoryStore;

pub const EVENT_WAIT: Duration = Duration::from_secs(5);

/// Build a service over a shared store without starting its loop.
pub fn service(
    store: &MemoryStore,
    client: Arc<dyn InferenceClient>,
    config: EnrichConfig,
) -> EnrichmentService {
    EnrichmentService::builder(Arc::new(store.clone()), client)
        .with_config(config)
        .build()
}

/// Receive events until one matches.
pub async fn wait_for<F>(
    rx: &mut broadcast::Receiver<EnrichmentEvent>,
    mut pred: F,
) -> EnrichmentEvent
where
    F: FnMut(&EnrichmentEvent) -> bool,
{
    tokio::time::timeout(EVENT_WAIT, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event channel error: {}", e),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Collect `n` terminal events in arrival order.
pub async fn terminal_events(
    rx: &mut broadcast::Receiver<EnrichmentEvent>,
    n: usize,
) -> Vec<EnrichmentEvent> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        out.push(wait_for(rx, EnrichmentEvent::is_terminal).await);
    }
    out
}
