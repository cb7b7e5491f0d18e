//! # tasks-enrich
//!
//! Change-driven enrichment of task records.
//!
//! This crate provides:
//! - [`ChangeObserver`]: resolves change notification indices to records and
//!   dispatches one fire-and-forget enrichment attempt per record
//! - [`RecordEnricher`]: calls the inference service, extracts the first
//!   date/time entity and writes it back in a scoped write
//! - [`EnrichmentService`]: subscribes to a store's change feed and drives
//!   the observer until shut down
//! - Environment configuration and tracing bootstrap
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tasks_enrich::{EnrichConfig, EnrichmentService};
//! use tasks_inference::WitClient;
//! use tasks_store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let service = EnrichmentService::builder(store.clone(), Arc::new(WitClient::from_env()?))
//!     .with_config(EnrichConfig::load())
//!     .build();
//!
//! let handle = service.start();
//! store.insert_tasks(["remind me tomorrow at 5pm"])?;
//!
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! handle.shutdown().await?;
//! ```

pub mod config;
pub mod enricher;
pub mod events;
pub mod observer;
pub mod service;
pub mod telemetry;

// Re-export core types
pub use tasks_core::*;

pub use config::EnrichConfig;
pub use enricher::RecordEnricher;
pub use events::EnrichmentEvent;
pub use observer::ChangeObserver;
pub use service::{EnrichmentService, ServiceBuilder, ServiceHandle};
pub use telemetry::{init_tracing, LogConfig, LogFormat, TelemetryError};
