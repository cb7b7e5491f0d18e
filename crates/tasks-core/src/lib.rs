//! # tasks-core
//!
//! Core types, traits, and abstractions for the tasks-enrich pipeline.
//!
//! This crate provides the task record model, the change notification shape
//! delivered by record stores, the inference response schema, and the trait
//! seams ([`RecordStore`], [`InferenceClient`]) that the store, inference and
//! enrichment crates plug into.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod temporal;
pub mod traits;
pub mod write_scope;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use temporal::parse_timestamp;
pub use traits::*;
pub use write_scope::{ChangeSet, WriteScope};
