//! Core traits for tasks-enrich abstractions.
//!
//! These traits define the interfaces of the two external collaborators of
//! the enrichment pipeline, the record store and the inference service, so
//! concrete implementations stay pluggable and testable.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{Error, Result};
use crate::models::{ChangeNotification, InferenceResult, MessageOptions, TaskRecord, WriteOrigin};
use crate::write_scope::{ChangeSet, WriteScope};

// =============================================================================
// RECORD STORE
// =============================================================================

/// Mutator run inside a scoped write.
pub type Mutator<'m> = dyn FnMut(&mut WriteScope<'_>) -> Result<()> + Send + 'm;

/// Shared record store delivering change notifications.
pub trait RecordStore: Send + Sync {
    /// Register for change notifications. Each receiver gets every
    /// notification committed after the call, in commit order.
    fn subscribe(&self) -> broadcast::Receiver<ChangeNotification>;

    /// Current ordered snapshot of the records of a type.
    fn snapshot(&self, record_type: &str) -> Result<Vec<TaskRecord>>;

    /// Record at a position of the current snapshot.
    fn record_at(&self, record_type: &str, index: usize) -> Result<Option<TaskRecord>> {
        Ok(self.snapshot(record_type)?.into_iter().nth(index))
    }

    /// Apply `mutator` to the records of `record_type` atomically.
    ///
    /// Either every mutation is committed and a notification describing the
    /// change is published, or (when the mutator fails) nothing is.
    /// Concurrent readers never observe a partially applied write.
    fn perform_write(
        &self,
        record_type: &str,
        origin: WriteOrigin,
        mutator: &mut Mutator<'_>,
    ) -> Result<ChangeSet>;
}

/// Convenience wrappers over [`RecordStore::perform_write`].
pub trait RecordStoreExt: RecordStore {
    /// Run a one-shot mutator that produces a value.
    fn write<T, F>(&self, record_type: &str, origin: WriteOrigin, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut WriteScope<'_>) -> Result<T> + Send,
    {
        let mut f = Some(f);
        let mut out = None;
        self.perform_write(record_type, origin, &mut |scope| {
            let f = f
                .take()
                .ok_or_else(|| Error::Internal("write mutator invoked twice".to_string()))?;
            out = Some(f(scope)?);
            Ok(())
        })?;
        out.ok_or_else(|| Error::Internal("write mutator never ran".to_string()))
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}

// =============================================================================
// INFERENCE
// =============================================================================

/// Natural-language entity extraction service.
///
/// Retries, rate limiting and authentication are the implementation's
/// concern; callers treat any `Err` as a failed request.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Extract entities from free text.
    async fn message(&self, text: &str, options: &MessageOptions) -> Result<InferenceResult>;

    /// Short name of the backend for logs.
    fn name(&self) -> &str;
}
