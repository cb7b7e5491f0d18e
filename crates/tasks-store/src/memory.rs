//! In-memory record store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

use tasks_core::defaults::{CHANGE_FEED_CAPACITY, TASK_RECORD_TYPE};
use tasks_core::{
    ChangeNotification, ChangeSet, Error, Mutator, RecordStore, RecordStoreExt, Result,
    TaskRecord, WriteOrigin, WriteScope,
};

type Collections = HashMap<String, Vec<TaskRecord>>;

/// Record store holding every collection in process.
///
/// Clones share the same collections and change feed.
#[derive(Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    tx: broadcast::Sender<ChangeNotification>,
}

impl MemoryStore {
    /// Create an empty store with the default change feed capacity.
    pub fn new() -> Self {
        Self::with_capacity(CHANGE_FEED_CAPACITY)
    }

    /// Create an empty store whose change feed buffers `capacity` notifications.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    /// Insert task records in one client write, returning their IDs.
    pub fn insert_tasks<I, T>(&self, texts: I) -> Result<Vec<Uuid>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        self.write(TASK_RECORD_TYPE, WriteOrigin::Client, move |scope| {
            Ok(texts.into_iter().map(|t| scope.insert_task(t)).collect())
        })
    }

    /// Replace a task's text in one client write.
    pub fn set_task_text(&self, id: Uuid, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.write(TASK_RECORD_TYPE, WriteOrigin::Client, move |scope| {
            scope.set_text(id, text)
        })
    }

    /// Look up a task by ID.
    pub fn task(&self, id: Uuid) -> Result<Option<TaskRecord>> {
        let collections = self.read()?;
        Ok(collections
            .get(TASK_RECORD_TYPE)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned()))
    }

    /// Number of records of a type.
    pub fn count(&self, record_type: &str) -> Result<usize> {
        Ok(self.read()?.get(record_type).map_or(0, Vec::len))
    }

    /// Number of live change feed subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| Error::Store("record store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.tx.subscribe()
    }

    fn snapshot(&self, record_type: &str) -> Result<Vec<TaskRecord>> {
        Ok(self.read()?.get(record_type).cloned().unwrap_or_default())
    }

    fn record_at(&self, record_type: &str, index: usize) -> Result<Option<TaskRecord>> {
        Ok(self
            .read()?
            .get(record_type)
            .and_then(|records| records.get(index).cloned()))
    }

    fn perform_write(
        &self,
        record_type: &str,
        origin: WriteOrigin,
        mutator: &mut Mutator<'_>,
    ) -> Result<ChangeSet> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::Store("record store lock poisoned".to_string()))?;

        // Stage on a copy so a failing mutator discards everything.
        let mut staged = collections.get(record_type).cloned().unwrap_or_default();
        let mut scope = WriteScope::new(&mut staged);
        if let Err(e) = mutator(&mut scope) {
            debug!(record_type, ?origin, error = %e, "Scoped write aborted");
            return Err(e);
        }
        let changes = scope.finish();

        collections.insert(record_type.to_string(), staged);

        if !changes.is_empty() {
            trace!(
                record_type,
                ?origin,
                insertions = changes.insertions.len(),
                modifications = changes.modifications.len(),
                deletions = changes.deletions.len(),
                "Scoped write committed"
            );
            // Published under the lock so subscribers see commit order.
            let _ = self
                .tx
                .send(changes.clone().into_notification(record_type, origin));
        }

        Ok(changes)
    }
}
