//! Mutation scope handed to scoped-write mutators.
//!
//! A [`WriteScope`] wraps the staged copy of one record collection. Store
//! implementations create it over a private copy, run the mutator, and only
//! publish the copy (and the resulting [`ChangeSet`]) when the mutator
//! returns `Ok`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{ChangeNotification, TaskRecord, WriteOrigin};

/// Positions touched by one committed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Positions in the collection after the write.
    pub insertions: Vec<usize>,
    /// Positions in the collection after the write.
    pub modifications: Vec<usize>,
    /// Positions in the collection before the write.
    pub deletions: Vec<usize>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.modifications.is_empty() && self.deletions.is_empty()
    }

    pub fn into_notification(
        self,
        record_type: impl Into<String>,
        origin: WriteOrigin,
    ) -> ChangeNotification {
        ChangeNotification {
            record_type: record_type.into(),
            insertions: self.insertions,
            modifications: self.modifications,
            deletions: self.deletions,
            origin,
        }
    }
}

/// Staged mutation of one record collection.
pub struct WriteScope<'a> {
    records: &'a mut Vec<TaskRecord>,
    original_ids: Vec<Uuid>,
    inserted: HashSet<Uuid>,
    modified: HashSet<Uuid>,
    deleted: HashSet<Uuid>,
}

impl<'a> WriteScope<'a> {
    /// Open a scope over a staged collection.
    pub fn new(records: &'a mut Vec<TaskRecord>) -> Self {
        let original_ids = records.iter().map(|r| r.id).collect();
        Self {
            records,
            original_ids,
            inserted: HashSet::new(),
            modified: HashSet::new(),
            deleted: HashSet::new(),
        }
    }

    /// Number of records currently in the staged collection.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a record by ID.
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Read a record by ID.
    pub fn get(&self, id: Uuid) -> Option<&TaskRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Append a record to the collection.
    pub fn insert(&mut self, record: TaskRecord) -> Uuid {
        let id = record.id;
        self.inserted.insert(id);
        self.records.push(record);
        id
    }

    /// Append a new task with the given text.
    pub fn insert_task(&mut self, text: impl Into<String>) -> Uuid {
        self.insert(TaskRecord::new(text))
    }

    pub fn set_text(&mut self, id: Uuid, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.update(id, |r| {
            if r.text == text {
                return false;
            }
            r.text = text;
            true
        })
    }

    pub fn set_completed(&mut self, id: Uuid, completed: bool) -> Result<()> {
        self.update(id, |r| {
            if r.completed == completed {
                return false;
            }
            r.completed = completed;
            true
        })
    }

    pub fn set_date(&mut self, id: Uuid, date: Option<DateTime<Utc>>) -> Result<()> {
        self.update(id, |r| {
            if r.date == date {
                return false;
            }
            r.date = date;
            true
        })
    }

    /// Remove a record from the collection.
    pub fn delete(&mut self, id: Uuid) -> Result<TaskRecord> {
        let pos = self.position(id).ok_or(Error::RecordNotFound(id))?;
        let record = self.records.remove(pos);
        self.modified.remove(&id);
        if !self.inserted.remove(&id) {
            self.deleted.insert(id);
        }
        Ok(record)
    }

    fn update(&mut self, id: Uuid, apply: impl FnOnce(&mut TaskRecord) -> bool) -> Result<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(Error::RecordNotFound(id))?;
        if apply(record) {
            self.modified.insert(id);
        }
        Ok(())
    }

    /// Close the scope and compute the touched positions.
    pub fn finish(self) -> ChangeSet {
        let deletions = self
            .original_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| self.deleted.contains(id))
            .map(|(i, _)| i)
            .collect();

        let mut insertions = Vec::new();
        let mut modifications = Vec::new();
        for (i, record) in self.records.iter().enumerate() {
            if self.inserted.contains(&record.id) {
                insertions.push(i);
            } else if self.modified.contains(&record.id) {
                modifications.push(i);
            }
        }

        ChangeSet {
            insertions,
            modifications,
            deletions,
        }
    }
}
