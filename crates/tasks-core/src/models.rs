//! Core data models for tasks-enrich.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::DATETIME_ENTITY;

// =============================================================================
// RECORD TYPES
// =============================================================================

/// A task record owned by a record store.
///
/// `text` and `completed` are set by client collaborators. `date` is only
/// ever written by the enricher once inference extracts a date/time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Create a new, incomplete task with a fresh UUIDv7 identity.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: text.into(),
            completed: false,
            date: None,
        }
    }
}

/// Which kind of writer committed a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrigin {
    /// UI or sync collaborators editing task data.
    #[default]
    Client,
    /// The enrichment pipeline writing back an extracted date.
    Enrichment,
}

/// One batch of mutations to records of a single type, delivered by the
/// store after a write transaction committed.
///
/// Indices are positions into the store's snapshot of `record_type` at
/// delivery time. Deletion indices refer to the snapshot before the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub record_type: String,
    #[serde(default)]
    pub insertions: Vec<usize>,
    #[serde(default)]
    pub modifications: Vec<usize>,
    #[serde(default)]
    pub deletions: Vec<usize>,
    #[serde(default)]
    pub origin: WriteOrigin,
}

impl ChangeNotification {
    /// Notification carrying only modified positions from a client write.
    pub fn modified(record_type: impl Into<String>, indices: Vec<usize>) -> Self {
        Self {
            record_type: record_type.into(),
            insertions: Vec::new(),
            modifications: indices,
            deletions: Vec::new(),
            origin: WriteOrigin::Client,
        }
    }

    /// Set the origin of the write that produced this notification.
    pub fn with_origin(mut self, origin: WriteOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// True when the notification reports no changes at all.
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.modifications.is_empty() && self.deletions.is_empty()
    }
}

/// Transient handle on a record resolved from a notification index.
///
/// Holds a copy of the text at resolution time; write-back goes through the
/// stable `id`, never the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    pub index: usize,
    pub id: Uuid,
    pub text: String,
}

impl ResolvedRecord {
    pub fn from_record(index: usize, record: &TaskRecord) -> Self {
        Self {
            index,
            id: record.id,
            text: record.text.clone(),
        }
    }
}

// =============================================================================
// INFERENCE SCHEMA
// =============================================================================

/// Options passed alongside the text of an inference request.
///
/// The pipeline always sends the empty default; both fields are omitted from
/// the request when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageOptions {
    /// Context object (timezone, reference time, locale) forwarded verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    /// Maximum number of outcomes to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
}

impl MessageOptions {
    pub fn is_empty(&self) -> bool {
        self.context.is_none() && self.n.is_none()
    }
}

/// Bound of an interval entity (`{"from": {...}, "to": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBound {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub grain: Option<String>,
}

/// One extracted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub grain: Option<String>,
    #[serde(default)]
    pub from: Option<EntityBound>,
    #[serde(default)]
    pub to: Option<EntityBound>,
}

impl Entity {
    /// Entity with a plain value (`{"value": "..."}`).
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            confidence: None,
            kind: Some("value".to_string()),
            grain: None,
            from: None,
            to: None,
        }
    }

    /// The timestamp string carried by this entity.
    ///
    /// Plain entities carry `value`; interval entities carry it on `from`
    /// (falling back to `to` for open-start intervals). Blank strings count
    /// as absent.
    pub fn timestamp_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or_else(|| self.from.as_ref().and_then(|b| b.value.as_deref()))
            .or_else(|| self.to.as_ref().and_then(|b| b.value.as_deref()))
            .filter(|v| !v.trim().is_empty())
    }
}

/// Response of the inference service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    #[serde(default)]
    pub msg_id: Option<String>,
    #[serde(default, rename = "_text", alias = "text")]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Option<HashMap<String, Vec<Entity>>>,
}

/// Result of looking up the first datetime entity of a response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatetimeLookup<'a> {
    /// The response carried no `entities` object.
    NoEntities,
    /// `entities` exists but has no datetime kind.
    NoDatetime,
    /// The datetime kind is present with an empty sequence.
    Empty,
    /// First datetime entity of the sequence.
    Found(&'a Entity),
}

/// Whether an entity key names the datetime kind.
///
/// Accepts the bare `datetime` key and namespaced built-ins such as
/// `wit$datetime:datetime`.
pub fn is_datetime_kind(key: &str) -> bool {
    key == DATETIME_ENTITY || key.starts_with("wit$datetime")
}

impl InferenceResult {
    /// Response with a single entity kind.
    pub fn with_entities(kind: impl Into<String>, entities: Vec<Entity>) -> Self {
        let mut map = HashMap::new();
        map.insert(kind.into(), entities);
        Self {
            msg_id: None,
            text: None,
            entities: Some(map),
        }
    }

    /// Look up the first `datetime` entity.
    ///
    /// The bare `datetime` key wins over namespaced keys so the result is
    /// deterministic regardless of map iteration order.
    pub fn first_datetime(&self) -> DatetimeLookup<'_> {
        let Some(entities) = self.entities.as_ref() else {
            return DatetimeLookup::NoEntities;
        };

        let list = entities.get(DATETIME_ENTITY).or_else(|| {
            let mut keys: Vec<&String> = entities.keys().filter(|k| is_datetime_kind(k)).collect();
            keys.sort();
            keys.first().and_then(|k| entities.get(*k))
        });

        match list {
            None => DatetimeLookup::NoDatetime,
            Some(list) => match list.first() {
                None => DatetimeLookup::Empty,
                Some(entity) => DatetimeLookup::Found(entity),
            },
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Why an enrichment attempt was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network or service-level failure calling the inference service.
    Request,
    /// The inference call exceeded its time bound.
    Timeout,
    /// The extracted value is not a timestamp.
    Parse,
    /// The scoped write was rejected (record gone, store failure).
    Write,
    /// A notification index no longer mapped to a record.
    Resolution,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Timeout => "timeout",
            Self::Parse => "parse",
            Self::Write => "write",
            Self::Resolution => "resolution",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one enrichment attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// The extracted date was committed onto the record.
    Enriched { date: DateTime<Utc> },
    /// Inference succeeded without a usable date/time entity.
    NoDate,
    /// The record had no text to send.
    SkippedEmpty,
    /// The attempt was abandoned; the record is unchanged.
    Failed { kind: FailureKind, error: String },
}

impl EnrichmentOutcome {
    pub fn failed(kind: FailureKind, error: impl ToString) -> Self {
        Self::Failed {
            kind,
            error: error.to_string(),
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, Self::Enriched { .. })
    }
}
