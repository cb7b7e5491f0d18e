//! Enrichment pipeline configuration.

use std::time::Duration;

use tokio::sync::Semaphore;

use tasks_core::defaults::{ENRICH_TIMEOUT_SECS, EVENT_BUS_CAPACITY, TASK_RECORD_TYPE};

/// Configuration for the observer, enricher and service loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    /// Record type whose changes trigger enrichment.
    pub record_type: String,
    /// Upper bound on one inference call in seconds.
    pub inference_timeout_secs: u64,
    /// Maximum concurrent enrichment attempts; `None` is unbounded.
    pub max_in_flight: Option<usize>,
    /// Also enrich newly inserted records, not only modified ones.
    pub enrich_insertions: bool,
    /// Capacity of the enrichment event channel.
    pub event_capacity: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            record_type: TASK_RECORD_TYPE.to_string(),
            inference_timeout_secs: ENRICH_TIMEOUT_SECS,
            max_in_flight: None,
            enrich_insertions: false,
            event_capacity: EVENT_BUS_CAPACITY,
        }
    }
}

impl EnrichConfig {
    /// Load `.env` (if present) and read the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ENRICH_RECORD_TYPE` | `Task` | Watched record type |
    /// | `ENRICH_TIMEOUT_SECS` | `10` | Inference call time bound |
    /// | `ENRICH_MAX_IN_FLIGHT` | (unbounded) | Concurrent attempt cap, `0` = unbounded |
    /// | `ENRICH_INSERTIONS` | `false` | Enrich inserted records too |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let record_type = lookup("ENRICH_RECORD_TYPE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.record_type);

        let inference_timeout_secs = lookup("ENRICH_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.inference_timeout_secs)
            .max(1);

        let max_in_flight = lookup("ENRICH_MAX_IN_FLIGHT")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .map(|n| n.min(Semaphore::MAX_PERMITS));

        let enrich_insertions = lookup("ENRICH_INSERTIONS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.enrich_insertions);

        Self {
            record_type,
            inference_timeout_secs,
            max_in_flight,
            enrich_insertions,
            event_capacity: defaults.event_capacity,
        }
    }

    /// Set the watched record type.
    pub fn with_record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = record_type.into();
        self
    }

    /// Set the inference time bound.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.inference_timeout_secs = secs.max(1);
        self
    }

    /// Cap concurrent attempts, clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = Some(max.clamp(1, Semaphore::MAX_PERMITS));
        self
    }

    /// Enable or disable enrichment of inserted records.
    pub fn with_enrich_insertions(mut self, enabled: bool) -> Self {
        self.enrich_insertions = enabled;
        self
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = EnrichConfig::default();
        assert_eq!(config.record_type, "Task");
        assert_eq!(config.inference_timeout_secs, 10);
        assert_eq!(config.max_in_flight, None);
        assert!(!config.enrich_insertions);
        assert_eq!(config.inference_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        assert_eq!(EnrichConfig::from_lookup(lookup(&[])), EnrichConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = EnrichConfig::from_lookup(lookup(&[
            ("ENRICH_RECORD_TYPE", "Reminder"),
            ("ENRICH_TIMEOUT_SECS", "3"),
            ("ENRICH_MAX_IN_FLIGHT", "8"),
            ("ENRICH_INSERTIONS", "true"),
        ]));
        assert_eq!(config.record_type, "Reminder");
        assert_eq!(config.inference_timeout_secs, 3);
        assert_eq!(config.max_in_flight, Some(8));
        assert!(config.enrich_insertions);
    }

    #[test]
    fn test_from_lookup_invalid_values_fall_back() {
        let config = EnrichConfig::from_lookup(lookup(&[
            ("ENRICH_RECORD_TYPE", "  "),
            ("ENRICH_TIMEOUT_SECS", "soon"),
            ("ENRICH_MAX_IN_FLIGHT", "0"),
            ("ENRICH_INSERTIONS", "yes please"),
        ]));
        assert_eq!(config.record_type, "Task");
        assert_eq!(config.inference_timeout_secs, 10);
        assert_eq!(config.max_in_flight, None);
        assert!(!config.enrich_insertions);
    }

    #[test]
    fn test_timeout_floor_is_one_second() {
        let config = EnrichConfig::from_lookup(lookup(&[("ENRICH_TIMEOUT_SECS", "0")]));
        assert_eq!(config.inference_timeout_secs, 1);
    }

    #[test]
    fn test_max_in_flight_clamped_to_semaphore_limit() {
        let huge = usize::MAX.to_string();
        let config = EnrichConfig::from_lookup(lookup(&[("ENRICH_MAX_IN_FLIGHT", huge.as_str())]));
        assert_eq!(config.max_in_flight, Some(Semaphore::MAX_PERMITS));

        let built = EnrichConfig::default().with_max_in_flight(usize::MAX);
        assert_eq!(built.max_in_flight, Some(Semaphore::MAX_PERMITS));

        // Building the limiter must not panic.
        let _ = Semaphore::new(built.max_in_flight.unwrap());
    }

    #[test]
    fn test_zero_timeout_builder_floors_to_one_second() {
        let config = EnrichConfig::default().with_timeout_secs(0);
        assert_eq!(config.inference_timeout_secs, 1);
        assert_eq!(config.inference_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_builders() {
        let config = EnrichConfig::default()
            .with_record_type("TaskList")
            .with_timeout_secs(2)
            .with_max_in_flight(0)
            .with_enrich_insertions(true);
        assert_eq!(config.record_type, "TaskList");
        assert_eq!(config.inference_timeout_secs, 2);
        assert_eq!(config.max_in_flight, Some(1));
        assert!(config.enrich_insertions);
    }
}
