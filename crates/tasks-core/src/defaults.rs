//! Centralized default constants for tasks-enrich.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// RECORD STORE
// =============================================================================

/// Record type name of task records.
pub const TASK_RECORD_TYPE: &str = "Task";

/// Broadcast capacity of a store's change feed.
pub const CHANGE_FEED_CAPACITY: usize = 256;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default wit.ai API base URL.
pub const WIT_URL: &str = "https://api.wit.ai";

/// Default wit.ai API version, sent as the `v` query parameter.
pub const WIT_API_VERSION: &str = "20160526";

/// HTTP client timeout for inference requests in seconds.
pub const INFERENCE_HTTP_TIMEOUT_SECS: u64 = 30;

/// Entity kind carrying date/time values in inference responses.
pub const DATETIME_ENTITY: &str = "datetime";

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Upper bound on a single enrichment attempt's inference call in seconds.
pub const ENRICH_TIMEOUT_SECS: u64 = 10;

/// Default enrichment event channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;
