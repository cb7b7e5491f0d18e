//! Structured logging field name constants for tasks-enrich.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | An enrichment attempt failed (request, parse, write) |
//! | WARN  | Recoverable issue: stale index, lagged change feed |
//! | INFO  | Lifecycle events, written dates, "no date found" outcomes |
//! | DEBUG | Decision points, dispatched attempts, config choices |
//! | TRACE | Raw inference responses |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "inference", "enrich"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "observer", "enricher", "wit", "memory_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "on_change", "enrich", "message", "perform_write"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Record UUID being operated on.
pub const RECORD_ID: &str = "record_id";

/// Record type name of a notification or write.
pub const RECORD_TYPE: &str = "record_type";

/// Position of a record within a notification snapshot.
pub const INDEX: &str = "index";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of enrichment attempts dispatched for one notification.
pub const DISPATCHED: &str = "dispatched";

/// Byte length of the text sent for inference.
pub const TEXT_LEN: &str = "text_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Extracted date written to a record.
pub const DATE: &str = "date";

/// Failure kind of an abandoned attempt.
pub const FAILURE_KIND: &str = "failure_kind";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
