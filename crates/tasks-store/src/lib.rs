//! # tasks-store
//!
//! Record store implementations for tasks-enrich.
//!
//! [`MemoryStore`] keeps collections of task records in process, publishes a
//! [`ChangeNotification`](tasks_core::ChangeNotification) on a broadcast
//! channel after every committed write, and implements scoped writes with
//! copy-on-write staging so a failed mutator leaves no trace.

pub mod memory;

// Re-export core types
pub use tasks_core::*;

pub use memory::MemoryStore;
