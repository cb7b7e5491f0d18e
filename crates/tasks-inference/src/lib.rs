//! # tasks-inference
//!
//! Natural-language inference clients for tasks-enrich.
//!
//! This crate provides:
//! - The wit.ai `/message` client (default, feature `wit`)
//! - Status-code error mapping for the wit.ai API
//! - A scripted mock client (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use tasks_inference::WitClient;
//! use tasks_core::{InferenceClient, MessageOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = WitClient::from_env().unwrap();
//!     let result = client
//!         .message("remind me tomorrow at 5pm", &MessageOptions::default())
//!         .await
//!         .unwrap();
//!     println!("{:?}", result.first_datetime());
//! }
//! ```

#[cfg(feature = "wit")]
pub mod wit;

// Mock inference client for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use tasks_core::*;

#[cfg(feature = "wit")]
pub use wit::{WitClient, WitConfig};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockInferenceClient;
