//! wit.ai inference client.
//!
//! Sends free text to the `/message` endpoint and returns the extracted
//! entities. The access token is read at request time, so a client built
//! without one still constructs and fails each call instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use tasks_inference::wit::{WitClient, WitConfig};
//!
//! let client = WitClient::new(WitConfig {
//!     access_token: Some("SERVER_ACCESS_TOKEN".to_string()),
//!     ..WitConfig::default()
//! })
//! .unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{WitClient, WitConfig};
pub use error::{to_tasks_error, WitErrorCode};
pub use types::WitErrorResponse;
