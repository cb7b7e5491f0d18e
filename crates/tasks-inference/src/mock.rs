//! Mock inference client for deterministic testing.
//!
//! Responses are scripted per input text; unknown texts get the default
//! response (no entities). Failures, latency and one-shot queued responses
//! let pipeline tests drive every enrichment outcome.
//!
//! ## Usage
//!
//! ```ignore
//! use tasks_inference::mock::MockInferenceClient;
//! use tasks_core::{InferenceClient, MessageOptions};
//!
//! #[tokio::test]
//! async fn test_with_mock_client() {
//!     let client = MockInferenceClient::new()
//!         .with_datetime("remind me tomorrow at 5pm", "2024-01-02T17:00:00Z");
//!
//!     let result = client
//!         .message("remind me tomorrow at 5pm", &MessageOptions::default())
//!         .await
//!         .unwrap();
//!     assert_eq!(client.call_count(), 1);
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tasks_core::defaults::DATETIME_ENTITY;
use tasks_core::{Entity, Error, InferenceClient, InferenceResult, MessageOptions, Result};

/// Mock inference client for testing.
#[derive(Clone)]
pub struct MockInferenceClient {
    config: Arc<MockConfig>,
    queued: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    responses: HashMap<String, InferenceResult>,
    failures: HashMap<String, String>,
    default_response: InferenceResult,
    latency_ms: u64,
    failure_rate: f64,
}

#[derive(Debug, Clone)]
struct Scripted {
    latency_ms: u64,
    response: std::result::Result<InferenceResult, String>,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub text: String,
    pub options: MessageOptions,
    pub timestamp: std::time::Instant,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            responses: HashMap::new(),
            failures: HashMap::new(),
            default_response: InferenceResult::with_entities(DATETIME_ENTITY, Vec::new()),
            latency_ms: 0,
            failure_rate: 0.0,
        }
    }
}

impl MockInferenceClient {
    /// Create a new mock client with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            queued: Arc::new(Mutex::new(HashMap::new())),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond to `text` with a single datetime entity.
    pub fn with_datetime(self, text: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_response(
            text,
            InferenceResult::with_entities(DATETIME_ENTITY, vec![Entity::with_value(value)]),
        )
    }

    /// Respond to `text` with a fixed result.
    pub fn with_response(mut self, text: impl Into<String>, result: InferenceResult) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(text.into(), result);
        self
    }

    /// Result returned for texts without a mapping.
    pub fn with_default_response(mut self, result: InferenceResult) -> Self {
        Arc::make_mut(&mut self.config).default_response = result;
        self
    }

    /// Fail every request for `text` with a request error.
    pub fn with_failure(mut self, text: impl Into<String>, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failures
            .insert(text.into(), message.into());
        self
    }

    /// Set simulated latency for all requests.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Queue a one-shot response for `text`, consumed in FIFO order before
    /// any fixed mapping applies.
    pub fn with_queued_response(
        self,
        text: impl Into<String>,
        latency_ms: u64,
        result: InferenceResult,
    ) -> Self {
        self.queue(text.into(), latency_ms, Ok(result));
        self
    }

    /// Queue a one-shot request failure for `text`, consumed in the same
    /// FIFO order as queued responses.
    pub fn with_queued_failure(
        self,
        text: impl Into<String>,
        latency_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        self.queue(text.into(), latency_ms, Err(message.into()));
        self
    }

    fn queue(&self, text: String, latency_ms: u64, response: std::result::Result<InferenceResult, String>) {
        self.queued
            .lock()
            .unwrap()
            .entry(text)
            .or_default()
            .push_back(Scripted {
                latency_ms,
                response,
            });
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Number of requests received for `text`.
    pub fn calls_for(&self, text: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.text == text)
            .count()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    fn log_call(&self, text: &str, options: &MessageOptions) {
        self.call_log.lock().unwrap().push(MockCall {
            text: text.to_string(),
            options: options.clone(),
            timestamp: std::time::Instant::now(),
        });
    }

    fn should_fail(&self) -> bool {
        use rand::Rng;
        if self.config.failure_rate > 0.0 {
            rand::thread_rng().gen::<f64>() < self.config.failure_rate
        } else {
            false
        }
    }

    async fn simulate_latency(latency_ms: u64) {
        if latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(latency_ms)).await;
        }
    }

    async fn respond(&self, text: &str) -> std::result::Result<InferenceResult, MockError> {
        let scripted = self
            .queued
            .lock()
            .unwrap()
            .get_mut(text)
            .and_then(VecDeque::pop_front);
        if let Some(scripted) = scripted {
            Self::simulate_latency(scripted.latency_ms).await;
            return scripted.response.map_err(MockError::Scripted);
        }

        Self::simulate_latency(self.config.latency_ms).await;

        if let Some(message) = self.config.failures.get(text) {
            return Err(MockError::Scripted(message.clone()));
        }
        if self.should_fail() {
            return Err(MockError::SimulatedFailure);
        }

        Ok(self
            .config
            .responses
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.config.default_response.clone()))
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn message(&self, text: &str, options: &MessageOptions) -> Result<InferenceResult> {
        self.log_call(text, options);
        self.respond(text)
            .await
            .map_err(|e| Error::Request(e.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("Simulated failure for testing")]
    SimulatedFailure,
    #[error("{0}")]
    Scripted(String),
}
