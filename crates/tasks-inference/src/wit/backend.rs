//! wit.ai `/message` client implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use tasks_core::defaults::{INFERENCE_HTTP_TIMEOUT_SECS, WIT_API_VERSION, WIT_URL};
use tasks_core::{Error, InferenceClient, InferenceResult, MessageOptions, Result};

use super::error::{to_tasks_error, WitErrorCode};
use super::types::WitErrorResponse;

/// Configuration for the wit.ai client.
#[derive(Debug, Clone)]
pub struct WitConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// Server access token. Checked per request, not at construction.
    pub access_token: Option<String>,
    /// API version date sent as `v`.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for WitConfig {
    fn default() -> Self {
        Self {
            base_url: WIT_URL.to_string(),
            access_token: None,
            api_version: WIT_API_VERSION.to_string(),
            timeout_seconds: INFERENCE_HTTP_TIMEOUT_SECS,
        }
    }
}

impl WitConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `WIT_BASE_URL` | `https://api.wit.ai` | API endpoint |
    /// | `WIT_ACCESS_TOKEN` | (none) | Server access token |
    /// | `WIT_API_VERSION` | `20160526` | API version date |
    /// | `WIT_TIMEOUT` | `30` | HTTP timeout (seconds) |
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("WIT_BASE_URL").unwrap_or_else(|_| WIT_URL.to_string()),
            access_token: std::env::var("WIT_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            api_version: std::env::var("WIT_API_VERSION")
                .unwrap_or_else(|_| WIT_API_VERSION.to_string()),
            timeout_seconds: std::env::var("WIT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(INFERENCE_HTTP_TIMEOUT_SECS),
        }
    }

    /// Set the access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Client for the wit.ai natural-language API.
pub struct WitClient {
    client: Client,
    config: WitConfig,
}

impl WitClient {
    /// Create a new client with the given configuration.
    pub fn new(config: WitConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            api_version = %config.api_version,
            has_token = config.access_token.is_some(),
            "Initializing wit.ai client"
        );
        if config.access_token.is_none() {
            warn!("No wit.ai access token configured; every request will fail");
        }

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(WitConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &WitConfig {
        &self.config
    }

    /// Build an authenticated `/message` request.
    fn build_request(&self, text: &str, options: &MessageOptions) -> Result<reqwest::RequestBuilder> {
        let token = self
            .config
            .access_token
            .as_deref()
            .ok_or_else(|| Error::Config("wit.ai access token is not configured".to_string()))?;

        let url = format!("{}/message", self.config.base_url.trim_end_matches('/'));
        let mut query: Vec<(&str, String)> = vec![
            ("v", self.config.api_version.clone()),
            ("q", text.to_string()),
        ];
        if let Some(ref context) = options.context {
            query.push(("context", serde_json::to_string(context)?));
        }
        if let Some(n) = options.n {
            query.push(("n", n.to_string()));
        }

        Ok(self
            .client
            .get(&url)
            .query(&query)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json"))
    }
}

#[async_trait]
impl InferenceClient for WitClient {
    async fn message(&self, text: &str, options: &MessageOptions) -> Result<InferenceResult> {
        let request = self.build_request(text, options)?;
        let start = Instant::now();

        debug!(text_len = text.len(), op = "message", "Sending wit.ai request");

        let response = request
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: WitErrorResponse = serde_json::from_str(&body)
                .unwrap_or_else(|_| WitErrorResponse::unknown(&body));
            let code = WitErrorCode::from_response(status.as_u16(), parsed.code.as_deref());
            return Err(to_tasks_error(
                code,
                &format!("wit.ai returned {}: {}", status, parsed.error),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("Failed to read response: {}", e)))?;
        trace!(body = %body, "wit.ai response");

        let result: InferenceResult = serde_json::from_str(&body)
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            entity_kinds = result.entities.as_ref().map_or(0, |e| e.len()),
            "wit.ai response received"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "wit"
    }
}
