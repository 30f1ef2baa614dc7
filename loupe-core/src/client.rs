//! LLM client — provider abstraction, OpenRouter transport, and the
//! caching/retry wrapper the pipeline talks to.
//!
//! The provider trait is deliberately thin: one prompt in, raw text out.
//! Retry policy and caching live in [`LlmClient`], not in the transport,
//! so a failed retry budget surfaces as a single error at the call site
//! where the degrade decision is made.

use crate::cache::ResponseCache;
use crate::config::{AnalysisConfig, RetryConfig};
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed per-request timeout (seconds).
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// One chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Model override; the provider's configured model when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            max_tokens,
            temperature: 0.7,
        }
    }
}

/// Trait for chat-completion providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Perform a completion and return the model's raw text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    /// Return the configured model name.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// OpenRouter transport
// ---------------------------------------------------------------------------

/// Chat-completions provider for OpenRouter (or any endpoint speaking the
/// same wire format).
pub struct OpenRouterProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    /// Build a provider with the fixed request timeout. Fails if the HTTP
    /// client cannot be constructed; falling back to a default client
    /// would drop the timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Connection {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Map a non-2xx HTTP response to the appropriate error, retaining the
    /// original status and body verbatim.
    fn map_http_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        match status.as_u16() {
            401 => LlmError::AuthFailed { body: body.to_string() },
            429 => {
                // "Rate limit exceeded ... try again in Xs"
                let retry_secs = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| {
                        v.get("error")?
                            .get("message")?
                            .as_str()
                            .map(|s| s.to_string())
                    })
                    .and_then(|msg| {
                        msg.split("in ")
                            .last()
                            .and_then(|s| s.trim_end_matches('s').parse::<u64>().ok())
                    })
                    .unwrap_or(5);
                LlmError::RateLimited {
                    retry_after_secs: retry_secs,
                }
            }
            status => LlmError::ApiRequest {
                status,
                body: body.to_string(),
            },
        }
    }

    /// Pull `choices[0].message.content` out of a response body.
    fn parse_response(body: &Value) -> Result<String, LlmError> {
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::ResponseParse {
                message: "No choices[0].message.content in response".to_string(),
            })
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": [{ "role": "user", "content": request.prompt }],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        debug!(url = %url, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_secs: REQUEST_TIMEOUT_SECS,
                    }
                } else {
                    LlmError::Connection {
                        message: format!("Request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        let response_body = response.text().await.map_err(|e| LlmError::Connection {
            message: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &response_body));
        }

        let body: Value =
            serde_json::from_str(&response_body).map_err(|e| LlmError::ResponseParse {
                message: format!("Invalid JSON: {e}"),
            })?;
        Self::parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Mock provider
// ---------------------------------------------------------------------------

/// A mock provider for testing: returns queued responses in FIFO order.
pub struct MockLlmProvider {
    model: String,
    responses: std::sync::Mutex<Vec<String>>,
    calls: AtomicU64,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: std::sync::Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Create a provider that answers every call with the same text.
    pub fn with_response(text: &str) -> Self {
        let provider = Self::new();
        for _ in 0..20 {
            provider.queue_response(text);
        }
        provider
    }

    /// Override the reported model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Queue a response for the next `complete` call.
    pub fn queue_response(&self, text: &str) {
        self.responses.lock().unwrap().push(text.to_string());
    }

    /// Number of `complete` calls that reached this provider.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("{}".to_string())
        } else {
            Ok(responses.remove(0))
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Caching / retrying client
// ---------------------------------------------------------------------------

/// Snapshot of LLM call accounting for a run, surfaced in the results
/// bundle so operators can spot systemic API failure without reading logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStats {
    /// Logical requests issued (cache hits included).
    pub requests: u64,
    /// Requests that exhausted their retry budget or failed hard.
    pub failures: u64,
    /// Requests answered from the response cache.
    pub cache_hits: u64,
}

/// The client the pipeline uses: provider + content-addressed cache +
/// bounded retry with exponential backoff.
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    cache: Option<ResponseCache>,
    retry: RetryConfig,
    requests: AtomicU64,
    failures: AtomicU64,
    cache_hits: AtomicU64,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LlmProvider>, cache: Option<ResponseCache>, retry: RetryConfig) -> Self {
        Self {
            provider,
            cache,
            retry,
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    /// Build a client from run configuration, resolving the API key.
    pub fn from_config(config: &AnalysisConfig) -> crate::error::Result<Self> {
        let api_key = config.resolve_api_key()?;
        let provider: Arc<dyn LlmProvider> = Arc::new(OpenRouterProvider::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
        )?);
        let cache = if config.cache.enabled {
            Some(ResponseCache::open(
                config.cache.resolved_dir(),
                config.cache.max_entries,
            )?)
        } else {
            None
        };
        Ok(Self::new(provider, cache, config.retry.clone()))
    }

    /// Complete a request, consulting the cache first and retrying
    /// transient transport errors with exponential backoff.
    pub async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        // The effective model is part of the key: the request usually
        // carries `model: None` and relies on the provider's configured
        // model, so hashing the request alone would serve one model's
        // responses to another.
        let key = self.cache.as_ref().map(|_| {
            let payload = serde_json::to_string(&request).unwrap_or_default();
            let model = request.model.as_deref().unwrap_or(self.provider.model_name());
            ResponseCache::hash(&format!("{model}\n{payload}"))
        });

        if let (Some(cache), Some(key)) = (&self.cache, &key)
            && let Some(value) = cache.get(key)
            && let Some(text) = value.as_str()
        {
            self.cache_hits.fetch_add(1, Ordering::SeqCst);
            return Ok(text.to_string());
        }

        let result = self.complete_with_retry(request).await;
        match &result {
            Ok(text) => {
                if let (Some(cache), Some(key)) = (&self.cache, &key)
                    && let Err(e) = cache.insert(key, &Value::String(text.clone()))
                {
                    warn!(error = %e, "Failed to write cache entry");
                }
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
        }
        result
    }

    async fn complete_with_retry(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let mut last_error = None;
        for attempt in 0..=self.retry.max_retries {
            match self.provider.complete(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let backoff = std::cmp::min(self.retry.base_delay_secs << attempt, 32);
                    let wait = match &e {
                        LlmError::RateLimited { retry_after_secs } => {
                            std::cmp::max(*retry_after_secs, backoff)
                        }
                        _ => backoff,
                    };
                    info!(
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        backoff_secs = wait,
                        error = %e,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or(LlmError::Connection {
            message: "Retry budget exhausted".to_string(),
        }))
    }

    /// Current call accounting.
    pub fn stats(&self) -> CallStats {
        CallStats {
            requests: self.requests.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            cache_hits: self.cache_hits.load(Ordering::SeqCst),
        }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}
