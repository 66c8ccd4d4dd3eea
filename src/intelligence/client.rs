use std::time::Duration;

use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::error::IntelligenceError;
use super::types::{GenerateContentRequest, GenerateContentResponse};

const API_URL: &str = "https://generativelanguage.googleapis.com";

/// Longest wait honoured from a `retry-after` header.
const MAX_RETRY_AFTER_MS: u64 = 60_000;

/// Anything that can answer a `generateContent` request.
///
/// [`GeminiClient`] is the real implementation; tests substitute canned
/// responses.
#[allow(async_fn_in_trait)]
pub trait ContentGenerator {
    async fn generate_content(
        &self,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, IntelligenceError>;
}

/// Backoff settings for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
        }
    }

    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
    }
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, IntelligenceError> {
        Self::with_base_url(api_key, model, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (proxies, tests).
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Result<Self, IntelligenceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            api_key,
            model,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send_once(
        &self,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, IntelligenceError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(req)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000).min(MAX_RETRY_AFTER_MS))
                .unwrap_or(1000);
            return Err(IntelligenceError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(IntelligenceError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<GenerateContentResponse>(&body)
            .map_err(|e| IntelligenceError::malformed("generateContent", e))
    }
}

impl ContentGenerator for GeminiClient {
    async fn generate_content(
        &self,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, IntelligenceError> {
        let mut attempt = 0;
        loop {
            match self.send_once(req).await {
                Ok(resp) => {
                    debug!(model = %self.model, attempt, "generateContent succeeded");
                    return Ok(resp);
                }
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let backoff = self.retry.delay_for_attempt(attempt);
                    let delay_ms = match err {
                        IntelligenceError::RateLimited { retry_after_ms } => backoff.max(retry_after_ms),
                        _ => backoff,
                    };
                    warn!(
                        attempt,
                        max = self.retry.max_retries,
                        delay_ms,
                        error = %err,
                        "retrying intelligence request"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
