//! Remote completion client with bounded retry.
//!
//! One network attempt lives behind [`CompletionTransport`]; the retry loop
//! lives in [`RetryPolicy`]. Failures are classified at the attempt boundary:
//! timeouts, connect errors and HTTP 408/429/5xx are transient and retried,
//! everything else is fatal and surfaces immediately. Every terminal state
//! comes back as a [`CompletionOutcome`] value, never as an `Err`.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::models::CompletionRequest;

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Terminal state of a completion call, or of a single attempt at the
/// transport seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Raw model text, prior to normalization.
    Success(String),
    /// Worth retrying: timeout, connect failure, HTTP 408/429/5xx.
    TransientFailure(String),
    /// Not worth retrying: auth failures, malformed requests, unusable
    /// response envelopes.
    FatalFailure(String),
}

impl CompletionOutcome {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFailure(_))
    }
}

/// Remote credential, resolved once when configuration is loaded. An absent
/// credential is a routing decision, never a runtime error.
#[derive(Clone)]
pub enum Credential {
    Configured(String),
    Unconfigured,
}

impl Credential {
    /// Treats empty values and the well-known placeholder as absent.
    pub fn from_value(value: Option<String>) -> Self {
        match value {
            Some(key) if !key.trim().is_empty() && key != "your_api_key_here" => {
                Self::Configured(key)
            }
            _ => Self::Unconfigured,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured(_) => f.write_str("Credential::Configured(<redacted>)"),
            Self::Unconfigured => f.write_str("Credential::Unconfigured"),
        }
    }
}

/// Exponential backoff schedule for transient completion failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, counting the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    /// No jitter.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay inserted before the given 1-based attempt. None before the
    /// first.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt <= 1 {
            return None;
        }
        Some(self.base_delay * 2u32.pow(attempt - 2))
    }

    /// Drive `transport` until success, a fatal failure, or attempts run out.
    /// Returns the final attempt's failure when every attempt was transient.
    pub async fn run(
        &self,
        transport: &dyn CompletionTransport,
        request: &CompletionRequest,
    ) -> CompletionOutcome {
        let mut last = CompletionOutcome::TransientFailure("no completion attempts were made".to_string());
        for attempt in 1..=self.max_attempts {
            if let Some(delay) = self.delay_before(attempt) {
                warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    "retrying completion call after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
            let started = Instant::now();
            let outcome = transport.send_once(request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                CompletionOutcome::Success(text) => {
                    info!(attempt, elapsed_ms, response_chars = text.len(), "completion call succeeded");
                    return outcome;
                }
                CompletionOutcome::TransientFailure(reason) => {
                    warn!(attempt, elapsed_ms, %reason, "completion attempt failed, transient");
                    last = outcome;
                }
                CompletionOutcome::FatalFailure(reason) => {
                    warn!(attempt, elapsed_ms, %reason, "completion attempt failed, fatal");
                    return outcome;
                }
            }
        }
        last
    }
}

/// One network attempt. Separate from the retry loop so the loop can be
/// exercised with scripted outcomes.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send_once(&self, request: &CompletionRequest) -> CompletionOutcome;
}

/// The capability the analysis pipeline needs from a completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Whether a usable credential was supplied at construction time.
    fn is_configured(&self) -> bool;

    /// Complete `request`, applying the backend's own retry policy.
    async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome;
}

/// Completion backend configuration, threaded in explicitly at construction.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub credential: Credential,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl CompletionConfig {
    pub const DEFAULT_MODEL: &'static str = "claude-sonnet-4-20250514";

    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: 4000,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    /// Read `ANTHROPIC_API_KEY` and `ANTHROPIC_MODEL` from the environment.
    /// A missing key yields an unconfigured client, not an error.
    pub fn from_env() -> Self {
        let mut config = Self::new(Credential::from_value(
            std::env::var("ANTHROPIC_API_KEY").ok(),
        ));
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            config.model = model;
        }
        config
    }
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl AnthropicClient {
    pub fn new(config: CompletionConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { http, config }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn is_configured(&self) -> bool {
        self.config.credential.is_configured()
    }

    async fn complete(&self, request: &CompletionRequest) -> CompletionOutcome {
        self.config.retry.run(self, request).await
    }
}

#[async_trait]
impl CompletionTransport for AnthropicClient {
    async fn send_once(&self, request: &CompletionRequest) -> CompletionOutcome {
        let Credential::Configured(api_key) = &self.config.credential else {
            return CompletionOutcome::FatalFailure("no API credential configured".to_string());
        };

        let payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": request.system_instructions,
            "messages": [
                {
                    "role": "user",
                    "content": request.user_prompt
                }
            ]
        });

        let response = match self
            .http
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_request_error(&e),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return classify_status(status, &body);
        }

        match response.json::<MessagesResponse>().await {
            Ok(envelope) => match envelope.first_text() {
                Some(text) => CompletionOutcome::Success(text),
                None => CompletionOutcome::FatalFailure(
                    "completion response carried no text content".to_string(),
                ),
            },
            Err(e) => {
                CompletionOutcome::FatalFailure(format!("invalid completion response payload: {e}"))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn first_text(&self) -> Option<String> {
        self.content.iter().find_map(|block| block.text.clone())
    }
}

fn classify_request_error(error: &reqwest::Error) -> CompletionOutcome {
    if error.is_timeout() {
        CompletionOutcome::TransientFailure(format!("completion request timed out: {error}"))
    } else if error.is_connect() {
        CompletionOutcome::TransientFailure(format!("could not reach completion endpoint: {error}"))
    } else {
        CompletionOutcome::FatalFailure(format!("completion request failed: {error}"))
    }
}

fn classify_status(status: StatusCode, body: &str) -> CompletionOutcome {
    let reason = format!("completion endpoint returned {status}: {}", truncate(body));
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        CompletionOutcome::TransientFailure(reason)
    } else {
        CompletionOutcome::FatalFailure(reason)
    }
}

/// Keep error bodies log-sized.
fn truncate(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() <= MAX_CHARS {
        body.to_string()
    } else {
        let mut kept: String = body.chars().take(MAX_CHARS).collect();
        kept.push_str("...");
        kept
    }
}
