//! Chunk Generator
//!
//! Issues one completion per chunk and owns the whole retry policy.
//!
//! ```text
//! Attempting(n) ──success──────────────▶ Done(content, usage)
//!      │
//!      ├──auth failure────────────────▶ Failed (no retry)
//!      ├──rate limited──wait d·n·2────▶ Attempting(n+1)
//!      ├──other / empty──wait d·n─────▶ Attempting(n+1)
//!      └──n == max──────────────────▶ Failed (RetriesExhausted)
//! ```
//!
//! Waits go through an injected [`Sleeper`] so tests never touch real timers.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::GenerationSettings;
use crate::ai::prompt::PromptTemplates;
use crate::ai::provider::{CompletionRequest, LlmResponse, SharedProvider};
use crate::ai::timeout::{TimeoutConfig, with_timeout};
use crate::catalog::Section;
use crate::config::Branding;
use crate::types::{BundleError, ErrorCategory, ErrorClassifier, LlmError, Result};

/// Delay capability used between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Everything needed to generate one chunk
#[derive(Debug, Clone, Copy)]
pub struct ChunkRequest<'a> {
    pub settings: &'a GenerationSettings,
    pub section: &'a Section,
    /// 0-based
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub branding: &'a Branding,
}

enum AttemptOutcome {
    Success(LlmResponse),
    Retryable(LlmError),
    Fatal(BundleError),
}

pub struct ChunkGenerator {
    provider: SharedProvider,
    sleeper: Arc<dyn Sleeper>,
    request_timeout: Duration,
}

impl ChunkGenerator {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            sleeper: Arc::new(TokioSleeper),
            request_timeout: TimeoutConfig::default().completion,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Generate one chunk, retrying per the settings' policy
    pub async fn generate(&self, request: &ChunkRequest<'_>) -> Result<LlmResponse> {
        let settings = request.settings;
        let max_attempts = settings.max_attempts();
        let completion = CompletionRequest {
            model: settings.model.clone(),
            system: Some(PromptTemplates::SYSTEM.to_string()),
            prompt: PromptTemplates::chunk(
                request.section,
                request.chunk_index,
                request.total_chunks,
                request.branding,
            ),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        };

        debug!(
            section = %request.section.id,
            chunk = request.chunk_index + 1,
            total = request.total_chunks,
            prompt_chars = completion.prompt.len(),
            "Generating chunk"
        );

        let mut attempt = 1;
        loop {
            let error = match self.attempt(&completion).await {
                AttemptOutcome::Success(response) => return Ok(response),
                AttemptOutcome::Fatal(err) => {
                    warn!(
                        section = %request.section.id,
                        chunk = request.chunk_index + 1,
                        error = %err,
                        "Authentication failed, not retrying"
                    );
                    return Err(err);
                }
                AttemptOutcome::Retryable(err) => err,
            };

            if error.category.is_rate_limit() {
                let wait = settings.rate_limit_wait(attempt);
                warn!(
                    section = %request.section.id,
                    chunk = request.chunk_index + 1,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    upstream_hint_secs = ?error.retry_after.map(|d| d.as_secs()),
                    "Rate limited, waiting before retry"
                );
                self.sleeper.sleep(wait).await;
            } else {
                warn!(
                    section = %request.section.id,
                    chunk = request.chunk_index + 1,
                    attempt,
                    max_attempts,
                    category = %error.category,
                    error = %error.message,
                    "Chunk attempt failed"
                );
                if attempt < max_attempts {
                    self.sleeper.sleep(settings.backoff(attempt)).await;
                }
            }

            if attempt >= max_attempts {
                return Err(BundleError::RetriesExhausted {
                    attempts: max_attempts,
                    message: error.message,
                });
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, request: &CompletionRequest) -> AttemptOutcome {
        let provider_name = self.provider.name();
        let result = with_timeout(
            self.request_timeout,
            self.provider.generate(request),
            "completion request",
        )
        .await;

        match result {
            Ok(response) if response.content.trim().is_empty() => AttemptOutcome::Retryable(
                LlmError::with_provider(
                    ErrorCategory::Transient,
                    "Empty response from API",
                    provider_name,
                ),
            ),
            Ok(response) => AttemptOutcome::Success(response),
            Err(err) => {
                let classified = ErrorClassifier::classify_error(&err, provider_name);
                if classified.category.is_fatal() {
                    AttemptOutcome::Fatal(err)
                } else {
                    AttemptOutcome::Retryable(LlmError {
                        message: err.detail(),
                        ..classified
                    })
                }
            }
        }
    }
}
