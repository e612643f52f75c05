//! OpenAI API Provider
//!
//! Text completions through OpenAI's Chat Completions API (or any
//! compatible endpoint). Performs a single request per call.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use super::{CompletionRequest, LlmProvider, LlmResponse, ProviderConfig, TokenUsage};
use crate::constants::network::DEFAULT_API_BASE;
use crate::types::{BundleError, ErrorCategory, ErrorClassifier, LlmError, Result};

const PROVIDER_NAME: &str = "openai";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config.api_key.ok_or_else(|| {
            BundleError::Credentials("OpenAI API key not provided".to_string())
        })?;

        let api_base = match config.api_base {
            Some(base) => normalize_api_base(&base)?,
            None => DEFAULT_API_BASE.to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BundleError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            client,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: Some(request.max_tokens),
        }
    }
}

/// Validate a custom endpoint and strip the trailing slash
fn normalize_api_base(base: &str) -> Result<String> {
    let parsed = Url::parse(base)
        .map_err(|e| BundleError::Config(format!("Invalid api_base '{}': {}", base, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BundleError::Config(format!(
            "api_base must use http or https, got '{}'",
            parsed.scheme()
        )));
    }
    Ok(base.trim_end_matches('/').to_string())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        let start_time = Instant::now();
        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.api_base);

        debug!(
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending request to OpenAI API"
        );

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let category = if e.is_timeout() || e.is_connect() {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Unknown
                };
                LlmError::with_provider(
                    category,
                    format!("OpenAI request failed: {}", e),
                    PROVIDER_NAME,
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            let mut error = ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, body),
                PROVIDER_NAME,
            );
            if let Some(wait) = retry_after {
                error = error.retry_after(wait);
            }
            return Err(error.into());
        }

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Failed to parse OpenAI response: {}", e),
                PROVIDER_NAME,
            )
        })?;

        let usage = response_body.usage.unwrap_or_default();

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            total_tokens = usage.total_tokens,
            "Received response from OpenAI"
        );

        Ok(LlmResponse::new(content, usage))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
