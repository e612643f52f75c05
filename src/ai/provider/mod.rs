//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` capability the pipeline depends on.
//! Every provider returns an `LlmResponse` with the generated text and token
//! usage so the cost tracker can account for each call.

mod openai;

pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use std::sync::Arc;

use crate::constants::network;
use crate::types::{BundleError, Result};

// =============================================================================
// Token Usage
// =============================================================================

/// Token usage reported for a single completion (or a sum of completions)
///
/// Missing fields deserialize to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for TokenUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

// =============================================================================
// Request / Response
// =============================================================================

/// Parameters for one completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Completion text plus token usage
///
/// `content` may be empty; callers decide whether that counts as a failure.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: String,
    pub usage: TokenUsage,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage,
        }
    }
}

/// Shared LLM provider handle
pub type SharedProvider = Arc<dyn LlmProvider>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// The API key is never serialized and is redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "openai"
    pub provider: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for OpenAI-compatible endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            api_key: None,
            api_base: None,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Text completion capability
///
/// Providers perform a single request; retry policy lives in the chunk generator.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        _ => Err(BundleError::Config(format!(
            "Unknown provider: {}. Supported: openai",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_addition() {
        let a = TokenUsage::new(10, 5, 15);
        let b = TokenUsage::new(1, 2, 3);
        assert_eq!(a + b, TokenUsage::new(11, 7, 18));

        let total: TokenUsage = vec![a, b, TokenUsage::default()].into_iter().sum();
        assert_eq!(total, TokenUsage::new(11, 7, 18));
    }

    #[test]
    fn test_usage_addition_saturates() {
        let mut usage = TokenUsage::new(u64::MAX - 1, 1, u64::MAX);
        usage += TokenUsage::new(5, 2, 1);
        assert_eq!(usage, TokenUsage::new(u64::MAX, 3, u64::MAX));
    }

    #[test]
    fn test_usage_missing_fields_default_to_zero() {
        let usage: TokenUsage = serde_json::from_str(r#"{"prompt_tokens": 12}"#).unwrap();
        assert_eq!(usage, TokenUsage::new(12, 0, 0));
    }

    #[test]
    fn test_provider_config_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = ProviderConfig {
            provider: "mystery".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(BundleError::Config(_))
        ));
    }
}
