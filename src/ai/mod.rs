//! AI Integration Layer
//!
//! Completion providers, prompt construction, timeouts and cost accounting.

pub mod pricing;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use pricing::{
    CostBreakdown, CostSummary, CostTracker, ModelPricing, PricingTable, PricingTableBuilder,
    format_cost,
};
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    CompletionRequest, ErrorCategory, ErrorClassifier, LlmError, LlmProvider, LlmResponse,
    OpenAiProvider, ProviderConfig, SharedProvider, TokenUsage, create_provider,
};
pub use timeout::{TimeoutConfig, with_timeout};
