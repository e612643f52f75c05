//! Token Pricing and Cost Tracking
//!
//! Maps token usage to a dollar cost. Rates are USD per 1K tokens.
//!
//! Model resolution is three-tiered and never fails:
//!
//! 1. Exact match on the model identifier
//! 2. Longest known family prefix (case-insensitive), e.g. `gpt-4o-2024-08-06` → `gpt-4o`
//! 3. Conservative fallback rate
//!
//! ```text
//! cost = prompt_tokens / 1000 × input + completion_tokens / 1000 × output
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ai::provider::TokenUsage;
use crate::constants::pricing as pricing_constants;

/// Per-1K-token rates for one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPricing {
    /// USD per 1K prompt tokens
    pub input: f64,
    /// USD per 1K completion tokens
    pub output: f64,
}

impl ModelPricing {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    /// Conservative rate used for unrecognized models
    pub const fn fallback() -> Self {
        Self::new(
            pricing_constants::FALLBACK_INPUT_PER_1K,
            pricing_constants::FALLBACK_OUTPUT_PER_1K,
        )
    }
}

/// Immutable, versioned pricing table
///
/// Built once at startup and shared by reference; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct PricingTable {
    version: String,
    exact: HashMap<String, ModelPricing>,
    /// Lowercased family prefixes, longest first
    prefixes: Vec<(String, ModelPricing)>,
    fallback: ModelPricing,
}

impl PricingTable {
    /// Built-in OpenAI rates
    pub fn builtin() -> Self {
        let families: [(&str, ModelPricing); 8] = [
            ("gpt-4o-mini", ModelPricing::new(0.00015, 0.0006)),
            ("gpt-4o", ModelPricing::new(0.005, 0.015)),
            ("gpt-4-turbo", ModelPricing::new(0.01, 0.03)),
            ("gpt-4-32k", ModelPricing::new(0.06, 0.12)),
            ("gpt-4", ModelPricing::new(0.03, 0.06)),
            ("gpt-3.5-turbo", ModelPricing::new(0.0005, 0.0015)),
            ("o1-mini", ModelPricing::new(0.003, 0.012)),
            ("o1", ModelPricing::new(0.015, 0.06)),
        ];

        let mut builder = PricingTableBuilder::new(pricing_constants::TABLE_VERSION);
        for (name, pricing) in families {
            builder = builder.model(name, pricing).family(name, pricing);
        }
        builder
            .model("gpt-4-turbo-preview", ModelPricing::new(0.01, 0.03))
            .model("gpt-3.5-turbo-16k", ModelPricing::new(0.003, 0.004))
            .build()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resolve rates for a model (exact → longest prefix → fallback)
    pub fn pricing_for(&self, model: &str) -> ModelPricing {
        if let Some(pricing) = self.exact.get(model) {
            return *pricing;
        }

        let lower = model.to_lowercase();
        self.prefixes
            .iter()
            .find(|(prefix, _)| lower.starts_with(prefix.as_str()))
            .map(|(_, pricing)| *pricing)
            .unwrap_or(self.fallback)
    }

    /// Cost of a usage record for a model
    pub fn cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        cost_with(usage, &self.pricing_for(model))
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Builder for custom pricing tables
pub struct PricingTableBuilder {
    version: String,
    exact: HashMap<String, ModelPricing>,
    prefixes: Vec<(String, ModelPricing)>,
    fallback: ModelPricing,
}

impl PricingTableBuilder {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            exact: HashMap::new(),
            prefixes: Vec::new(),
            fallback: ModelPricing::fallback(),
        }
    }

    pub fn model(mut self, name: impl Into<String>, pricing: ModelPricing) -> Self {
        self.exact.insert(name.into(), pricing);
        self
    }

    pub fn family(mut self, prefix: &str, pricing: ModelPricing) -> Self {
        self.prefixes.push((prefix.to_lowercase(), pricing));
        self
    }

    pub fn fallback(mut self, pricing: ModelPricing) -> Self {
        self.fallback = pricing;
        self
    }

    pub fn build(mut self) -> PricingTable {
        // Longest prefix wins; ties broken alphabetically so resolution is deterministic
        self.prefixes
            .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        PricingTable {
            version: self.version,
            exact: self.exact,
            prefixes: self.prefixes,
            fallback: self.fallback,
        }
    }
}

fn cost_with(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    input_cost(usage, pricing) + output_cost(usage, pricing)
}

fn input_cost(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    usage.prompt_tokens as f64 / 1000.0 * pricing.input
}

fn output_cost(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    usage.completion_tokens as f64 / 1000.0 * pricing.output
}

/// Format a dollar amount: 2 decimals from one cent up, 4 below (including zero)
pub fn format_cost(cost: f64) -> String {
    if cost >= 0.01 {
        format!("${:.2}", cost)
    } else {
        format!("${:.4}", cost)
    }
}

// =============================================================================
// Cost Tracker
// =============================================================================

/// Input/output split of a cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
}

/// Snapshot of run cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub model: String,
    pub pricing: ModelPricing,
    pub usage: TokenUsage,
    pub cost: f64,
    pub breakdown: CostBreakdown,
}

impl CostSummary {
    /// Format summary for display
    pub fn display(&self) -> String {
        format!(
            "Model: {}\n\
             Tokens: {} (prompt: {}, completion: {})\n\
             Cost: {} (input: {}, output: {})",
            self.model,
            self.usage.total_tokens,
            self.usage.prompt_tokens,
            self.usage.completion_tokens,
            format_cost(self.cost),
            format_cost(self.breakdown.input_cost),
            format_cost(self.breakdown.output_cost),
        )
    }
}

/// Run-scoped usage accumulator
///
/// Owned by the build coordinator and mutated only from its sequential call path.
#[derive(Debug, Clone)]
pub struct CostTracker {
    model: String,
    table: Arc<PricingTable>,
    usage: TokenUsage,
}

impl CostTracker {
    pub fn new(model: impl Into<String>, table: Arc<PricingTable>) -> Self {
        Self {
            model: model.into(),
            table,
            usage: TokenUsage::default(),
        }
    }

    pub fn add_usage(&mut self, usage: &TokenUsage) {
        self.usage += *usage;
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Recomputed from accumulated usage on every call
    pub fn total_cost(&self) -> f64 {
        self.table.cost(&self.usage, &self.model)
    }

    pub fn summary(&self) -> CostSummary {
        let pricing = self.table.pricing_for(&self.model);
        CostSummary {
            model: self.model.clone(),
            pricing,
            usage: self.usage,
            cost: cost_with(&self.usage, &pricing),
            breakdown: CostBreakdown {
                input_cost: input_cost(&self.usage, &pricing),
                output_cost: output_cost(&self.usage, &pricing),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
