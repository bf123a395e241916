//! Per-request LLM usage accounting.
//!
//! Each pipeline run owns its own [`LlmUsage`]; nothing here is shared
//! between concurrent requests.

use serde::{Deserialize, Serialize};

use crate::providers::TokenUsage;

/// Accumulated LLM usage for one verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Total tokens used
    pub total_tokens: u32,

    /// Prompt/input tokens
    pub prompt_tokens: u32,

    /// Completion/output tokens
    pub completion_tokens: u32,

    /// Number of LLM calls that returned a response
    pub llm_calls: u32,

    /// Tokens read from the provider's context cache
    pub cache_read_tokens: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl LlmUsage {
    /// Add token usage from a provider response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.cache_read_tokens += usage.cache_read_tokens;
        self.llm_calls += 1;

        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    /// Estimate cost for a usage entry.
    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // Pricing per million tokens, standard tier
        let (input_rate, output_rate) = match model {
            m if m.contains("flash-lite") => (0.10, 0.40),
            m if m.contains("2.5-pro") => (1.25, 10.0),
            m if m.contains("2.5-flash") => (0.30, 2.50),
            m if m.contains("2.0-flash") => (0.10, 0.40),
            _ => (0.30, 2.50), // Default to 2.5 Flash pricing
        };
        // Cached prompt tokens bill at a quarter of the input rate
        let cache_rate = input_rate * 0.25;

        let uncached_input = usage.prompt_tokens.saturating_sub(usage.cache_read_tokens);
        let input_cost = (uncached_input as f64 / 1_000_000.0) * input_rate;
        let cache_cost = (usage.cache_read_tokens as f64 / 1_000_000.0) * cache_rate;
        let output_cost = (usage.completion_tokens as f64 / 1_000_000.0) * output_rate;

        input_cost + cache_cost + output_cost
    }
}
