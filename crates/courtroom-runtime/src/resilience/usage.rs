//! Token and cost accounting across trials.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::providers::TokenUsage;

/// Accumulated LLM usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Total tokens used
    pub total_tokens: u64,

    /// Prompt/input tokens
    pub prompt_tokens: u64,

    /// Completion/output tokens
    pub completion_tokens: u64,

    /// Number of successful LLM calls
    pub llm_calls: u64,

    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl LlmUsage {
    /// Add token usage from a provider response.
    ///
    /// Counts come from the backend unchecked, so every total saturates.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens = self
            .prompt_tokens
            .saturating_add(u64::from(usage.prompt_tokens));
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(u64::from(usage.completion_tokens));
        self.total_tokens = self.total_tokens.saturating_add(usage.total());
        self.llm_calls = self.llm_calls.saturating_add(1);
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // USD per million tokens, Groq on-demand pricing
        let (input_rate, output_rate) = match model {
            m if m.contains("llama-3.3-70b") => (0.59, 0.79),
            m if m.contains("llama-3.1-8b") => (0.05, 0.08),
            m if m.contains("gemma2-9b") => (0.20, 0.20),
            m if m.contains("mixtral-8x7b") => (0.24, 0.24),
            _ => (0.59, 0.79),
        };

        let input_cost = (usage.prompt_tokens as f64 / 1_000_000.0) * input_rate;
        let output_cost = (usage.completion_tokens as f64 / 1_000_000.0) * output_rate;

        input_cost + output_cost
    }
}

/// Usage shared by every trial run on one orchestrator.
#[derive(Debug, Default)]
pub struct UsageTracker {
    usage: RwLock<LlmUsage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, usage: &TokenUsage, model: &str) {
        self.usage.write().add(usage, model);
    }

    pub fn snapshot(&self) -> LlmUsage {
        self.usage.read().clone()
    }
}
