//! Per-invocation usage totals.

use serde::Serialize;
use threadwise_core::provider::Usage;
use tracing::info;

use crate::pricing::FlatRatePricing;

/// Token usage summed over every completion call of one invocation.
///
/// The posted annotation only reflects the final call; this total is what the
/// invocation actually spent and is written to the logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InvocationUsage {
    /// Number of completion calls made.
    pub completion_calls: u32,
    /// Number of local functions executed.
    pub function_calls: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl InvocationUsage {
    /// Record one completion call.
    pub fn record_completion(&mut self, usage: &Usage) {
        self.completion_calls += 1;
        self.prompt_tokens += u64::from(usage.prompt_tokens);
        self.completion_tokens += u64::from(usage.completion_tokens);
        self.total_tokens += u64::from(usage.total_tokens);
    }

    /// Record one local function execution.
    pub fn record_function(&mut self) {
        self.function_calls += 1;
    }

    pub fn cost(&self, pricing: &FlatRatePricing) -> f64 {
        self.total_tokens as f64 * pricing.usd_per_1k_tokens / 1000.0
    }

    /// Emit the totals as one structured log line.
    pub fn log(&self, pricing: &FlatRatePricing) {
        info!(
            completion_calls = self.completion_calls,
            function_calls = self.function_calls,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            total_tokens = self.total_tokens,
            cost_usd = self.cost(pricing),
            "Invocation usage"
        );
    }
}
