//! Flat per-token pricing.
//!
//! One USD rate per 1K tokens applied to the total token count. Prompt and
//! completion tokens are not priced separately.

use serde::{Deserialize, Serialize};
use threadwise_core::provider::Usage;

/// Historical gpt-3.5-turbo rate.
pub const DEFAULT_USD_PER_1K_TOKENS: f64 = 0.002;

/// A single rate applied to `total_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatRatePricing {
    /// Price per 1K tokens in USD.
    pub usd_per_1k_tokens: f64,
}

impl FlatRatePricing {
    pub fn new(usd_per_1k_tokens: f64) -> Self {
        Self { usd_per_1k_tokens }
    }

    /// Cost of a completion in USD.
    pub fn cost(&self, usage: &Usage) -> f64 {
        usage.total_tokens as f64 * self.usd_per_1k_tokens / 1000.0
    }
}

impl Default for FlatRatePricing {
    fn default() -> Self {
        Self::new(DEFAULT_USD_PER_1K_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u32, completion: u32) -> Usage {
        Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    #[test]
    fn default_rate() {
        let pricing = FlatRatePricing::default();
        // 150 * 0.002 / 1000 = 0.0003
        let cost = pricing.cost(&usage(100, 50));
        assert!((cost - 0.0003).abs() < 1e-12);
    }

    #[test]
    fn only_total_tokens_count() {
        let pricing = FlatRatePricing::new(1.0);
        let skewed = Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 2000,
        };
        assert!((pricing.cost(&skewed) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_usage_is_free() {
        assert_eq!(FlatRatePricing::default().cost(&Usage::default()), 0.0);
    }
}
