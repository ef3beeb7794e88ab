//! Final answer text: model content plus the cost annotation.

use threadwise_core::provider::ProviderResponse;
use threadwise_telemetry::{CostAnnotation, FlatRatePricing};

/// What gets posted and what the invocation returns.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedAnswer {
    /// Content followed by the annotation, as posted to the thread
    pub display_text: String,
    /// The model's content alone
    pub content: String,
    pub annotation: CostAnnotation,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter {
    pricing: FlatRatePricing,
}

impl ResponseFormatter {
    pub fn new(pricing: FlatRatePricing) -> Self {
        Self { pricing }
    }

    /// Annotate the final response. Usage is that of this response only.
    pub fn format(&self, response: &ProviderResponse) -> FormattedAnswer {
        let annotation = CostAnnotation::new(response.usage, &self.pricing);
        let content = response.message.content.clone();
        FormattedAnswer {
            display_text: format!("{content}{annotation}"),
            content,
            annotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::clean_text;
    use crate::test_helpers::text_response;

    #[test]
    fn appends_annotation() {
        let answer = ResponseFormatter::default().format(&text_response("Hello", 100, 50));
        assert_eq!(answer.content, "Hello");
        assert_eq!(
            answer.display_text,
            "Hello\n `info: prompt + completion = 100 + 50 = 150 tokens(0.0003 USD)` "
        );
        assert!((answer.annotation.cost_usd - 0.0003).abs() < 1e-12);
    }

    #[test]
    fn custom_rate() {
        let answer =
            ResponseFormatter::new(FlatRatePricing::new(0.03)).format(&text_response("x", 500, 500));
        assert!(answer.display_text.contains("= 1000 tokens(0.0300 USD)"));
    }

    #[test]
    fn posted_answer_reads_back_clean() {
        let answer = ResponseFormatter::default().format(&text_response("Restart the service.", 7, 9));
        assert_eq!(clean_text(&answer.display_text), "Restart the service.");
    }
}
