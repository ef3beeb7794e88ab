//! The cost annotation appended to every answer, and its inverse.
//!
//! Rendered form (note the leading newline + space and the trailing space):
//!
//! ```text
//! \n `info: prompt + completion = 100 + 50 = 150 tokens(0.0003 USD)`
//! ```
//!
//! [`strip_annotations`] removes any backticked fragment that starts with
//! `info: prompt` and ends with `USD)`, together with the whitespace around
//! it. Both sides must change together.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use threadwise_core::provider::Usage;

use crate::pricing::FlatRatePricing;

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*`info: prompt[^`]*USD\)`[ \t]*").expect("annotation pattern is valid")
});

/// Token counts and cost of the completion that produced an answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostAnnotation {
    pub usage: Usage,
    pub cost_usd: f64,
}

impl CostAnnotation {
    pub fn new(usage: Usage, pricing: &FlatRatePricing) -> Self {
        Self {
            usage,
            cost_usd: pricing.cost(&usage),
        }
    }
}

impl fmt::Display for CostAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\n `info: prompt + completion = {} + {} = {} tokens({:.4} USD)` ",
            self.usage.prompt_tokens,
            self.usage.completion_tokens,
            self.usage.total_tokens,
            self.cost_usd
        )
    }
}

/// Remove every cost annotation from `text`.
///
/// Repeats until nothing matches, since removing one annotation can join
/// the halves of another.
pub fn strip_annotations(text: &str) -> Cow<'_, str> {
    let mut current = ANNOTATION.replace_all(text, "");
    loop {
        let next = match ANNOTATION.replace_all(&current, "") {
            Cow::Owned(next) => next,
            Cow::Borrowed(_) => break,
        };
        current = Cow::Owned(next);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(prompt: u32, completion: u32) -> CostAnnotation {
        CostAnnotation::new(
            Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            },
            &FlatRatePricing::default(),
        )
    }

    #[test]
    fn renders_counts_and_four_decimal_cost() {
        let text = annotation(100, 50).to_string();
        assert_eq!(
            text,
            "\n `info: prompt + completion = 100 + 50 = 150 tokens(0.0003 USD)` "
        );
    }

    #[test]
    fn rounds_cost_to_four_decimals() {
        // 1234 * 0.002 / 1000 = 0.002468
        let text = annotation(1000, 234).to_string();
        assert!(text.contains("tokens(0.0025 USD)"), "{text}");
    }

    #[test]
    fn strip_removes_rendered_annotation() {
        let answer = format!("Check the firewall rules.{}", annotation(10, 5));
        assert_eq!(strip_annotations(&answer), "Check the firewall rules.");
    }

    #[test]
    fn strip_handles_platform_trimmed_text() {
        // Slack drops trailing whitespace when storing messages
        let stored = "Done.\n `info: prompt + completion = 1 + 2 = 3 tokens(0.0000 USD)`";
        assert_eq!(strip_annotations(stored), "Done.");
    }

    #[test]
    fn strip_removes_every_occurrence() {
        let text = format!("a{}b{}", annotation(1, 1), annotation(2, 2));
        assert_eq!(strip_annotations(&text), "ab");
    }

    #[test]
    fn strip_is_idempotent() {
        let text = format!("answer{} tail", annotation(7, 3));
        let once = strip_annotations(&text).into_owned();
        let twice = strip_annotations(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn strip_removes_annotation_joined_by_removal() {
        let inner = "`info: prompt + completion = 1 + 1 = 2 tokens(0.0000 USD)`";
        let text = format!("ok `info: pro{inner}mpt + completion = 3 + 4 = 7 tokens(0.0000 USD)`");
        let once = strip_annotations(&text).into_owned();
        assert_eq!(once, "ok");
        assert_eq!(strip_annotations(&once), once);
    }

    #[test]
    fn strip_leaves_other_code_spans_alone() {
        let text = "run `info: prompt` manually, then `cargo test`";
        assert_eq!(strip_annotations(text), text);
    }
}
