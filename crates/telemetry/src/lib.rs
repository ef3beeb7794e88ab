//! Token usage accounting and cost estimation for threadwise.
//!
//! Every posted answer carries a cost annotation computed from the final
//! completion's usage. The same module that renders the annotation also owns
//! the pattern that strips it again, so historical answers re-read from a
//! thread never accumulate stale accounting text.

pub mod annotation;
pub mod model;
pub mod pricing;

pub use annotation::{CostAnnotation, strip_annotations};
pub use model::InvocationUsage;
pub use pricing::{DEFAULT_USD_PER_1K_TOKENS, FlatRatePricing};
