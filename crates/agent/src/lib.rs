//! The agent side of an invocation.
//!
//! 1. **Context**: thread history becomes a bounded, cleaned window
//! 2. **Orchestrator**: completion, optional function call, completion again
//! 3. **Formatter**: content plus the token/cost annotation
//! 4. **Responder**: ties the three together and posts to the thread
//!
//! Nothing here outlives an invocation except the immutable settings,
//! context builder and dispatcher shared through `Arc`.

pub mod context;
pub mod formatter;
pub mod orchestrator;
pub mod responder;

#[cfg(any(test, feature = "test-support"))]
pub mod test_helpers;

pub use context::{ContextBuilder, clean_text};
pub use formatter::{FormattedAnswer, ResponseFormatter};
pub use orchestrator::{NoopObserver, Orchestrator, Outcome, PassObserver};
pub use responder::{ResponderSettings, ThreadResponder};
