//! Chat platform implementations for threadwise.
//!
//! - **Slack**: Web API client (`conversations.replies`, `chat.postMessage`)
//! - **Envelope**: Events API payload parsing for the webhook

pub mod envelope;
pub mod slack;

pub use envelope::{SlackEnvelope, parse_envelope};
pub use slack::SlackClient;
