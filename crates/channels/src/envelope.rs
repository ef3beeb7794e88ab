//! Slack Events API envelope.
//!
//! Only two envelope types matter: the one-time `url_verification` handshake
//! and `event_callback` carrying a message event. Everything else is parsed
//! as [`SlackEnvelope::Other`] and acknowledged without work.

use serde::Deserialize;
use threadwise_core::channel::InboundEvent;
use threadwise_core::error::ChannelError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    /// Endpoint ownership check; the challenge is echoed back.
    UrlVerification { challenge: String },

    /// A subscribed event.
    EventCallback { event: InboundEvent },

    #[serde(other)]
    Other,
}

/// Parse a webhook body.
pub fn parse_envelope(body: &str) -> Result<SlackEnvelope, ChannelError> {
    serde_json::from_str(body).map_err(|e| ChannelError::InvalidPayload(e.to_string()))
}
