//! ChatPlatform trait: the abstraction over the chat service.
//!
//! The platform stores the conversation: threads are read back on every
//! invocation and answers are posted into the same thread.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChannelError;

/// A Slack message timestamp (`"1700000000.000100"`), parsed exactly.
///
/// Timestamps double as message ids, so they are ordered as
/// (seconds, microseconds) integers rather than as floats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlackTs {
    pub secs: u64,
    pub micros: u32,
}

impl SlackTs {
    /// Wall-clock time of the timestamp.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.secs).ok()?, self.micros * 1_000)
    }
}

impl FromStr for SlackTs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (secs, frac) = s.trim().split_once('.').unwrap_or((s.trim(), ""));
        let secs = secs
            .parse::<u64>()
            .map_err(|e| format!("invalid timestamp '{s}': {e}"))?;
        if frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid timestamp fraction in '{s}'"));
        }
        let micros = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<6}")
                .parse::<u32>()
                .map_err(|e| format!("invalid timestamp '{s}': {e}"))?
        };
        Ok(Self { secs, micros })
    }
}

impl fmt::Display for SlackTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

/// One message of a thread as returned by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Emission timestamp (also the message id)
    pub ts: String,

    /// Raw text, including platform markup
    #[serde(default)]
    pub text: String,

    /// Human author, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Set when the message was posted by a bot integration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl ThreadMessage {
    /// Sort key; unparseable timestamps sort before everything else.
    pub fn emission_key(&self) -> SlackTs {
        self.ts.parse().unwrap_or_default()
    }

    /// Whether the automated agent wrote this message.
    pub fn is_from_agent(&self) -> bool {
        self.bot_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Wall-clock span of `messages`, earliest to latest.
///
/// Messages whose timestamp does not parse are left out; `None` when none do.
pub fn thread_span(messages: &[ThreadMessage]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let mut times = messages
        .iter()
        .filter_map(|m| m.ts.parse::<SlackTs>().ok())
        .filter_map(SlackTs::to_datetime);
    let first = times.next()?;
    Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
}

/// The message event that triggered an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Raw text of the triggering message
    #[serde(default)]
    pub text: String,

    /// Channel the message was posted in
    pub channel: String,

    /// Timestamp of the triggering message
    pub ts: String,

    /// Root of the thread, when the message is already a reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl InboundEvent {
    /// The thread to read and answer in: the existing thread, or a new thread
    /// rooted at the triggering message.
    pub fn thread_root(&self) -> &str {
        self.thread_ts
            .as_deref()
            .filter(|ts| !ts.is_empty())
            .unwrap_or(&self.ts)
    }

    /// Whether a bot (possibly this agent) posted the triggering message.
    pub fn is_from_bot(&self) -> bool {
        self.bot_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// The core ChatPlatform trait.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Human-readable platform name (e.g., "slack").
    fn name(&self) -> &str;

    /// Fetch every message of a thread, root included.
    async fn fetch_thread_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> std::result::Result<Vec<ThreadMessage>, ChannelError>;

    /// Post a message into a thread.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: &str,
    ) -> std::result::Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slack_ts_parses_exactly() {
        let ts: SlackTs = "1700000000.000100".parse().unwrap();
        assert_eq!(ts.secs, 1_700_000_000);
        assert_eq!(ts.micros, 100);
        assert_eq!(ts.to_string(), "1700000000.000100");

        let short: SlackTs = "12.5".parse().unwrap();
        assert_eq!(short.micros, 500_000);

        let whole: SlackTs = "12".parse().unwrap();
        assert_eq!(whole, SlackTs { secs: 12, micros: 0 });
    }

    #[test]
    fn slack_ts_orders_by_value_not_text() {
        let a: SlackTs = "999.999999".parse().unwrap();
        let b: SlackTs = "1000.000001".parse().unwrap();
        assert!(a < b);
        // Adjacent microseconds a float would blur together
        let c: SlackTs = "1700000000.000001".parse().unwrap();
        let d: SlackTs = "1700000000.000002".parse().unwrap();
        assert!(c < d);
    }

    #[test]
    fn slack_ts_rejects_garbage() {
        assert!("abc".parse::<SlackTs>().is_err());
        assert!("1.2x".parse::<SlackTs>().is_err());
        assert!("1.1234567".parse::<SlackTs>().is_err());
    }

    #[test]
    fn thread_span_covers_parseable_messages() {
        let message = |ts: &str| ThreadMessage {
            ts: ts.into(),
            text: String::new(),
            user: None,
            bot_id: None,
        };
        let thread = [
            message("1700000060.000000"),
            message("not-a-ts"),
            message("1700000000.500000"),
        ];
        let (from, to) = thread_span(&thread).unwrap();
        assert_eq!(from.timestamp(), 1_700_000_000);
        assert_eq!(from.timestamp_subsec_millis(), 500);
        assert_eq!(to.timestamp(), 1_700_000_060);

        assert!(thread_span(&[message("garbage")]).is_none());
        assert!(thread_span(&[]).is_none());
    }

    #[test]
    fn slack_ts_to_datetime() {
        let ts: SlackTs = "1700000000.250000".parse().unwrap();
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(dt.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn agent_authorship_requires_non_empty_bot_id() {
        let mut msg = ThreadMessage {
            ts: "1.0".into(),
            text: "hi".into(),
            user: Some("U1".into()),
            bot_id: None,
        };
        assert!(!msg.is_from_agent());
        msg.bot_id = Some(String::new());
        assert!(!msg.is_from_agent());
        msg.bot_id = Some("B42".into());
        assert!(msg.is_from_agent());
    }

    #[test]
    fn thread_root_falls_back_to_message_ts() {
        let mut event = InboundEvent {
            text: "<@U0> hello".into(),
            channel: "C1".into(),
            ts: "2.000000".into(),
            thread_ts: None,
            user: Some("U1".into()),
            bot_id: None,
        };
        assert_eq!(event.thread_root(), "2.000000");
        event.thread_ts = Some("1.000000".into());
        assert_eq!(event.thread_root(), "1.000000");
    }
}
