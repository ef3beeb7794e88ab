//! Slack Web API client.
//!
//! Implements [`ChatPlatform`] over two methods:
//! - `conversations.replies` to read a whole thread (cursor-paginated)
//! - `chat.postMessage` to answer inside the thread
//!
//! Slack reports most failures as HTTP 200 with `"ok": false`; those become
//! [`ChannelError::Api`] with Slack's error code.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use threadwise_core::channel::{ChatPlatform, ThreadMessage};
use threadwise_core::error::ChannelError;
use tracing::{debug, warn};

/// Production Web API root.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Page size requested from `conversations.replies`.
const REPLIES_PAGE_LIMIT: u32 = 200;

/// Slack Web API client bound to one bot token.
pub struct SlackClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Result<Self, ChannelError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ChannelError::NotConfigured("Slack bot token is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChannelError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            token,
            base_url: SLACK_API_BASE.to_string(),
            client,
        })
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, ChannelError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Api {
                method: method.into(),
                error: format!("HTTP {}: {body}", status.as_u16()),
            });
        }
        response.json::<T>().await.map_err(|e| ChannelError::Api {
            method: method.into(),
            error: format!("unreadable response: {e}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<ThreadMessage>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

fn api_error(method: &str, error: Option<String>) -> ChannelError {
    ChannelError::Api {
        method: method.into(),
        error: error.unwrap_or_else(|| "unknown_error".into()),
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    fn name(&self) -> &str {
        "slack"
    }

    async fn fetch_thread_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<ThreadMessage>, ChannelError> {
        const METHOD: &str = "conversations.replies";
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.url(METHOD))
                .bearer_auth(&self.token)
                .query(&[
                    ("channel", channel),
                    ("ts", thread_ts),
                    ("limit", REPLIES_PAGE_LIMIT.to_string().as_str()),
                ]);
            if let Some(c) = &cursor {
                request = request.query(&[("cursor", c)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ChannelError::Network(e.to_string()))?;

            let page: RepliesResponse = Self::decode(METHOD, response).await?;
            if !page.ok {
                warn!(channel, thread_ts, error = ?page.error, "conversations.replies rejected");
                return Err(api_error(METHOD, page.error));
            }

            messages.extend(page.messages);

            let next = page
                .response_metadata
                .map(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            match next {
                Some(c) if cursor.as_deref() != Some(c.as_str()) => cursor = Some(c),
                _ => break,
            }
        }

        debug!(channel, thread_ts, count = messages.len(), "Fetched thread");
        Ok(messages)
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: &str,
    ) -> Result<(), ChannelError> {
        const METHOD: &str = "chat.postMessage";
        let body = serde_json::json!({
            "channel": channel,
            "text": text,
            "thread_ts": thread_ts,
            "reply_broadcast": false,
        });

        let response = self
            .client
            .post(self.url(METHOD))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: channel.into(),
                reason: e.to_string(),
            })?;

        let reply: PostMessageResponse = Self::decode(METHOD, response).await?;
        if !reply.ok {
            return Err(api_error(METHOD, reply.error));
        }

        debug!(channel, thread_ts, ts = ?reply.ts, content_len = text.len(), "Posted message");
        Ok(())
    }
}
