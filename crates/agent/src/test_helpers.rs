//! Scripted stand-ins for the completion API and the chat platform.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use threadwise_core::channel::{ChatPlatform, ThreadMessage};
use threadwise_core::error::{ChannelError, ProviderError};
use threadwise_core::message::{FunctionCall, Message};
use threadwise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use threadwise_tools::{ChecklistRegistry, FunctionDispatcher, default_registry};

/// A provider that replays a fixed sequence of results and records every request.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no result scripted for call #{call}"))
    }
}

/// A text answer with the given token counts.
pub fn text_response(text: &str, prompt_tokens: u32, completion_tokens: u32) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
        model: "mock-model".into(),
    }
}

/// A function-call reply (80 prompt + 20 completion tokens).
pub fn function_call_response(name: &str, arguments: &str) -> ProviderResponse {
    let mut message = Message::assistant("");
    message.function_call = Some(FunctionCall::new(name, arguments));
    ProviderResponse {
        message,
        usage: Usage {
            prompt_tokens: 80,
            completion_tokens: 20,
            total_tokens: 100,
        },
        model: "mock-model".into(),
    }
}

/// Dispatcher over the built-in catalog.
pub fn test_dispatcher() -> FunctionDispatcher {
    let checklists = ChecklistRegistry::builtin().expect("built-in checklists parse");
    FunctionDispatcher::new(default_registry(Arc::new(checklists)))
}

/// One recorded `post_message` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub channel: String,
    pub text: String,
    pub thread_ts: String,
}

/// A platform serving a fixed thread and recording posts.
#[derive(Default)]
pub struct RecordingPlatform {
    thread: Vec<ThreadMessage>,
    fail_fetch: bool,
    fail_posts: bool,
    fetches: Mutex<Vec<(String, String)>>,
    posts: Mutex<Vec<Post>>,
}

impl RecordingPlatform {
    pub fn with_thread(thread: Vec<ThreadMessage>) -> Self {
        Self {
            thread,
            ..Self::default()
        }
    }

    /// Every fetch fails with `ok: false`.
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Every post fails with `ok: false`.
    pub fn failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<(String, String)> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    fn name(&self) -> &str {
        "recording"
    }

    async fn fetch_thread_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<ThreadMessage>, ChannelError> {
        self.fetches
            .lock()
            .unwrap()
            .push((channel.to_string(), thread_ts.to_string()));
        if self.fail_fetch {
            return Err(ChannelError::Api {
                method: "conversations.replies".into(),
                error: "thread_not_found".into(),
            });
        }
        Ok(self.thread.clone())
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: &str,
    ) -> Result<(), ChannelError> {
        self.posts.lock().unwrap().push(Post {
            channel: channel.into(),
            text: text.into(),
            thread_ts: thread_ts.into(),
        });
        if self.fail_posts {
            return Err(ChannelError::Api {
                method: "chat.postMessage".into(),
                error: "not_in_channel".into(),
            });
        }
        Ok(())
    }
}

/// A human message in a thread.
pub fn human(ts: &str, text: &str) -> ThreadMessage {
    ThreadMessage {
        ts: ts.into(),
        text: text.into(),
        user: Some("U1".into()),
        bot_id: None,
    }
}

/// A message posted by the agent.
pub fn agent(ts: &str, text: &str) -> ThreadMessage {
    ThreadMessage {
        ts: ts.into(),
        text: text.into(),
        user: None,
        bot_id: Some("B0AGENT".into()),
    }
}

