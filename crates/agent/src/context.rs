//! Thread history → conversation window.

use std::sync::LazyLock;

use regex::Regex;
use threadwise_core::channel::{ThreadMessage, thread_span};
use threadwise_core::message::{ConversationWindow, Message};
use threadwise_telemetry::strip_annotations;
use tracing::debug;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@[^>]*>").expect("mention pattern is valid"));

/// Remove user mentions and earlier cost annotations, then trim.
///
/// Both removals run until the text stops changing: taking out one kind
/// can splice together an instance of the other.
pub fn clean_text(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = {
            let without_mentions = MENTION.replace_all(&current, "");
            strip_annotations(&without_mentions).into_owned()
        };
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

/// Builds the window sent to the model from a thread's raw messages.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt: String,
    window_size: usize,
}

impl ContextBuilder {
    pub fn new(system_prompt: impl Into<String>, window_size: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            window_size: window_size.max(1),
        }
    }

    /// Order by timestamp, keep the most recent messages, clean their text and
    /// attribute roles. The system prompt always leads.
    pub fn build(&self, mut thread: Vec<ThreadMessage>) -> ConversationWindow {
        thread.sort_by_key(ThreadMessage::emission_key);
        let skip = thread.len().saturating_sub(self.window_size);
        if let Some((from, to)) = thread_span(&thread[skip..]) {
            debug!(%from, %to, "Window time span");
        }

        let history: Vec<Message> = thread
            .into_iter()
            .skip(skip)
            .map(|m| {
                let text = clean_text(&m.text);
                if m.is_from_agent() {
                    Message::assistant(text)
                } else {
                    Message::user(text)
                }
            })
            .collect();

        debug!(kept = history.len(), dropped = skip, "Built conversation window");
        ConversationWindow::new(self.system_prompt.clone(), history)
    }
}
