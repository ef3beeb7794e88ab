//! Provider trait: the abstraction over the chat completion API.
//!
//! A Provider sends a conversation (plus, optionally, the catalog of local
//! functions the model may call) and returns the model's chosen message with
//! its token usage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::FunctionDeclaration;

/// Whether the model may decide to call a declared function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionCallPolicy {
    /// The model chooses between answering and calling a function.
    Auto,
    /// Function calls are not permitted.
    #[default]
    None,
}

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-3.5-turbo-0613")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Functions the model may call; empty means none are offered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionDeclaration>,

    /// Function-call policy; only meaningful when `functions` is non-empty
    #[serde(default)]
    pub function_call: FunctionCallPolicy,

    /// Sampling temperature; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderRequest {
    /// A plain request with no functions offered.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            functions: Vec::new(),
            function_call: FunctionCallPolicy::None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Offer the given functions with policy `auto`.
    pub fn with_functions(mut self, functions: Vec<FunctionDeclaration>) -> Self {
        self.function_call = if functions.is_empty() {
            FunctionCallPolicy::None
        } else {
            FunctionCallPolicy::Auto
        };
        self.functions = functions;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated assistant message (content and/or a function call)
    pub message: Message,

    /// Token usage statistics
    pub usage: Usage,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The orchestrator calls `complete()` without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;
}
