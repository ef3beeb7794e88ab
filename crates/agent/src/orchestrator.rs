//! The function-calling completion loop.
//!
//! ```text
//! FIRST_PASS ──function_call──▶ FUNCTION_EXEC ──▶ SECOND_PASS ──▶ DONE
//!      └────────text───────────────────────────────────────────────▲
//! ```
//!
//! Generalized to `max_function_rounds` rounds: every call before the last
//! permitted one offers the catalog, the last never does. With the default of
//! one round this is exactly the two-pass flow above, and no invocation makes
//! more than `max_function_rounds + 1` completion calls.

use std::sync::Arc;

use async_trait::async_trait;
use threadwise_core::error::{Error, ToolError};
use threadwise_core::message::{ConversationWindow, Message};
use threadwise_core::provider::{Provider, ProviderRequest, ProviderResponse};
use threadwise_telemetry::InvocationUsage;
use threadwise_tools::FunctionDispatcher;
use tracing::{debug, info, warn};

/// Notified of the first completion's assistant message, before anything
/// else happens with it.
#[async_trait]
pub trait PassObserver: Send + Sync {
    async fn on_first_pass(&self, message: &Message);
}

/// Observer that does nothing.
pub struct NoopObserver;

#[async_trait]
impl PassObserver for NoopObserver {
    async fn on_first_pass(&self, _message: &Message) {}
}

/// Result of a completed loop.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The response whose content is the answer
    pub response: ProviderResponse,
    /// Totals over every call of the loop
    pub usage: InvocationUsage,
    /// The window as sent on the final call
    pub window: ConversationWindow,
}

/// Runs one invocation's completions against a provider and the local functions.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    dispatcher: Arc<FunctionDispatcher>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_function_rounds: u32,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        dispatcher: Arc<FunctionDispatcher>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            max_function_rounds: 1,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_function_rounds(mut self, rounds: u32) -> Self {
        self.max_function_rounds = rounds;
        self
    }

    /// Drive the loop to a final answer.
    ///
    /// Completion failures are returned as-is and never retried. An unknown
    /// topic becomes an `{"error": ...}` function result so the model can tell
    /// the user; other dispatch failures abort the invocation.
    pub async fn run(
        &self,
        mut window: ConversationWindow,
        observer: &dyn PassObserver,
    ) -> Result<Outcome, Error> {
        let mut usage = InvocationUsage::default();
        let mut round: u32 = 0;

        loop {
            let offer_functions = round < self.max_function_rounds;
            let mut request = ProviderRequest::new(&self.model, window.messages().to_vec())
                .with_temperature(self.temperature)
                .with_max_tokens(self.max_tokens);
            if offer_functions {
                request = request.with_functions(self.dispatcher.declarations());
            }

            debug!(
                provider = self.provider.name(),
                round,
                messages = request.messages.len(),
                offer_functions,
                "Requesting completion"
            );
            let response = self.provider.complete(request).await?;
            usage.record_completion(&response.usage);

            if round == 0 {
                observer.on_first_pass(&response.message).await;
            }

            let call = match &response.message.function_call {
                Some(call) if offer_functions => call.clone(),
                Some(call) => {
                    warn!(function = %call.name, "Function call returned without a catalog, treating as final");
                    return Ok(Outcome {
                        response,
                        usage,
                        window,
                    });
                }
                None => {
                    return Ok(Outcome {
                        response,
                        usage,
                        window,
                    });
                }
            };

            info!(function = %call.name, round, "Model requested a function");
            let result = match self.dispatcher.dispatch_call(&call).await {
                Ok(value) => value,
                Err(ToolError::NotFound(reason)) => {
                    warn!(function = %call.name, %reason, "Function lookup missed");
                    serde_json::json!({ "error": reason })
                }
                Err(e) => return Err(e.into()),
            };
            usage.record_function();

            window.push(response.message);
            window.push(Message::function_result(call.name, result.to_string()));
            round += 1;
        }
    }
}
