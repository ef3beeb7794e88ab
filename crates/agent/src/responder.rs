//! One invocation end to end: read the thread, run the loop, post the answer.

use std::sync::Arc;

use async_trait::async_trait;
use threadwise_config::AppConfig;
use threadwise_core::channel::{ChatPlatform, InboundEvent};
use threadwise_core::error::Error;
use threadwise_core::message::Message;
use threadwise_core::provider::Provider;
use threadwise_telemetry::FlatRatePricing;
use threadwise_tools::FunctionDispatcher;
use tracing::{error, info, warn};

use crate::context::ContextBuilder;
use crate::formatter::{FormattedAnswer, ResponseFormatter};
use crate::orchestrator::{Orchestrator, PassObserver};

/// Settings shared by every invocation.
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_function_rounds: u32,
    pub post_first_pass: bool,
    pub failure_notice: Option<String>,
    pub pricing: FlatRatePricing,
}

impl ResponderSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.provider.model.clone(),
            temperature: config.provider.temperature,
            max_tokens: config.provider.max_tokens,
            max_function_rounds: config.orchestration.max_function_rounds,
            post_first_pass: config.delivery.post_first_pass,
            failure_notice: config.delivery.failure_notice().map(String::from),
            pricing: FlatRatePricing::new(config.pricing.usd_per_1k_tokens),
        }
    }
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Posts the raw first-pass assistant message as JSON.
struct FirstPassPoster<'a> {
    platform: &'a dyn ChatPlatform,
    channel: &'a str,
    thread_ts: &'a str,
}

#[async_trait]
impl PassObserver for FirstPassPoster<'_> {
    async fn on_first_pass(&self, message: &Message) {
        match serde_json::to_string(message) {
            Ok(text) => deliver(self.platform, self.channel, &text, self.thread_ts).await,
            Err(e) => warn!(error = %e, "Could not serialize first-pass message"),
        }
    }
}

/// Post and swallow failures.
async fn deliver(platform: &dyn ChatPlatform, channel: &str, text: &str, thread_ts: &str) {
    if let Err(e) = platform.post_message(channel, text, thread_ts).await {
        warn!(channel, thread_ts, error = %e, "Delivery failed");
    }
}

/// Answers one inbound event in its thread.
pub struct ThreadResponder {
    platform: Arc<dyn ChatPlatform>,
    orchestrator: Orchestrator,
    context: Arc<ContextBuilder>,
    formatter: ResponseFormatter,
    settings: Arc<ResponderSettings>,
}

impl ThreadResponder {
    pub fn new(
        provider: Arc<dyn Provider>,
        platform: Arc<dyn ChatPlatform>,
        dispatcher: Arc<FunctionDispatcher>,
        context: Arc<ContextBuilder>,
        settings: Arc<ResponderSettings>,
    ) -> Self {
        let orchestrator = Orchestrator::new(provider, dispatcher, settings.model.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_max_function_rounds(settings.max_function_rounds);
        Self {
            platform,
            orchestrator,
            context,
            formatter: ResponseFormatter::new(settings.pricing),
            settings,
        }
    }

    /// Answer `event` and return what was posted.
    ///
    /// A failed history read aborts before any completion. A failed completion
    /// posts the failure notice (when configured) and returns the error.
    /// Failed posts are logged and otherwise ignored.
    pub async fn respond(&self, event: &InboundEvent) -> Result<FormattedAnswer, Error> {
        let channel = event.channel.as_str();
        let thread_ts = event.thread_root();

        let thread = self
            .platform
            .fetch_thread_replies(channel, thread_ts)
            .await?;
        let window = self.context.build(thread);

        let outcome = if self.settings.post_first_pass {
            let poster = FirstPassPoster {
                platform: self.platform.as_ref(),
                channel,
                thread_ts,
            };
            self.orchestrator.run(window, &poster).await
        } else {
            self.orchestrator
                .run(window, &crate::orchestrator::NoopObserver)
                .await
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(channel, thread_ts, error = %e, "Completion loop failed");
                if let (Error::Provider(_), Some(notice)) = (&e, &self.settings.failure_notice) {
                    deliver(self.platform.as_ref(), channel, notice, thread_ts).await;
                }
                return Err(e);
            }
        };

        outcome.usage.log(&self.settings.pricing);
        let answer = self.formatter.format(&outcome.response);
        deliver(
            self.platform.as_ref(),
            channel,
            &answer.display_text,
            thread_ts,
        )
        .await;

        info!(
            channel,
            thread_ts,
            total_tokens = answer.annotation.usage.total_tokens,
            "Answer delivered"
        );
        Ok(answer)
    }
}
