//! Transport-agnostic webhook handling.
//!
//! An invocation is `{headers, body}` in and `{statusCode, body}` out, the
//! shape a serverless function receives. The HTTP router and the CLI's
//! `invoke` command both feed this handler.
//!
//! The response is always 200: Slack retries anything else, and a retry
//! would answer the same message twice.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use threadwise_agent::{ContextBuilder, ResponderSettings, ThreadResponder, clean_text};
use threadwise_channels::{SlackEnvelope, parse_envelope};
use threadwise_config::{AppConfig, build_secret_store};
use threadwise_core::channel::InboundEvent;
use threadwise_core::error::Error;
use threadwise_core::secrets::{SecretStore, Secrets};
use threadwise_tools::{ChecklistRegistry, FunctionDispatcher, default_registry};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::factory::{ClientFactory, LiveClientFactory};

/// Header Slack sets on redeliveries.
pub const RETRY_NUM_HEADER: &str = "X-Slack-Retry-Num";

/// An inbound webhook call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl InvocationEvent {
    pub fn new(headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            headers: Some(headers),
            body: Some(body.into()),
        }
    }

    /// Whether this is a redelivery of an event already received.
    pub fn is_retry(&self) -> bool {
        self.headers
            .as_ref()
            .is_some_and(|h| h.keys().any(|k| k.eq_ignore_ascii_case(RETRY_NUM_HEADER)))
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// What goes back to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

impl InvocationResponse {
    /// 200 with no body.
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            body: String::new(),
        }
    }

    /// 200 with a JSON body.
    pub fn ok_json(value: serde_json::Value) -> Self {
        Self {
            status_code: 200,
            body: value.to_string(),
        }
    }

    /// The acknowledgment for a redelivery.
    pub fn no_need_to_resend() -> Self {
        Self::ok_json(serde_json::json!({ "message": "No need to resend" }))
    }
}

/// Everything an invocation needs that outlives it.
pub struct InvocationHandler {
    config: Arc<AppConfig>,
    secrets: Arc<dyn SecretStore>,
    factory: Arc<dyn ClientFactory>,
    dispatcher: Arc<FunctionDispatcher>,
    context: Arc<ContextBuilder>,
    settings: Arc<ResponderSettings>,
}

impl InvocationHandler {
    pub fn new(
        config: AppConfig,
        system_prompt: String,
        checklists: ChecklistRegistry,
        secrets: Arc<dyn SecretStore>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        let dispatcher = FunctionDispatcher::new(default_registry(Arc::new(checklists)));
        let context = ContextBuilder::new(system_prompt, config.prompt.context_window);
        let settings = ResponderSettings::from_config(&config);
        Self {
            config: Arc::new(config),
            secrets,
            factory,
            dispatcher: Arc::new(dispatcher),
            context: Arc::new(context),
            settings: Arc::new(settings),
        }
    }

    /// Production wiring: prompt and checklists from disk (or built in), the
    /// configured secret backend, live clients.
    ///
    /// A missing system prompt or unreadable checklist directory fails here,
    /// at startup, rather than on the first message.
    pub fn from_config(config: AppConfig) -> Result<Self, Error> {
        let system_prompt = config.load_system_prompt()?;
        let checklists = ChecklistRegistry::load(config.knowledge.checklist_dir.as_deref())
            .map_err(|e| Error::Config {
                message: e.to_string(),
            })?;
        let secrets = build_secret_store(&config.secrets);
        Ok(Self::new(
            config,
            system_prompt,
            checklists,
            secrets,
            Arc::new(LiveClientFactory),
        ))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle one webhook call.
    pub async fn handle(&self, event: InvocationEvent) -> InvocationResponse {
        let id = uuid::Uuid::new_v4();
        let span = info_span!("invocation", id = %id);
        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: InvocationEvent) -> InvocationResponse {
        // Before anything with side effects
        if event.is_retry() {
            info!("Redelivered event, skipping");
            return InvocationResponse::no_need_to_resend();
        }

        let envelope = match parse_envelope(event.body()) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Unreadable webhook body");
                return InvocationResponse::ok();
            }
        };

        match envelope {
            SlackEnvelope::UrlVerification { challenge } => {
                info!("URL verification handshake");
                InvocationResponse::ok_json(serde_json::json!({ "challenge": challenge }))
            }
            SlackEnvelope::EventCallback { event } => {
                if event.is_from_bot() {
                    debug!(bot_id = ?event.bot_id, "Ignoring bot message");
                    return InvocationResponse::ok();
                }
                if let Err(e) = self.answer(&event).await {
                    error!(error = %e, channel = %event.channel, "Invocation failed");
                }
                InvocationResponse::ok()
            }
            SlackEnvelope::Other => {
                debug!("Ignoring envelope type");
                InvocationResponse::ok()
            }
        }
    }

    async fn answer(&self, event: &InboundEvent) -> Result<(), Error> {
        info!(
            input = %clean_text(&event.text),
            channel = %event.channel,
            thread = %event.thread_root(),
            user = ?event.user,
            "Handling message"
        );

        let secrets = Secrets::fetch(
            self.secrets.as_ref(),
            &self.config.secrets.name,
            &self.config.secrets.region,
        )
        .await?;
        let collaborators = self.factory.build(&secrets, &self.config)?;

        let responder = ThreadResponder::new(
            collaborators.provider,
            collaborators.platform,
            self.dispatcher.clone(),
            self.context.clone(),
            self.settings.clone(),
        );
        responder.respond(event).await?;
        Ok(())
    }
}
