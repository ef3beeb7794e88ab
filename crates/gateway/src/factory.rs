//! Per-invocation client construction.
//!
//! Credentials are fetched on every invocation, so the clients that carry
//! them are built per invocation too.

use std::sync::Arc;

use threadwise_channels::SlackClient;
use threadwise_config::AppConfig;
use threadwise_core::channel::ChatPlatform;
use threadwise_core::error::Error;
use threadwise_core::provider::Provider;
use threadwise_core::secrets::Secrets;
use threadwise_providers::OpenAiCompatProvider;

/// The clients one invocation talks to.
pub struct Collaborators {
    pub provider: Arc<dyn Provider>,
    pub platform: Arc<dyn ChatPlatform>,
}

pub trait ClientFactory: Send + Sync {
    fn build(&self, secrets: &Secrets, config: &AppConfig) -> Result<Collaborators, Error>;
}

/// OpenAI-compatible completions and the Slack Web API.
pub struct LiveClientFactory;

impl ClientFactory for LiveClientFactory {
    fn build(&self, secrets: &Secrets, config: &AppConfig) -> Result<Collaborators, Error> {
        let provider = OpenAiCompatProvider::from_config(
            &config.provider,
            secrets.openai_api_key.clone(),
            secrets.openai_organization.clone(),
        )?;
        let platform = SlackClient::new(secrets.slack_oauth_token.clone())?;
        Ok(Collaborators {
            provider: Arc::new(provider),
            platform: Arc::new(platform),
        })
    }
}
