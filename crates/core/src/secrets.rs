//! SecretStore trait and the credential document it yields.
//!
//! Credentials are fetched on every invocation and used to build that
//! invocation's clients; nothing is cached process-wide.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SecretError;

/// Source of secret documents (a managed secret store, a file, the environment).
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the raw secret document named `name` in `region`.
    async fn get_secret(&self, name: &str, region: &str) -> Result<String, SecretError>;
}

/// The credential set the handler needs.
#[derive(Clone, Deserialize)]
pub struct Secrets {
    /// Slack bot token (xoxb-...)
    #[serde(rename = "SLACK_OAUTH_TOKEN")]
    pub slack_oauth_token: String,

    /// Completion API organization id
    #[serde(rename = "OPENAI_ORGANIZATION", default)]
    pub openai_organization: Option<String>,

    /// Completion API key
    #[serde(rename = "OPENAI_API_KEY")]
    pub openai_api_key: String,

    /// Default reward address. Present in the secret set, not consumed yet.
    #[serde(rename = "EOA_SST_FUND", default)]
    pub default_address: Option<String>,
}

impl Secrets {
    /// Parse a secret document.
    pub fn from_json(document: &str) -> Result<Self, SecretError> {
        serde_json::from_str(document).map_err(|e| SecretError::Malformed(e.to_string()))
    }

    /// Fetch and parse in one step.
    pub async fn fetch(
        store: &dyn SecretStore,
        name: &str,
        region: &str,
    ) -> Result<Self, SecretError> {
        let document = store.get_secret(name, region).await?;
        Self::from_json(&document)
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("slack_oauth_token", &"[REDACTED]")
            .field("openai_organization", &redact(&self.openai_organization))
            .field("openai_api_key", &"[REDACTED]")
            .field("default_address", &redact(&self.default_address))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStore(&'static str);

    #[async_trait]
    impl SecretStore for FixedStore {
        async fn get_secret(&self, _name: &str, _region: &str) -> Result<String, SecretError> {
            Ok(self.0.to_string())
        }
    }

    const DOCUMENT: &str = r#"{
        "SLACK_OAUTH_TOKEN": "xoxb-1",
        "OPENAI_ORGANIZATION": "org-1",
        "OPENAI_API_KEY": "sk-1",
        "EOA_SST_FUND": "0xabc"
    }"#;

    #[test]
    fn parses_full_document() {
        let secrets = Secrets::from_json(DOCUMENT).unwrap();
        assert_eq!(secrets.slack_oauth_token, "xoxb-1");
        assert_eq!(secrets.openai_organization.as_deref(), Some("org-1"));
        assert_eq!(secrets.openai_api_key, "sk-1");
        assert_eq!(secrets.default_address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let secrets =
            Secrets::from_json(r#"{"SLACK_OAUTH_TOKEN":"x","OPENAI_API_KEY":"y"}"#).unwrap();
        assert!(secrets.openai_organization.is_none());
        assert!(secrets.default_address.is_none());
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let err = Secrets::from_json(r#"{"OPENAI_API_KEY":"y"}"#).unwrap_err();
        assert!(matches!(err, SecretError::Malformed(_)));
    }

    #[test]
    fn debug_redacts_every_value() {
        let secrets = Secrets::from_json(DOCUMENT).unwrap();
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("xoxb-1"));
        assert!(!debug.contains("sk-1"));
        assert!(!debug.contains("org-1"));
        assert!(!debug.contains("0xabc"));
    }

    #[tokio::test]
    async fn fetch_parses_store_output() {
        let secrets = Secrets::fetch(&FixedStore(DOCUMENT), "name", "region")
            .await
            .unwrap();
        assert_eq!(secrets.openai_api_key, "sk-1");
    }
}
