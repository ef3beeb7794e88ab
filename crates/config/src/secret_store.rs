//! Secret-store backends.
//!
//! - `env`: the JSON document lives in `THREADWISE_SECRET_<NAME>`, where
//!   `<NAME>` is the secret name uppercased with every non-alphanumeric
//!   character replaced by `_`.
//! - `file`: the JSON document lives in `<dir>/<name>.json`, with `/` in
//!   the name replaced by `_`.
//!
//! The region is accepted for interface parity with managed stores and only
//! logged.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use threadwise_core::error::SecretError;
use threadwise_core::secrets::SecretStore;
use tracing::debug;

use crate::{SecretBackend, SecretsConfig};

/// Prefix of the environment variable holding a secret document.
pub const SECRET_ENV_PREFIX: &str = "THREADWISE_SECRET_";

/// Environment variable that holds the secret named `name`.
pub fn secret_env_var(name: &str) -> String {
    let suffix: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{SECRET_ENV_PREFIX}{suffix}")
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads secret documents from environment variables.
pub struct EnvSecretStore {
    lookup: Lookup,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Use a custom variable lookup instead of the process environment.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str, region: &str) -> Result<String, SecretError> {
        let var = secret_env_var(name);
        debug!(secret = name, region, var = %var, "Reading secret from environment");
        (self.lookup)(&var)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SecretError::Unavailable {
                name: name.to_string(),
                reason: format!("environment variable {var} is not set"),
            })
    }
}

/// Reads secret documents from JSON files in a directory.
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name.replace('/', "_")))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str, region: &str) -> Result<String, SecretError> {
        let path = self.path_for(name);
        debug!(secret = name, region, path = %path.display(), "Reading secret file");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SecretError::Unavailable {
                name: name.to_string(),
                reason: format!("{}: {e}", path.display()),
            })
    }
}

/// Build the store selected by `[secrets]`.
pub fn build_secret_store(config: &SecretsConfig) -> Arc<dyn SecretStore> {
    match (config.backend, &config.dir) {
        (SecretBackend::File, Some(dir)) => Arc::new(FileSecretStore::new(dir.clone())),
        // validate() rejects a file backend without a dir; fall back to env
        _ => Arc::new(EnvSecretStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadwise_core::secrets::Secrets;

    const DOCUMENT: &str = r#"{"SLACK_OAUTH_TOKEN":"xoxb-t","OPENAI_API_KEY":"sk-t"}"#;

    #[test]
    fn env_var_name_is_sanitized() {
        assert_eq!(secret_env_var("threadwise"), "THREADWISE_SECRET_THREADWISE");
        assert_eq!(
            secret_env_var("prod/slack-bot"),
            "THREADWISE_SECRET_PROD_SLACK_BOT"
        );
    }

    #[tokio::test]
    async fn env_store_reads_derived_variable() {
        let store = EnvSecretStore::with_lookup(|key| {
            (key == "THREADWISE_SECRET_PROD_BOT").then(|| DOCUMENT.to_string())
        });
        let secrets = Secrets::fetch(&store, "prod/bot", "ap-northeast-1")
            .await
            .unwrap();
        assert_eq!(secrets.slack_oauth_token, "xoxb-t");
    }

    #[tokio::test]
    async fn env_store_missing_variable_is_unavailable() {
        let store = EnvSecretStore::with_lookup(|_| None);
        let err = store.get_secret("absent", "r").await.unwrap_err();
        assert!(matches!(err, SecretError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn file_store_reads_named_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("prod_bot.json"), DOCUMENT).unwrap();

        let store = FileSecretStore::new(dir.path());
        let secrets = Secrets::fetch(&store, "prod/bot", "us-east-1").await.unwrap();
        assert_eq!(secrets.openai_api_key, "sk-t");
    }

    #[tokio::test]
    async fn file_store_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());
        let err = store.get_secret("nothing", "r").await.unwrap_err();
        assert!(matches!(err, SecretError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn builder_honors_backend() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("threadwise.json"), DOCUMENT).unwrap();

        let config = SecretsConfig {
            backend: SecretBackend::File,
            dir: Some(dir.path().to_path_buf()),
            ..SecretsConfig::default()
        };
        let store = build_secret_store(&config);
        let doc = store.get_secret("threadwise", "r").await.unwrap();
        assert_eq!(doc, DOCUMENT);
    }
}
