//! Configuration loading, validation, and management for threadwise.
//!
//! Loads configuration from `$THREADWISE_CONFIG` or `~/.threadwise/config.toml`
//! and applies the deployment's environment variables on top. Validates all
//! settings at startup.

pub mod secret_store;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use secret_store::{EnvSecretStore, FileSecretStore, build_secret_store};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "THREADWISE_CONFIG";
/// Secret name override.
pub const SECRET_NAME_ENV: &str = "ENV_SECRET_NAME";
/// Secret region override.
pub const REGION_NAME_ENV: &str = "ENV_REGION_NAME";
/// System prompt template path override.
pub const SYSTEM_PROMPT_ENV: &str = "ENV_SYSTEM_PROMPT_BASE";
/// Model identifier override.
pub const MODEL_ENV: &str = "ENV_GPT_MODEL";

/// The root configuration structure.
///
/// Maps directly to `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion API settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Instruction template and history window
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Function-calling limits
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// What gets posted back to the thread
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Cost annotation rate
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Where credentials come from
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Local knowledge sources
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// HTTP listener
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Label used in logs
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// OpenAI-compatible API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo-0613".into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// File holding the fixed behavioral instructions
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt_path: PathBuf,

    /// Most recent thread messages kept in the window
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("prompts/system_prompt_base.txt")
}
fn default_context_window() -> usize {
    30
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt_path: default_system_prompt_path(),
            context_window: default_context_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Function-call round-trips allowed per invocation
    #[serde(default = "default_max_function_rounds")]
    pub max_function_rounds: u32,
}

fn default_max_function_rounds() -> u32 {
    1
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_function_rounds: default_max_function_rounds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Post the raw first-pass assistant message as an acknowledgment
    #[serde(default = "default_true")]
    pub post_first_pass: bool,

    /// Posted when a completion call fails. Empty = post nothing.
    #[serde(default = "default_failure_notice")]
    pub failure_notice: String,
}

fn default_failure_notice() -> String {
    "Sorry, I could not get an answer from the language model. Please try again later.".into()
}

impl DeliveryConfig {
    /// The notice to post on completion failure, if any.
    pub fn failure_notice(&self) -> Option<&str> {
        Some(self.failure_notice.as_str()).filter(|s| !s.trim().is_empty())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            post_first_pass: true,
            failure_notice: default_failure_notice(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_usd_per_1k_tokens")]
    pub usd_per_1k_tokens: f64,
}

fn default_usd_per_1k_tokens() -> f64 {
    0.002
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            usd_per_1k_tokens: default_usd_per_1k_tokens(),
        }
    }
}

/// Which [`threadwise_core::SecretStore`] backend to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// JSON document in an environment variable
    #[default]
    Env,
    /// JSON document in `<dir>/<name>.json`
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Secret identifier
    #[serde(default = "default_secret_name")]
    pub name: String,

    /// Region of the secret store
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub backend: SecretBackend,

    /// Directory for the `file` backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_secret_name() -> String {
    "threadwise".into()
}
fn default_region() -> String {
    "ap-northeast-1".into()
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            name: default_secret_name(),
            region: default_region(),
            backend: SecretBackend::default(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Load checklists from this directory instead of the built-in set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$THREADWISE_CONFIG` (or the default path),
    /// then apply environment overrides:
    /// - `ENV_SECRET_NAME`, `ENV_REGION_NAME`
    /// - `ENV_SYSTEM_PROMPT_BASE`
    /// - `ENV_GPT_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply deployment environment variables. Non-empty values win over the file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get(SECRET_NAME_ENV) {
            self.secrets.name = name;
        }
        if let Some(region) = get(REGION_NAME_ENV) {
            self.secrets.region = region;
        }
        if let Some(path) = get(SYSTEM_PROMPT_ENV) {
            self.prompt.system_prompt_path = PathBuf::from(path);
        }
        if let Some(model) = get(MODEL_ENV) {
            self.provider.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".threadwise")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.provider.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "provider.temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.model must not be empty".into(),
            ));
        }

        if self.prompt.context_window == 0 {
            return Err(ConfigError::ValidationError(
                "prompt.context_window must be at least 1".into(),
            ));
        }

        let rate = self.pricing.usd_per_1k_tokens;
        if !rate.is_finite() || rate < 0.0 {
            return Err(ConfigError::ValidationError(
                "pricing.usd_per_1k_tokens must be a non-negative number".into(),
            ));
        }

        if self.secrets.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "secrets.name must not be empty".into(),
            ));
        }

        if self.secrets.backend == SecretBackend::File && self.secrets.dir.is_none() {
            return Err(ConfigError::ValidationError(
                "secrets.dir is required for the file backend".into(),
            ));
        }

        Ok(())
    }

    /// Read the system prompt template.
    ///
    /// A missing or empty template is a configuration error: without it the
    /// assistant has no instructions.
    pub fn load_system_prompt(&self) -> Result<String, ConfigError> {
        let path = &self.prompt.system_prompt_path;
        let prompt = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "system prompt template {} is empty",
                path.display()
            )));
        }
        Ok(prompt)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for threadwise_core::Error {
    fn from(e: ConfigError) -> Self {
        threadwise_core::Error::Config {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.prompt.context_window, 30);
        assert_eq!(config.orchestration.max_function_rounds, 1);
        assert!((config.pricing.usd_per_1k_tokens - 0.002).abs() < f64::EPSILON);
        assert!(config.delivery.post_first_pass);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.model, config.provider.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[provider]
model = "gpt-4-0613"

[secrets]
backend = "file"
dir = "/var/secrets"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.model, "gpt-4-0613");
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.secrets.backend, SecretBackend::File);
        assert_eq!(config.prompt.context_window, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.provider.temperature = Some(5.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_window_rejected() {
        let mut config = AppConfig::default();
        config.prompt.context_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_backend_requires_dir() {
        let mut config = AppConfig::default();
        config.secrets.backend = SecretBackend::File;
        assert!(config.validate().is_err());
        config.secrets.dir = Some(PathBuf::from("/tmp"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (SECRET_NAME_ENV, "prod/slack-bot"),
            (REGION_NAME_ENV, "us-east-1"),
            (SYSTEM_PROMPT_ENV, "/opt/prompt.txt"),
            (MODEL_ENV, "gpt-4-0613"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.secrets.name, "prod/slack-bot");
        assert_eq!(config.secrets.region, "us-east-1");
        assert_eq!(
            config.prompt.system_prompt_path,
            PathBuf::from("/opt/prompt.txt")
        );
        assert_eq!(config.provider.model, "gpt-4-0613");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|_| Some("  ".into()));
        assert_eq!(config.provider.model, "gpt-3.5-turbo-0613");
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider.name, "openai");
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[prompt]\ncontext_window = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn system_prompt_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "You are the infrastructure desk assistant.").unwrap();

        let mut config = AppConfig::default();
        config.prompt.system_prompt_path = path;
        assert_eq!(
            config.load_system_prompt().unwrap(),
            "You are the infrastructure desk assistant."
        );
    }

    #[test]
    fn missing_or_empty_system_prompt_is_fatal() {
        let mut config = AppConfig::default();
        config.prompt.system_prompt_path = PathBuf::from("/nonexistent/prompt.txt");
        assert!(matches!(
            config.load_system_prompt(),
            Err(ConfigError::ReadError { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n").unwrap();
        config.prompt.system_prompt_path = path;
        assert!(matches!(
            config.load_system_prompt(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn blank_failure_notice_disables_it() {
        let mut delivery = DeliveryConfig::default();
        assert!(delivery.failure_notice().is_some());
        delivery.failure_notice = "   ".into();
        assert!(delivery.failure_notice().is_none());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-3.5-turbo-0613"));
        assert!(toml_str.contains("context_window = 30"));
    }
}
