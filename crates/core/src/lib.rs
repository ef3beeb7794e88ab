//! # threadwise core
//!
//! Domain types, collaborator traits, and error definitions for the threadwise
//! Slack assistant. This crate has **no I/O dependencies**: it defines the
//! model that the provider, channel, tool, and agent crates implement against.
//!
//! ## Collaborators
//!
//! Every external system is a trait here:
//! - [`Provider`]: the chat completion API
//! - [`ChatPlatform`]: thread history and message delivery
//! - [`SecretStore`]: per-invocation credentials
//! - [`Tool`]: a local function the model may call
//!
//! Implementations live in their own crates, so the orchestration logic can be
//! tested against scripted stand-ins.

pub mod channel;
pub mod error;
pub mod message;
pub mod provider;
pub mod secrets;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use channel::{ChatPlatform, InboundEvent, SlackTs, ThreadMessage, thread_span};
pub use error::{Error, Result};
pub use message::{ConversationWindow, FunctionCall, Message, Role};
pub use provider::{FunctionCallPolicy, Provider, ProviderRequest, ProviderResponse, Usage};
pub use secrets::{SecretStore, Secrets};
pub use tool::{FunctionDeclaration, ParameterSpec, Tool, ToolRegistry};
