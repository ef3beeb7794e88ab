//! Chat completion providers for threadwise.
//!
//! All providers implement the `threadwise_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
