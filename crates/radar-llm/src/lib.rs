//! HTTP-backed LLM collaborator for narrative clustering.

pub mod anthropic;
pub mod error;

pub use anthropic::AnthropicBackend;
pub use error::LlmError;
