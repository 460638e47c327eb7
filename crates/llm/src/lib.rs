//! LLM clients for the grievance backend
//!
//! Two hosted APIs sit behind one `ChatBackend` trait:
//! - Anthropic messages (field extraction, supports assistant prefill)
//! - OpenAI-compatible chat completions (transcript translation)
//!
//! The trait seam exists so services can run against mock backends in tests.

pub mod backend;
pub mod claude;
pub mod openai;
pub mod translation;

pub use backend::{ChatBackend, ChatRequest};
pub use claude::{ClaudeClient, ClaudeConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use translation::{language_name, Translator};

use thiserror::Error;

/// Errors shared by both hosted-API clients
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}
