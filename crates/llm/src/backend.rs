//! Chat backend trait

use async_trait::async_trait;

use crate::LlmError;

/// A single-shot chat completion request
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// System instruction
    pub system: Option<String>,
    /// User message
    pub user: String,
    /// Assistant prefill. Backends that support it constrain the completion
    /// to continue after this text; the prefill itself is not echoed back.
    pub prefill: Option<String>,
}

impl ChatRequest {
    /// Create a request with just a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            system: None,
            user: content.into(),
            prefill: None,
        }
    }

    /// Set the system instruction
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the assistant prefill
    pub fn with_prefill(mut self, prefill: impl Into<String>) -> Self {
        self.prefill = Some(prefill.into());
        self
    }
}

/// Backend for one-shot chat completions (hosted APIs, test mocks)
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion and return the raw response text
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Model identifier, used for logging
    fn model_name(&self) -> &str;
}
