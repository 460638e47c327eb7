//! Agent error types

use sauti_core::InvalidTransition;
use sauti_llm::LlmError;
use sauti_persistence::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Server configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Field extraction failed: {0}")]
    MalformedExtraction(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl AgentError {
    /// True when the underlying cause is a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentError::Store(err) if err.is_not_found())
    }
}
