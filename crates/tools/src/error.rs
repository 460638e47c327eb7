//! Tool dispatch error types

use sauti_core::InvalidFieldValue;
use sauti_persistence::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required parameter '{key}' for {tool}")]
    MissingValue {
        tool: &'static str,
        key: &'static str,
    },

    #[error(transparent)]
    InvalidValue(#[from] InvalidFieldValue),

    #[error("Store write failed: {0}")]
    Store(#[from] StoreError),
}
