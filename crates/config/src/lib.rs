//! Configuration management for the grievance voice backend
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{env}.toml)
//! - Environment variables (SAUTI_ prefix, `__` section separator)
//!
//! Credentials fall back to the conventional bare environment variables
//! (ANTHROPIC_API_KEY, OPENAI_API_KEY, HUME_API_KEY, HUME_SECRET_KEY,
//! SCYLLA_HOSTS) when not set through the layered sources.

pub mod settings;

pub use settings::{
    load_settings, AnthropicConfig, ObservabilityConfig, OpenAiConfig, RuntimeEnvironment,
    ServerConfig, SessionConfig, Settings, StoreConfig, VoiceConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Could not parse configuration: {0}")]
    ParseError(String),

    #[error("Required field missing: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
