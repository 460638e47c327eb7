//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Local development: misconfigurations log warnings instead of failing
    #[default]
    Development,
    /// Pre-production
    Staging,
    /// Production: full validation, warnings for risky settings
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// True for environments that should reject questionable settings
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store configuration (ScyllaDB)
    #[serde(default)]
    pub store: StoreConfig,

    /// Anthropic API configuration (field extraction)
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI-compatible API configuration (translation)
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Voice vendor configuration (tokens + audio retrieval)
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Session lifecycle configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every section, failing on the first invalid value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_store()?;
        self.validate_llm()?;
        self.validate_session()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_connections".to_string(),
                message: "Max connections must be at least 1".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS enabled in production with no configured origins, \
                 browsers outside the dev default will be rejected"
            );
        }

        Ok(())
    }

    fn validate_store(&self) -> Result<(), ConfigError> {
        let store = &self.store;

        if store.enabled {
            if store.hosts.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "store.hosts".to_string(),
                    message: "At least one host is required when the store is enabled".to_string(),
                });
            }

            if store.replication_factor == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "store.replication_factor".to_string(),
                    message: "Replication factor must be at least 1".to_string(),
                });
            }
        } else if self.environment.is_production() {
            tracing::warn!("Store disabled in production, records are held in memory only");
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        if self.anthropic.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "anthropic.max_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.openai.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "openai.max_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "openai.temperature".to_string(),
                message: format!(
                    "Must be between 0.0 and 2.0, got {}",
                    self.openai.temperature
                ),
            });
        }

        // Missing keys are runtime failures (500 on extraction, tagged text
        // on translation), not boot failures.
        if self.anthropic.api_key.is_none() {
            tracing::warn!("Anthropic API key not configured, field extraction will fail");
        }
        if self.openai.api_key.is_none() {
            tracing::warn!(
                "OpenAI API key not configured, translations will degrade to tagged originals"
            );
        }
        if self.voice.api_key.is_none() || self.voice.secret_key.is_none() {
            tracing::warn!(
                "Voice vendor credentials not configured, token and audio endpoints will fail"
            );
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        if self.session.idle_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.idle_timeout_seconds".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        if self.session.cleanup_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.cleanup_interval_seconds".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path the voice session WebSocket is mounted on
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Cap on simultaneously open voice sessions
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Toggle the CORS layer (disabling it allows every origin)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Origins the dashboard may call from; empty means localhost:3000 only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ws_path() -> String {
    "/ws/session".to_string()
}
fn default_max_connections() -> usize {
    1000
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
            max_connections: default_max_connections(),
            timeout_seconds: default_timeout(),
            cors_enabled: default_true(),
            // Production deployments list their dashboard origins here
            cors_origins: Vec::new(),
        }
    }
}

/// Record store configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    /// ScyllaDB host addresses
    #[serde(default = "default_store_hosts")]
    pub hosts: Vec<String>,

    /// ScyllaDB keyspace name
    #[serde(default = "default_store_keyspace")]
    pub keyspace: String,

    /// ScyllaDB replication factor
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_store_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_store_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "sauti".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false, // Disabled by default for development
            hosts: default_store_hosts(),
            keyspace: default_store_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Anthropic API configuration, used by the field extraction service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (ANTHROPIC_API_KEY)
    #[serde(default = "default_anthropic_api_key")]
    pub api_key: Option<String>,

    /// API endpoint
    #[serde(default = "default_anthropic_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Maximum tokens per completion
    #[serde(default = "default_anthropic_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

fn default_anthropic_api_key() -> Option<String> {
    std::env::var("ANTHROPIC_API_KEY").ok()
}
fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_anthropic_max_tokens() -> u32 {
    1024
}
fn default_llm_timeout() -> u64 {
    30
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: default_anthropic_api_key(),
            endpoint: default_anthropic_endpoint(),
            model: default_anthropic_model(),
            max_tokens: default_anthropic_max_tokens(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

/// OpenAI-compatible API configuration, used by the translation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (OPENAI_API_KEY)
    #[serde(default = "default_openai_api_key")]
    pub api_key: Option<String>,

    /// API endpoint (any /chat/completions-compatible base)
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

fn default_openai_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_openai_temperature() -> f32 {
    0.3
}
fn default_openai_max_tokens() -> u32 {
    2000
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: default_openai_api_key(),
            endpoint: default_openai_endpoint(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

/// Voice vendor configuration (access tokens + recorded audio lookup)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Vendor API key (HUME_API_KEY)
    #[serde(default = "default_voice_api_key")]
    pub api_key: Option<String>,

    /// Vendor secret key (HUME_SECRET_KEY)
    #[serde(default = "default_voice_secret_key")]
    pub secret_key: Option<String>,

    /// Vendor API endpoint
    #[serde(default = "default_voice_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

fn default_voice_api_key() -> Option<String> {
    std::env::var("HUME_API_KEY").ok()
}
fn default_voice_secret_key() -> Option<String> {
    std::env::var("HUME_SECRET_KEY").ok()
}
fn default_voice_endpoint() -> String {
    "https://api.hume.ai".to_string()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_key: default_voice_api_key(),
            secret_key: default_voice_secret_key(),
            endpoint: default_voice_endpoint(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds of silence before an abandoned session is finalized
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// How often the session registry sweeps for idle sessions
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

fn default_idle_timeout() -> u64 {
    300
}
fn default_cleanup_interval() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default tracing filter level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit log lines as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Serve the Prometheus scrape endpoint
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (SAUTI_ prefix)
/// 2. config/{env}.toml (if env specified)
/// 3. config/default.toml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Base file, then the environment overlay, then env vars on top
    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SAUTI")
            .separator("__")
            .try_parsing(true),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}
