//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Duration;

use sauti_agent::{ExtractionService, SessionLifecycle};
use sauti_config::Settings;
use sauti_core::Language;
use sauti_llm::{ChatBackend, ClaudeClient, ClaudeConfig, OpenAiClient, Translator};
use sauti_persistence::GrievanceStore;
use sauti_tools::ToolDispatcher;

use crate::session::SessionManager;
use crate::voice::{VoiceVendorClient, VoiceVendorConfig};
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Settings>,
    /// Grievance record store (ScyllaDB or in-memory)
    pub store: Arc<dyn GrievanceStore>,
    /// Transcript translator
    pub translator: Arc<Translator>,
    /// AI field extraction service
    pub extraction: Arc<ExtractionService>,
    /// Tool call dispatcher shared by all sessions
    pub dispatcher: Arc<ToolDispatcher>,
    /// Live session registry
    pub sessions: Arc<SessionManager>,
    /// Voice vendor API client
    pub voice: Arc<VoiceVendorClient>,
}

impl AppState {
    /// Create application state backed by an in-memory store
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        let store = sauti_persistence::init_in_memory().grievances;
        Self::with_store(config, store)
    }

    /// Create application state with a custom grievance store (e.g. ScyllaDB)
    pub fn with_store(
        config: Settings,
        store: Arc<dyn GrievanceStore>,
    ) -> Result<Self, ServerError> {
        let translator = Arc::new(Translator::new(translation_backend(&config)));
        let extraction = Arc::new(ExtractionService::new(
            store.clone(),
            extraction_backend(&config),
        ));
        let dispatcher = Arc::new(ToolDispatcher::new(store.clone()));

        let sessions = Arc::new(SessionManager::new(
            config.server.max_connections,
            Duration::from_secs(config.session.idle_timeout_seconds),
            Duration::from_secs(config.session.cleanup_interval_seconds),
        ));

        let voice = Arc::new(VoiceVendorClient::new(VoiceVendorConfig {
            api_key: config.voice.api_key.clone(),
            secret_key: config.voice.secret_key.clone(),
            endpoint: config.voice.endpoint.clone(),
            timeout: Duration::from_secs(config.voice.timeout_seconds),
        })?);

        Ok(Self {
            config: Arc::new(config),
            store,
            translator,
            extraction,
            dispatcher,
            sessions,
            voice,
        })
    }

    /// Build the lifecycle for a newly accepted session
    pub fn new_lifecycle(&self, language: Language) -> SessionLifecycle {
        SessionLifecycle::new(
            language,
            self.store.clone(),
            self.translator.clone(),
            self.extraction.clone(),
            self.dispatcher.clone(),
        )
    }
}

/// Chat backend for transcript translation, when an OpenAI key is configured
fn translation_backend(config: &Settings) -> Option<Arc<dyn ChatBackend>> {
    let api_key = config.openai.api_key.as_deref().filter(|k| !k.is_empty())?;
    let client_config = sauti_llm::OpenAiConfig {
        endpoint: config.openai.endpoint.clone(),
        api_key: api_key.to_string(),
        model: config.openai.model.clone(),
        max_tokens: config.openai.max_tokens,
        temperature: config.openai.temperature,
        timeout: Duration::from_secs(config.openai.timeout_seconds),
    };
    match OpenAiClient::new(client_config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!("Translation backend unavailable: {}", e);
            None
        },
    }
}

/// Chat backend for field extraction, when an Anthropic key is configured
fn extraction_backend(config: &Settings) -> Option<Arc<dyn ChatBackend>> {
    let api_key = config
        .anthropic
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())?;
    let client_config = ClaudeConfig {
        api_key: api_key.to_string(),
        model: config.anthropic.model.clone(),
        max_tokens: config.anthropic.max_tokens,
        timeout: Duration::from_secs(config.anthropic.timeout_seconds),
        endpoint: config.anthropic.endpoint.clone(),
    };
    match ClaudeClient::new(client_config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!("Extraction backend unavailable: {}", e);
            None
        },
    }
}
