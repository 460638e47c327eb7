//! Sauti Server
//!
//! Provides the WebSocket session endpoint and HTTP API for the
//! grievance collection backend.

pub mod http;
pub mod metrics;
pub mod prompts;
pub mod session;
pub mod state;
pub mod voice;
pub mod websocket;

pub use http::create_router;
pub use metrics::{
    init_metrics, record_error, record_extraction_latency, record_grievance_created,
    record_request, record_session_closed, record_session_opened, record_tool_call,
    record_translation_latency,
};
pub use session::{LiveSession, SessionManager};
pub use state::AppState;
pub use voice::VoiceVendorClient;

use thiserror::Error;

/// Errors surfaced by HTTP and WebSocket handling
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Voice vendor error: {0}")]
    Vendor(String),

    #[error("Audio recording not found")]
    AudioNotFound,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Session(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Vendor(_) => axum::http::StatusCode::BAD_GATEWAY,
            ServerError::AudioNotFound => axum::http::StatusCode::NOT_FOUND,
            ServerError::Configuration(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
