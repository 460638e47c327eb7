//! WebSocket Handler
//!
//! Live session event stream. The browser holds the audio call with the
//! voice vendor and relays conversation events here; the handler drives
//! the session lifecycle and answers tool calls.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use sauti_core::{Language, SessionPhase};
use sauti_tools::{ToolAck, ToolCallEvent};

use crate::metrics::{
    record_grievance_created, record_session_closed, record_session_opened, record_tool_call,
};
use crate::session::LiveSession;
use crate::state::AppState;

/// Events relayed by the client over the session stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsInbound {
    /// Voice call established
    Connected,
    /// Finalized user speech turn
    UserMessage { content: String },
    /// Agent speech turn
    AssistantMessage { content: String },
    /// Tool call issued by the voice agent
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        #[serde(default)]
        parameters: serde_json::Value,
    },
    /// Voice call ended
    Disconnected,
}

/// Messages the server sends back over the session stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutbound {
    /// Sent once on accept
    SessionReady {
        session_id: String,
        conversation_id: String,
    },
    /// Stub record created for this conversation
    RecordCreated { grievance_id: Uuid },
    /// Tool call handled
    ToolResponse {
        tool_call_id: String,
        content: String,
    },
    /// Tool call rejected
    ToolError {
        tool_call_id: String,
        error: String,
        content: String,
    },
    /// Session finalized, record complete
    Finalized { grievance_id: Uuid },
    /// Error
    Error { message: String },
}

/// Query parameters for the session endpoint
#[derive(Debug, Deserialize)]
pub struct SessionParams {
    language: Option<String>,
}

/// Voice session WebSocket handler
pub struct WebSocketHandler;

impl WebSocketHandler {
    /// Accept the upgrade and register a session for the connection
    pub async fn handle(
        ws: WebSocketUpgrade,
        Query(params): Query<SessionParams>,
        State(state): State<AppState>,
    ) -> Result<Response, axum::http::StatusCode> {
        // Unknown or missing language codes fall back to English
        let language = params
            .language
            .as_deref()
            .and_then(Language::parse)
            .unwrap_or(Language::En);

        let session = state
            .sessions
            .create(state.new_lifecycle(language))
            .map_err(|e| {
                tracing::warn!("Rejected session: {}", e);
                axum::http::StatusCode::from(e)
            })?;

        Ok(ws.on_upgrade(move |socket| Self::handle_socket(socket, session, state)))
    }

    /// Handle WebSocket connection
    async fn handle_socket(socket: WebSocket, session: Arc<LiveSession>, state: AppState) {
        let (mut sender, mut receiver) = socket.split();
        record_session_opened();

        let ready = {
            let lifecycle = session.lifecycle.lock().await;
            WsOutbound::SessionReady {
                session_id: session.id.clone(),
                conversation_id: lifecycle.conversation_id().to_string(),
            }
        };
        send_outbound(&mut sender, &ready).await;

        // Main message loop
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    session.touch();

                    if let Ok(inbound) = serde_json::from_str::<WsInbound>(&text) {
                        match inbound {
                            WsInbound::Connected => {
                                let mut lifecycle = session.lifecycle.lock().await;
                                match lifecycle.on_connected().await {
                                    Ok(Some(grievance_id)) => {
                                        drop(lifecycle);
                                        record_grievance_created();
                                        let msg = WsOutbound::RecordCreated { grievance_id };
                                        send_outbound(&mut sender, &msg).await;
                                    },
                                    Ok(None) => {},
                                    Err(e) => {
                                        drop(lifecycle);
                                        tracing::warn!(
                                            session_id = %session.id,
                                            "Connect failed: {}",
                                            e
                                        );
                                        let msg = WsOutbound::Error {
                                            message: e.to_string(),
                                        };
                                        send_outbound(&mut sender, &msg).await;
                                    },
                                }
                            },
                            WsInbound::UserMessage { content } => {
                                session.lifecycle.lock().await.on_user_message(content);
                            },
                            WsInbound::AssistantMessage { content } => {
                                session.lifecycle.lock().await.on_assistant_message(content);
                            },
                            WsInbound::ToolCall {
                                tool_call_id,
                                tool_name,
                                parameters,
                            } => {
                                let event = ToolCallEvent {
                                    tool_call_id,
                                    tool_name,
                                    parameters,
                                };
                                let ack = {
                                    let lifecycle = session.lifecycle.lock().await;
                                    lifecycle.on_tool_call(&event).await
                                };
                                match ack {
                                    Some(ToolAck::Response {
                                        tool_call_id,
                                        content,
                                    }) => {
                                        record_tool_call("ok");
                                        let msg = WsOutbound::ToolResponse {
                                            tool_call_id,
                                            content,
                                        };
                                        send_outbound(&mut sender, &msg).await;
                                    },
                                    Some(ToolAck::Error {
                                        tool_call_id,
                                        error,
                                        content,
                                    }) => {
                                        record_tool_call("error");
                                        let msg = WsOutbound::ToolError {
                                            tool_call_id,
                                            error,
                                            content,
                                        };
                                        send_outbound(&mut sender, &msg).await;
                                    },
                                    // Re-delivered or out-of-phase calls get nothing
                                    Some(ToolAck::Duplicate) | None => {},
                                }
                            },
                            WsInbound::Disconnected => {
                                let mut lifecycle = session.lifecycle.lock().await;
                                match lifecycle.on_disconnected().await {
                                    Ok(Some(grievance_id)) => {
                                        drop(lifecycle);
                                        let msg = WsOutbound::Finalized { grievance_id };
                                        send_outbound(&mut sender, &msg).await;
                                    },
                                    Ok(None) => {},
                                    Err(e) => {
                                        tracing::warn!(
                                            session_id = %session.id,
                                            "Finalize failed: {}",
                                            e
                                        );
                                    },
                                }
                                break;
                            },
                        }
                    }
                },
                Ok(Message::Ping(data)) => {
                    let _ = sender.send(Message::Pong(data)).await;
                },
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::error!("WebSocket receive failed: {}", e);
                    break;
                },
                _ => {},
            }
        }

        // Socket gone. A session still connected never saw a disconnect
        // event; finalize it now without sending anything.
        {
            let mut lifecycle = session.lifecycle.lock().await;
            if lifecycle.phase() == SessionPhase::Connected {
                match lifecycle.on_disconnected().await {
                    Ok(Some(grievance_id)) => {
                        tracing::info!(
                            session_id = %session.id,
                            grievance_id = %grievance_id,
                            "Finalized session after socket drop"
                        );
                    },
                    Ok(None) => {},
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session.id,
                            "Finalize after socket drop failed: {}",
                            e
                        );
                    },
                }
            }
        }

        state.sessions.remove(&session.id);
        record_session_closed();
        tracing::info!("WebSocket closed for session: {}", session.id);
    }
}

async fn send_outbound(sender: &mut SplitSink<WebSocket, Message>, msg: &WsOutbound) {
    let json = serde_json::to_string(msg).unwrap();
    let _ = sender.send(Message::Text(json)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_event_parsing() {
        let connected: WsInbound = serde_json::from_str(r#"{"type":"connected"}"#).unwrap();
        assert!(matches!(connected, WsInbound::Connected));

        let user: WsInbound =
            serde_json::from_str(r#"{"type":"user_message","content":"My pay is short"}"#).unwrap();
        match user {
            WsInbound::UserMessage { content } => assert_eq!(content, "My pay is short"),
            other => panic!("unexpected event: {:?}", other),
        }

        let tool: WsInbound = serde_json::from_str(
            r#"{"type":"tool_call","tool_call_id":"call_1","tool_name":"save_submitter_name","parameters":{"name":"Maria"}}"#,
        )
        .unwrap();
        match tool {
            WsInbound::ToolCall {
                tool_call_id,
                tool_name,
                parameters,
            } => {
                assert_eq!(tool_call_id, "call_1");
                assert_eq!(tool_name, "save_submitter_name");
                assert_eq!(parameters["name"], "Maria");
            },
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_tool_call_parameters_default_to_null() {
        let tool: WsInbound = serde_json::from_str(
            r#"{"type":"tool_call","tool_call_id":"call_2","tool_name":"save_category"}"#,
        )
        .unwrap();
        match tool {
            WsInbound::ToolCall { parameters, .. } => assert!(parameters.is_null()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_outbound_tag_strings() {
        let ready = WsOutbound::SessionReady {
            session_id: "s1".to_string(),
            conversation_id: "conv_1_abc".to_string(),
        };
        let json = serde_json::to_string(&ready).unwrap();
        assert!(json.contains(r#""type":"session_ready""#));
        assert!(json.contains(r#""session_id":"s1""#));

        let id = Uuid::new_v4();
        let finalized = serde_json::to_string(&WsOutbound::Finalized { grievance_id: id }).unwrap();
        assert!(finalized.contains(r#""type":"finalized""#));
        assert!(finalized.contains(&id.to_string()));

        let err = serde_json::to_string(&WsOutbound::Error {
            message: "bad".to_string(),
        })
        .unwrap();
        assert!(err.contains(r#""type":"error""#));
    }

    #[test]
    fn test_unknown_inbound_type_is_rejected() {
        assert!(serde_json::from_str::<WsInbound>(r#"{"type":"audio","data":"AAAA"}"#).is_err());
    }
}
