//! Dedup-guarded dispatch of live tool calls into record writes

use std::sync::Arc;

use dashmap::DashSet;
use sauti_core::{GrievancePatch, SaveField};
use sauti_persistence::GrievanceStore;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ToolError;
use crate::registry::ToolName;

/// A `tool_call` event as relayed over the session stream
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallEvent {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Value,
}

/// What the session stream should send back for a dispatched call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAck {
    /// Re-delivered call; send nothing
    Duplicate,
    Response {
        tool_call_id: String,
        content: String,
    },
    Error {
        tool_call_id: String,
        error: String,
        content: String,
    },
}

/// Process-wide dispatcher for `save_*` tool calls.
///
/// Each `tool_call_id` is handled at most once; the seen-set lives in
/// process memory only and resets on restart.
pub struct ToolDispatcher {
    store: Arc<dyn GrievanceStore>,
    seen: DashSet<String>,
}

impl ToolDispatcher {
    pub fn new(store: Arc<dyn GrievanceStore>) -> Self {
        Self {
            store,
            seen: DashSet::new(),
        }
    }

    /// Dispatch one tool call against the session's grievance record
    pub async fn dispatch(&self, grievance_id: Uuid, event: &ToolCallEvent) -> ToolAck {
        if !self.seen.insert(event.tool_call_id.clone()) {
            tracing::debug!(
                tool_call_id = %event.tool_call_id,
                tool = %event.tool_name,
                "Duplicate tool call dropped"
            );
            return ToolAck::Duplicate;
        }

        match self.handle(grievance_id, event).await {
            Ok(field) => {
                tracing::info!(
                    grievance_id = %grievance_id,
                    tool = %event.tool_name,
                    field = field.as_str(),
                    "Tool call saved field"
                );
                ToolAck::Response {
                    tool_call_id: event.tool_call_id.clone(),
                    content: format!("Saved {} successfully", field.as_str()),
                }
            }
            Err(err) => {
                tracing::warn!(
                    grievance_id = %grievance_id,
                    tool = %event.tool_name,
                    error = %err,
                    "Tool call failed"
                );
                ToolAck::Error {
                    tool_call_id: event.tool_call_id.clone(),
                    error: err.to_string(),
                    content: "Continue the conversation.".to_string(),
                }
            }
        }
    }

    async fn handle(&self, grievance_id: Uuid, event: &ToolCallEvent) -> Result<SaveField, ToolError> {
        let tool = ToolName::parse(&event.tool_name)
            .ok_or_else(|| ToolError::UnknownTool(event.tool_name.clone()))?;
        let value = tool.extract_value(&event.parameters)?;

        let field = tool.field();
        let patch = GrievancePatch::from_field(field, &value)?;
        self.store.update(grievance_id, patch).await?;

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sauti_core::{Category, Language, NewGrievance, Urgency};
    use sauti_persistence::InMemoryGrievanceStore;
    use serde_json::json;

    async fn dispatcher_with_record() -> (ToolDispatcher, Arc<InMemoryGrievanceStore>, Uuid) {
        let store = Arc::new(InMemoryGrievanceStore::new());
        let record = store
            .create(NewGrievance::stub("conv_1_abc", Language::En))
            .await
            .unwrap();
        let dispatcher = ToolDispatcher::new(store.clone());
        (dispatcher, store, record.id)
    }

    fn event(id: &str, tool: &str, parameters: Value) -> ToolCallEvent {
        ToolCallEvent {
            tool_call_id: id.to_string(),
            tool_name: tool.to_string(),
            parameters,
        }
    }

    #[tokio::test]
    async fn test_dispatch_saves_field_and_acks() {
        let (dispatcher, store, id) = dispatcher_with_record().await;

        let ack = dispatcher
            .dispatch(id, &event("tc-1", "save_submitter_name", json!({"name": "Maria"})))
            .await;

        assert_eq!(
            ack,
            ToolAck::Response {
                tool_call_id: "tc-1".to_string(),
                content: "Saved submitter_name successfully".to_string(),
            }
        );
        let record = store.get(id).await.unwrap();
        assert_eq!(record.submitter_name.as_deref(), Some("Maria"));
    }

    #[tokio::test]
    async fn test_duplicate_call_id_writes_once() {
        let (dispatcher, store, id) = dispatcher_with_record().await;

        let first = dispatcher
            .dispatch(id, &event("tc-dup", "save_incident_location", json!({"location": "Palma"})))
            .await;
        assert!(matches!(first, ToolAck::Response { .. }));

        // redelivery with a different payload must be dropped silently
        let second = dispatcher
            .dispatch(id, &event("tc-dup", "save_incident_location", json!({"location": "Pemba"})))
            .await;
        assert_eq!(second, ToolAck::Duplicate);

        let record = store.get(id).await.unwrap();
        assert_eq!(record.incident_location.as_deref(), Some("Palma"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_tool_error() {
        let (dispatcher, store, id) = dispatcher_with_record().await;

        let ack = dispatcher
            .dispatch(id, &event("tc-2", "save_everything", json!({"value": "x"})))
            .await;

        match ack {
            ToolAck::Error { tool_call_id, error, content } => {
                assert_eq!(tool_call_id, "tc-2");
                assert_eq!(error, "Unknown tool: save_everything");
                assert_eq!(content, "Continue the conversation.");
            }
            other => panic!("expected error ack, got {:?}", other),
        }
        // record untouched
        let record = store.get(id).await.unwrap();
        assert!(record.submitter_name.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_payload_is_rejected() {
        let (dispatcher, store, id) = dispatcher_with_record().await;

        let ack = dispatcher
            .dispatch(id, &event("tc-3", "save_category", json!({"name": "wages"})))
            .await;

        match ack {
            ToolAck::Error { error, .. } => {
                assert!(error.contains("Missing required parameter 'category'"));
            }
            other => panic!("expected error ack, got {:?}", other),
        }
        let record = store.get(id).await.unwrap();
        assert!(record.category.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_enum_value_is_rejected() {
        let (dispatcher, store, id) = dispatcher_with_record().await;

        let ack = dispatcher
            .dispatch(id, &event("tc-4", "save_category", json!({"category": "bogus"})))
            .await;
        assert!(matches!(ack, ToolAck::Error { .. }));

        let ack = dispatcher
            .dispatch(id, &event("tc-5", "save_category", json!({"category": "safety"})))
            .await;
        assert!(matches!(ack, ToolAck::Response { .. }));

        let record = store.get(id).await.unwrap();
        assert_eq!(record.category, Some(Category::Safety));
    }

    #[tokio::test]
    async fn test_urgency_save_parses_typed_value() {
        let (dispatcher, store, id) = dispatcher_with_record().await;

        dispatcher
            .dispatch(id, &event("tc-6", "save_urgency", json!({"urgency": "critical"})))
            .await;

        let record = store.get(id).await.unwrap();
        assert_eq!(record.urgency, Some(Urgency::Critical));
    }
}
