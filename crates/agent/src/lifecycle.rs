//! Per-session orchestration from connect to finalized record
//!
//! One `SessionLifecycle` owns one voice session: it creates the stub record
//! on connect, buffers turns while the call runs, bridges tool calls to the
//! store, and drives the end-of-session pipeline (transcript assembly,
//! heuristics, translation, AI extraction) on disconnect.

use std::sync::Arc;

use sauti_core::{
    assemble_transcript, new_conversation_id, GrievancePatch, Language, NewGrievance,
    SessionPhase, Turn,
};
use sauti_llm::Translator;
use sauti_persistence::GrievanceStore;
use sauti_tools::{ToolAck, ToolCallEvent, ToolDispatcher};
use uuid::Uuid;

use crate::error::AgentError;
use crate::extraction::{ExtractionOutcome, ExtractionService};
use crate::heuristics;

/// State and collaborators for one voice intake session
pub struct SessionLifecycle {
    conversation_id: String,
    language: Language,
    phase: SessionPhase,
    turns: Vec<Turn>,
    grievance_id: Option<Uuid>,
    store: Arc<dyn GrievanceStore>,
    translator: Arc<Translator>,
    extraction: Arc<ExtractionService>,
    dispatcher: Arc<ToolDispatcher>,
}

impl SessionLifecycle {
    pub fn new(
        language: Language,
        store: Arc<dyn GrievanceStore>,
        translator: Arc<Translator>,
        extraction: Arc<ExtractionService>,
        dispatcher: Arc<ToolDispatcher>,
    ) -> Self {
        Self {
            conversation_id: new_conversation_id(),
            language,
            phase: SessionPhase::Idle,
            turns: Vec::new(),
            grievance_id: None,
            store,
            translator,
            extraction,
            dispatcher,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn grievance_id(&self) -> Option<Uuid> {
        self.grievance_id
    }

    /// The call connected: create the stub record.
    ///
    /// Returns the new record id, or `Ok(None)` when the event is a
    /// re-delivery and the session is already connected.
    pub async fn on_connected(&mut self) -> Result<Option<Uuid>, AgentError> {
        if self.phase == SessionPhase::Connected {
            tracing::debug!(
                conversation_id = %self.conversation_id,
                "Duplicate connected event ignored"
            );
            return Ok(None);
        }

        self.phase = self.phase.transition_to(SessionPhase::Connected)?;

        let record = self
            .store
            .create(NewGrievance::stub(
                self.conversation_id.clone(),
                self.language,
            ))
            .await?;
        self.grievance_id = Some(record.id);

        tracing::info!(
            conversation_id = %self.conversation_id,
            grievance_id = %record.id,
            language = self.language.as_str(),
            "Session connected, stub record created"
        );
        Ok(Some(record.id))
    }

    /// Buffer a worker turn. Dropped outside the connected phase.
    pub fn on_user_message(&mut self, content: impl Into<String>) {
        if self.phase != SessionPhase::Connected {
            tracing::debug!(phase = %self.phase, "User message outside connected phase dropped");
            return;
        }
        self.turns.push(Turn::user(content));
    }

    /// Buffer an agent turn. Dropped outside the connected phase.
    pub fn on_assistant_message(&mut self, content: impl Into<String>) {
        if self.phase != SessionPhase::Connected {
            tracing::debug!(phase = %self.phase, "Agent message outside connected phase dropped");
            return;
        }
        self.turns.push(Turn::agent(content));
    }

    /// Bridge a tool call to the store.
    ///
    /// Returns `None` when the session cannot accept tool calls (wrong phase
    /// or no record yet); the caller then sends nothing back.
    pub async fn on_tool_call(&self, event: &ToolCallEvent) -> Option<ToolAck> {
        if self.phase != SessionPhase::Connected {
            tracing::debug!(
                phase = %self.phase,
                tool = %event.tool_name,
                "Tool call outside connected phase dropped"
            );
            return None;
        }
        let grievance_id = self.grievance_id?;
        Some(self.dispatcher.dispatch(grievance_id, event).await)
    }

    /// The call ended: run the end-of-session pipeline.
    ///
    /// Assembles the transcript, fills heuristic fields, translates
    /// non-English transcripts, persists the lot, then triggers AI
    /// extraction. Translation and extraction problems are logged, never
    /// fatal; the session always reaches the done phase. A second disconnect
    /// is rejected as an invalid transition.
    pub async fn on_disconnected(&mut self) -> Result<Option<Uuid>, AgentError> {
        self.phase = self.phase.transition_to(SessionPhase::Finalizing)?;

        if self.turns.is_empty() {
            tracing::info!(
                conversation_id = %self.conversation_id,
                "Session ended without any turns, nothing to finalize"
            );
            self.phase = self.phase.transition_to(SessionPhase::Done)?;
            return Ok(self.grievance_id);
        }

        let Some(grievance_id) = self.grievance_id else {
            tracing::warn!(
                conversation_id = %self.conversation_id,
                turns = self.turns.len(),
                "No record for this session, dropping buffered turns"
            );
            self.phase = self.phase.transition_to(SessionPhase::Done)?;
            return Ok(None);
        };

        let transcript = assemble_transcript(&self.turns);
        let fields = heuristics::extract(&self.turns, &transcript);

        tracing::info!(
            conversation_id = %self.conversation_id,
            grievance_id = %grievance_id,
            turns = self.turns.len(),
            chars = transcript.len(),
            "Finalizing session"
        );

        let mut patch = GrievancePatch {
            transcript: Some(transcript.clone()),
            category: fields.category,
            urgency: Some(fields.urgency),
            description: Some(fields.description),
            ..Default::default()
        };

        if self.language != Language::En {
            patch.transcript_english = Some(
                self.translator
                    .translate(&transcript, self.language.as_str())
                    .await,
            );
        }

        if let Err(err) = self.store.update(grievance_id, patch).await {
            tracing::warn!(
                grievance_id = %grievance_id,
                error = %err,
                "Could not persist finalized transcript"
            );
        }

        match self.extraction.extract(grievance_id).await {
            Ok(ExtractionOutcome::Extracted(_)) => {
                tracing::info!(grievance_id = %grievance_id, "Post-session extraction complete")
            }
            Ok(ExtractionOutcome::Skipped) => {
                tracing::info!(grievance_id = %grievance_id, "Post-session extraction skipped")
            }
            Err(err) => tracing::warn!(
                grievance_id = %grievance_id,
                error = %err,
                "Post-session extraction failed"
            ),
        }

        self.phase = self.phase.transition_to(SessionPhase::Done)?;
        Ok(Some(grievance_id))
    }
}
