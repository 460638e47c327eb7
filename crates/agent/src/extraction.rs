//! AI field extraction from finalized transcripts
//!
//! One LLM call per record, guarded for idempotency, with defensive parsing
//! of the structured output. The service never retries; callers re-invoke
//! the endpoint if they want another attempt, and the skip guard decides
//! whether that attempt does anything.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use sauti_core::{Category, GrievancePatch, GrievanceRecord, ProcessingState, Urgency};
use sauti_llm::{ChatBackend, ChatRequest};
use sauti_persistence::{GrievanceFilter, GrievanceStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AgentError;

/// Minimum usable source text length, in characters after trimming
const MIN_TRANSCRIPT_CHARS: usize = 10;

static JSON_REGION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// The structured output requested from the model. Unknown keys are
/// ignored; missing keys deserialize as null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub submitter_name: Option<String>,
    pub submitter_contact: Option<String>,
    pub incident_date: Option<String>,
    pub incident_location: Option<String>,
    pub people_involved: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub urgency: Option<String>,
}

impl ExtractedFields {
    /// Build the single bulk patch: non-null fields only, enum-typed values
    /// dropped with a warning when outside their enumeration.
    fn into_patch(self) -> GrievancePatch {
        let mut patch = GrievancePatch {
            submitter_name: self.submitter_name,
            submitter_contact: self.submitter_contact,
            incident_date: self.incident_date,
            incident_location: self.incident_location,
            people_involved: self.people_involved,
            description: self.description,
            ..Default::default()
        };

        if let Some(raw) = self.category {
            match Category::parse(&raw) {
                Some(category) => patch.category = Some(category),
                None => tracing::warn!(category = %raw, "Dropping unrecognized extracted category"),
            }
        }
        if let Some(raw) = self.urgency {
            match Urgency::parse(&raw) {
                Some(urgency) => patch.urgency = Some(urgency),
                None => tracing::warn!(urgency = %raw, "Dropping unrecognized extracted urgency"),
            }
        }

        patch.processing_state = Some(ProcessingState::Processed);
        patch
    }
}

/// Result of an extraction attempt
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    Extracted(ExtractedFields),
    /// The skip guard fired; the record was not touched
    Skipped,
}

/// Totals from a batch sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// LLM-backed field extraction, idempotent per record
pub struct ExtractionService {
    store: Arc<dyn GrievanceStore>,
    backend: Option<Arc<dyn ChatBackend>>,
}

impl ExtractionService {
    /// `backend: None` models missing credentials; extraction then fails
    /// with a configuration error instead of a doomed network call.
    pub fn new(store: Arc<dyn GrievanceStore>, backend: Option<Arc<dyn ChatBackend>>) -> Self {
        Self { store, backend }
    }

    /// Run extraction for one record
    pub async fn extract(&self, grievance_id: Uuid) -> Result<ExtractionOutcome, AgentError> {
        let record = self.store.get(grievance_id).await?;

        if record.is_ai_processed() || record.processing_state == ProcessingState::Processing {
            tracing::info!(grievance_id = %grievance_id, "Already processed, skipping extraction");
            return Ok(ExtractionOutcome::Skipped);
        }

        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| AgentError::Configuration("ANTHROPIC_API_KEY not set".to_string()))?;

        let source = select_source(&record)
            .ok_or_else(|| AgentError::InvalidInput("No valid transcript to process".to_string()))?;

        tracing::info!(
            grievance_id = %grievance_id,
            chars = source.len(),
            language = record.language.as_str(),
            "Extracting fields from transcript"
        );

        // Hold the record while the call is in flight so a concurrent
        // trigger skips instead of double-extracting.
        self.store
            .update(
                grievance_id,
                GrievancePatch::processing_state(ProcessingState::Processing),
            )
            .await?;

        let request =
            ChatRequest::user(build_prompt(record.language.as_str(), &source)).with_prefill("{");

        let response = match backend.complete(&request).await {
            Ok(text) => text,
            Err(err) => {
                self.mark_failed(grievance_id).await;
                return Err(err.into());
            }
        };

        let fields = match parse_extraction(&response) {
            Ok(fields) => fields,
            Err(err) => {
                self.mark_failed(grievance_id).await;
                return Err(err);
            }
        };

        self.store
            .update(grievance_id, fields.clone().into_patch())
            .await?;

        tracing::info!(grievance_id = %grievance_id, "Extraction complete");
        Ok(ExtractionOutcome::Extracted(fields))
    }

    /// Sweep every record through [`extract`](Self::extract), counting
    /// outcomes. Individual failures are logged and tallied, never fatal.
    pub async fn extract_all(&self) -> Result<BatchSummary, AgentError> {
        let records = self.store.list(&GrievanceFilter::default()).await?;
        let mut summary = BatchSummary::default();

        for record in records {
            match self.extract(record.id).await {
                Ok(ExtractionOutcome::Extracted(_)) => summary.processed += 1,
                Ok(ExtractionOutcome::Skipped) => summary.skipped += 1,
                Err(err) => {
                    tracing::warn!(
                        grievance_id = %record.id,
                        error = %err,
                        "Batch extraction failed for record"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch extraction sweep finished"
        );
        Ok(summary)
    }

    async fn mark_failed(&self, grievance_id: Uuid) {
        let patch = GrievancePatch::processing_state(ProcessingState::Failed);
        if let Err(err) = self.store.update(grievance_id, patch).await {
            tracing::warn!(
                grievance_id = %grievance_id,
                error = %err,
                "Could not record extraction failure"
            );
        }
    }
}

/// Pick the text the model sees. English rendering is preferred unless it
/// carries a degradation tag; too-short text is unusable either way.
fn select_source(record: &GrievanceRecord) -> Option<String> {
    let english = record.transcript_english.as_deref().filter(|text| {
        !text.contains("Translation failed") && !text.contains("Translation unavailable")
    });

    let text = english.or(record.transcript.as_deref())?;
    if text.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
        return None;
    }
    Some(text.to_string())
}

fn build_prompt(language: &str, transcript: &str) -> String {
    format!(
        r#"You are analyzing a labor grievance transcript. Extract the following information and return it as valid JSON.

Return a JSON object with these exact fields:
- submitter_name: The worker's name if provided, otherwise null
- submitter_contact: Email or phone number if provided, otherwise null
- incident_date: When the issue started (e.g., 'Early March 2024', 'August 2024', '6 weeks ago'), otherwise null
- incident_location: Specific location/department (e.g., 'Processing Plant B, Palma district', 'Security sector'), otherwise null
- people_involved: Names of supervisors/managers mentioned (e.g., 'Supervisor Carlos', 'Roberto, Operations Manager'), otherwise null
- category: One of: wages, hours, safety, discrimination, harassment, contracts, discipline, union, conditions, training, other
- description: 2-3 sentence summary in English of the main issue
- urgency: One of: high, medium, low (based on severity and immediacy)

CRITICAL: Return ONLY the JSON object, no explanation, no other text whatsoever. Start your response with {{ and end with }}.

Transcript (Language: {}):
{}"#,
        language, transcript
    )
}

/// Reassemble the prefilled brace, strip code fences, cut down to the
/// brace-delimited region, then parse.
fn parse_extraction(response: &str) -> Result<ExtractedFields, AgentError> {
    let mut text = format!("{{{}", response.trim());

    if text.contains("```json") {
        text = text.replace("```json", "").replace("```", "").trim().to_string();
    } else if text.contains("```") {
        text = text.replace("```", "").trim().to_string();
    }

    if let Some(region) = JSON_REGION.find(&text) {
        text = region.as_str().to_string();
    }

    serde_json::from_str(&text).map_err(|err| AgentError::MalformedExtraction(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sauti_core::{Language, Status};
    use chrono::Utc;

    fn record_with_transcript(transcript: Option<&str>, english: Option<&str>) -> GrievanceRecord {
        let now = Utc::now();
        GrievanceRecord {
            id: Uuid::new_v4(),
            conversation_id: "conv_1_abc".to_string(),
            language: Language::Pt,
            transcript: transcript.map(String::from),
            transcript_english: english.map(String::from),
            submitter_name: None,
            submitter_contact: None,
            incident_date: None,
            incident_location: None,
            people_involved: None,
            category: None,
            urgency: None,
            description: "Conversation in progress...".to_string(),
            status: Status::New,
            processing_state: ProcessingState::Unprocessed,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_source_prefers_clean_english() {
        let record = record_with_transcript(
            Some("User: Não recebi meu salário."),
            Some("User: I was not paid my salary."),
        );
        assert_eq!(
            select_source(&record).as_deref(),
            Some("User: I was not paid my salary.")
        );
    }

    #[test]
    fn test_source_falls_back_on_tagged_english() {
        let record = record_with_transcript(
            Some("User: Não recebi meu salário."),
            Some("[Translation failed - Original pt text]\n\nUser: Não recebi meu salário."),
        );
        assert_eq!(
            select_source(&record).as_deref(),
            Some("User: Não recebi meu salário.")
        );

        let record = record_with_transcript(
            Some("User: Não recebi meu salário."),
            Some("[Translation unavailable - Original pt text]\n\nUser: Não recebi meu salário."),
        );
        assert_eq!(
            select_source(&record).as_deref(),
            Some("User: Não recebi meu salário.")
        );
    }

    #[test]
    fn test_source_rejects_short_text() {
        let record = record_with_transcript(Some("User: ok"), None);
        assert_eq!(select_source(&record), None);

        let record = record_with_transcript(None, None);
        assert_eq!(select_source(&record), None);
    }

    #[test]
    fn test_prompt_carries_language_and_transcript() {
        let prompt = build_prompt("pt", "User: Não recebi meu salário.");
        assert!(prompt.contains("Transcript (Language: pt):"));
        assert!(prompt.contains("User: Não recebi meu salário."));
        assert!(prompt.contains("Return ONLY the JSON object"));
        assert!(prompt.ends_with("User: Não recebi meu salário."));
    }

    #[test]
    fn test_parse_plain_prefilled_response() {
        // The model answer starts after the prefilled '{'
        let response = r#""submitter_name": "Maria", "category": "wages", "urgency": "high"}"#;
        let fields = parse_extraction(response).unwrap();
        assert_eq!(fields.submitter_name.as_deref(), Some("Maria"));
        assert_eq!(fields.category.as_deref(), Some("wages"));
        assert_eq!(fields.urgency.as_deref(), Some("high"));
        assert_eq!(fields.incident_date, None);
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let response = "```json\n\"category\": \"safety\"}\n```";
        let fields = parse_extraction(response).unwrap();
        assert_eq!(fields.category.as_deref(), Some("safety"));
    }

    #[test]
    fn test_parse_cuts_surrounding_text() {
        let response = "\"category\": \"hours\"}\nThat is everything I found.";
        let fields = parse_extraction(response).unwrap();
        assert_eq!(fields.category.as_deref(), Some("hours"));
    }

    #[test]
    fn test_parse_failure_is_malformed() {
        let err = parse_extraction("I could not find any fields.").unwrap_err();
        assert!(matches!(err, AgentError::MalformedExtraction(_)));
    }

    #[test]
    fn test_patch_drops_unknown_enum_values() {
        let fields = ExtractedFields {
            submitter_name: Some("Maria".to_string()),
            category: Some("weather".to_string()),
            urgency: Some("apocalyptic".to_string()),
            description: Some("Summary.".to_string()),
            ..Default::default()
        };
        let patch = fields.into_patch();
        assert_eq!(patch.submitter_name.as_deref(), Some("Maria"));
        assert_eq!(patch.category, None);
        assert_eq!(patch.urgency, None);
        assert_eq!(patch.processing_state, Some(ProcessingState::Processed));
    }

    #[test]
    fn test_patch_keeps_null_fields_unset() {
        let fields = ExtractedFields {
            description: Some("Anonymous complaint about shift rosters.".to_string()),
            category: Some("hours".to_string()),
            ..Default::default()
        };
        let patch = fields.into_patch();
        assert_eq!(patch.submitter_name, None);
        assert_eq!(patch.category, Some(Category::Hours));
        assert_eq!(patch.processing_state, Some(ProcessingState::Processed));
    }
}

#[cfg(test)]
mod service_tests {
    use super::*;
    use async_trait::async_trait;
    use sauti_core::{Language, NewGrievance, Status};
    use sauti_llm::LlmError;
    use sauti_persistence::InMemoryGrievanceStore;
    use std::sync::Mutex;

    struct FixedBackend {
        reply: String,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl FixedBackend {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FixedBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            Err(LlmError::Api("HTTP 529: overloaded".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    async fn seed(store: &Arc<dyn GrievanceStore>, transcript: &str) -> Uuid {
        let record = store
            .create(NewGrievance {
                conversation_id: sauti_core::new_conversation_id(),
                language: Language::En,
                description: "Conversation in progress...".to_string(),
                status: Status::New,
            })
            .await
            .unwrap();
        store
            .update(
                record.id,
                GrievancePatch {
                    transcript: Some(transcript.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        record.id
    }

    fn store() -> Arc<dyn GrievanceStore> {
        Arc::new(InMemoryGrievanceStore::new())
    }

    #[tokio::test]
    async fn test_extract_applies_fields_and_marks_processed() {
        let store = store();
        let id = seed(&store, "User: My name is Maria and I have not been paid since March.").await;
        let backend = Arc::new(FixedBackend::new(
            r#""submitter_name": "Maria", "submitter_contact": null, "incident_date": "March 2024", "incident_location": null, "people_involved": null, "category": "wages", "description": "Worker unpaid since March.", "urgency": "high"}"#,
        ));
        let service = ExtractionService::new(store.clone(), Some(backend.clone()));

        let outcome = service.extract(id).await.unwrap();
        let ExtractionOutcome::Extracted(fields) = outcome else {
            panic!("expected extraction, got skip");
        };
        assert_eq!(fields.submitter_name.as_deref(), Some("Maria"));

        let record = store.get(id).await.unwrap();
        assert_eq!(record.submitter_name.as_deref(), Some("Maria"));
        assert_eq!(record.incident_date.as_deref(), Some("March 2024"));
        assert_eq!(record.category, Some(Category::Wages));
        assert_eq!(record.urgency, Some(Urgency::High));
        assert_eq!(record.description, "Worker unpaid since March.");
        assert_eq!(record.processing_state, ProcessingState::Processed);
        assert!(record.is_ai_processed());

        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.prefill.as_deref(), Some("{"));
        assert!(request.user.contains("Transcript (Language: en):"));
    }

    #[tokio::test]
    async fn test_extract_skips_already_processed_record() {
        let store = store();
        let id = seed(&store, "User: Long enough transcript for processing.").await;
        store
            .update(
                id,
                GrievancePatch {
                    submitter_name: Some("Maria".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Backend would blow up if called
        let service = ExtractionService::new(store.clone(), Some(Arc::new(FailingBackend)));
        let outcome = service.extract(id).await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_extract_skips_in_flight_record() {
        let store = store();
        let id = seed(&store, "User: Long enough transcript for processing.").await;
        store
            .update(id, GrievancePatch::processing_state(ProcessingState::Processing))
            .await
            .unwrap();

        let service = ExtractionService::new(store.clone(), Some(Arc::new(FailingBackend)));
        let outcome = service.extract(id).await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_extract_without_backend_is_configuration_error() {
        let store = store();
        let id = seed(&store, "User: Long enough transcript for processing.").await;
        let service = ExtractionService::new(store.clone(), None);

        let err = service.extract(id).await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY not set"));

        // Guard fires before any state change
        let record = store.get(id).await.unwrap();
        assert_eq!(record.processing_state, ProcessingState::Unprocessed);
    }

    #[tokio::test]
    async fn test_extract_rejects_short_transcript() {
        let store = store();
        let id = seed(&store, "User: ok").await;
        let service = ExtractionService::new(store.clone(), Some(Arc::new(FailingBackend)));

        let err = service.extract(id).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput(_)));
        assert_eq!(err.to_string(), "No valid transcript to process");
    }

    #[tokio::test]
    async fn test_extract_missing_record_is_not_found() {
        let service = ExtractionService::new(store(), Some(Arc::new(FailingBackend)));
        let err = service.extract(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_llm_failure_marks_record_failed() {
        let store = store();
        let id = seed(&store, "User: Long enough transcript for processing.").await;
        let service = ExtractionService::new(store.clone(), Some(Arc::new(FailingBackend)));

        let err = service.extract(id).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));

        let record = store.get(id).await.unwrap();
        assert_eq!(record.processing_state, ProcessingState::Failed);
    }

    #[tokio::test]
    async fn test_unparseable_response_marks_record_failed() {
        let store = store();
        let id = seed(&store, "User: Long enough transcript for processing.").await;
        let backend = Arc::new(FixedBackend::new("I am sorry, I cannot help with that."));
        let service = ExtractionService::new(store.clone(), Some(backend));

        let err = service.extract(id).await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedExtraction(_)));

        let record = store.get(id).await.unwrap();
        assert_eq!(record.processing_state, ProcessingState::Failed);
    }

    #[tokio::test]
    async fn test_anonymous_extraction_is_idempotent() {
        // All-null answer still marks the record processed, so a second
        // sweep skips instead of burning another LLM call.
        let store = store();
        let id = seed(&store, "User: Someone is skimming wages at the plant.").await;
        let backend = Arc::new(FixedBackend::new(
            r#""submitter_name": null, "submitter_contact": null, "incident_date": null, "incident_location": null, "people_involved": null, "category": "wages", "description": "Wage skimming reported.", "urgency": "medium"}"#,
        ));
        let service = ExtractionService::new(store.clone(), Some(backend));

        let first = service.extract(id).await.unwrap();
        assert!(matches!(first, ExtractionOutcome::Extracted(_)));

        let record = store.get(id).await.unwrap();
        assert_eq!(record.submitter_name, None);
        assert_eq!(record.processing_state, ProcessingState::Processed);
        assert!(record.is_ai_processed());

        let second = service.extract(id).await.unwrap();
        assert!(matches!(second, ExtractionOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_extract_all_tallies_outcomes() {
        let store = store();
        let fresh = seed(&store, "User: The night shift has no protective gear.").await;
        let processed = seed(&store, "User: Another transcript that is long enough.").await;
        store
            .update(
                processed,
                GrievancePatch {
                    submitter_name: Some("Jose".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let short = seed(&store, "User: hi").await;

        let backend = Arc::new(FixedBackend::new(
            r#""category": "safety", "description": "No protective gear on night shift.", "urgency": "high"}"#,
        ));
        let service = ExtractionService::new(store.clone(), Some(backend));

        let summary = service.extract_all().await.unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                processed: 1,
                skipped: 1,
                failed: 1,
            }
        );

        assert_eq!(
            store.get(fresh).await.unwrap().processing_state,
            ProcessingState::Processed
        );
        assert_eq!(
            store.get(short).await.unwrap().processing_state,
            ProcessingState::Unprocessed
        );
    }
}
