//! Grievance record model and field vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Language a session is conducted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    En,
    /// Afrikaans
    Af,
    /// Portuguese
    Pt,
    /// Swahili
    Sw,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Af => "af",
            Language::Pt => "pt",
            Language::Sw => "sw",
        }
    }

    pub fn parse(s: &str) -> Option<Language> {
        match s.trim().to_lowercase().as_str() {
            "en" => Some(Language::En),
            "af" => Some(Language::Af),
            "pt" => Some(Language::Pt),
            "sw" => Some(Language::Sw),
            _ => None,
        }
    }

    /// English display name, used when prompting the translation model
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Af => "Afrikaans",
            Language::Pt => "Portuguese",
            Language::Sw => "Swahili",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Grievance category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Wages,
    Hours,
    Safety,
    Discrimination,
    Harassment,
    Contracts,
    Discipline,
    Union,
    Conditions,
    Training,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Wages,
        Category::Hours,
        Category::Safety,
        Category::Discrimination,
        Category::Harassment,
        Category::Contracts,
        Category::Discipline,
        Category::Union,
        Category::Conditions,
        Category::Training,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Wages => "wages",
            Category::Hours => "hours",
            Category::Safety => "safety",
            Category::Discrimination => "discrimination",
            Category::Harassment => "harassment",
            Category::Contracts => "contracts",
            Category::Discipline => "discipline",
            Category::Union => "union",
            Category::Conditions => "conditions",
            Category::Training => "training",
            Category::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim().to_lowercase())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency of a reported issue.
///
/// `Critical` is a first-class value: the heuristic extractor assigns it for
/// emergency keywords even though the AI extraction prompt only requests
/// low/medium/high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Urgency> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            "critical" => Some(Urgency::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow status of a record. Set to `New` at creation and advanced by
/// dashboard users, never by this backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    New,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(Status::New),
            "in_progress" => Some(Status::InProgress),
            "resolved" => Some(Status::Resolved),
            "closed" => Some(Status::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// AI-extraction lifecycle of a record.
///
/// Guarded transitions: unprocessed -> processing -> processed | failed.
/// The legacy indicator (non-null submitter name) still short-circuits skip
/// decisions so records written before this field existed behave unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    #[default]
    Unprocessed,
    Processing,
    Processed,
    Failed,
}

impl ProcessingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Unprocessed => "unprocessed",
            ProcessingState::Processing => "processing",
            ProcessingState::Processed => "processed",
            ProcessingState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<ProcessingState> {
        match s.trim().to_lowercase().as_str() {
            "unprocessed" => Some(ProcessingState::Unprocessed),
            "processing" => Some(ProcessingState::Processing),
            "processed" => Some(ProcessingState::Processed),
            "failed" => Some(ProcessingState::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The persisted grievance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrievanceRecord {
    /// Store-assigned identifier, immutable
    pub id: Uuid,
    /// Session correlation key, immutable
    pub conversation_id: String,
    /// Session language, immutable
    pub language: Language,
    /// Role-tagged transcript in the original language, set once at session end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// English rendering of the transcript. Absent for English sessions,
    /// where `transcript` serves directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_english: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_involved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    /// Always present; starts as a placeholder and is overwritten later
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub processing_state: ProcessingState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GrievanceRecord {
    /// A record counts as finalized by AI extraction once a submitter name
    /// exists or the explicit state says so.
    pub fn is_ai_processed(&self) -> bool {
        self.submitter_name.is_some() || self.processing_state == ProcessingState::Processed
    }
}

/// Fields required to create a record stub at session connect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrievance {
    pub conversation_id: String,
    pub language: Language,
    pub description: String,
    pub status: Status,
}

impl NewGrievance {
    /// The stub written the moment a session reaches the connected state
    pub fn stub(conversation_id: impl Into<String>, language: Language) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            language,
            description: "Conversation in progress...".to_string(),
            status: Status::New,
        }
    }
}

/// Partial update applied to an existing record.
///
/// `None` fields are left untouched; there is no way to null a field through
/// a patch. Every applied patch stamps `updated_at`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GrievancePatch {
    pub transcript: Option<String>,
    pub transcript_english: Option<String>,
    pub submitter_name: Option<String>,
    pub submitter_contact: Option<String>,
    pub incident_date: Option<String>,
    pub incident_location: Option<String>,
    pub people_involved: Option<String>,
    pub category: Option<Category>,
    pub urgency: Option<Urgency>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub processing_state: Option<ProcessingState>,
}

impl GrievancePatch {
    pub fn is_empty(&self) -> bool {
        self.transcript.is_none()
            && self.transcript_english.is_none()
            && self.submitter_name.is_none()
            && self.submitter_contact.is_none()
            && self.incident_date.is_none()
            && self.incident_location.is_none()
            && self.people_involved.is_none()
            && self.category.is_none()
            && self.urgency.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.processing_state.is_none()
    }

    /// Single-field patch marking an extraction state transition
    pub fn processing_state(state: ProcessingState) -> Self {
        Self {
            processing_state: Some(state),
            ..Default::default()
        }
    }

    /// Single-field patch for one of the eight tool-savable fields.
    ///
    /// Enum-typed fields reject values outside their enumeration.
    pub fn from_field(field: SaveField, value: &str) -> Result<Self, InvalidFieldValue> {
        let mut patch = GrievancePatch::default();
        match field {
            SaveField::SubmitterName => patch.submitter_name = Some(value.to_string()),
            SaveField::SubmitterContact => patch.submitter_contact = Some(value.to_string()),
            SaveField::IncidentDate => patch.incident_date = Some(value.to_string()),
            SaveField::IncidentLocation => patch.incident_location = Some(value.to_string()),
            SaveField::PeopleInvolved => patch.people_involved = Some(value.to_string()),
            SaveField::Category => {
                patch.category = Some(Category::parse(value).ok_or_else(|| InvalidFieldValue {
                    field,
                    value: value.to_string(),
                })?)
            }
            SaveField::Urgency => {
                patch.urgency = Some(Urgency::parse(value).ok_or_else(|| InvalidFieldValue {
                    field,
                    value: value.to_string(),
                })?)
            }
            SaveField::Description => patch.description = Some(value.to_string()),
        }
        Ok(patch)
    }
}

/// The eight record fields that may be saved individually, by a mid-session
/// tool call or through the save-field endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveField {
    SubmitterName,
    SubmitterContact,
    IncidentDate,
    IncidentLocation,
    PeopleInvolved,
    Category,
    Urgency,
    Description,
}

impl SaveField {
    pub const ALL: [SaveField; 8] = [
        SaveField::SubmitterName,
        SaveField::SubmitterContact,
        SaveField::IncidentDate,
        SaveField::IncidentLocation,
        SaveField::PeopleInvolved,
        SaveField::Category,
        SaveField::Urgency,
        SaveField::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaveField::SubmitterName => "submitter_name",
            SaveField::SubmitterContact => "submitter_contact",
            SaveField::IncidentDate => "incident_date",
            SaveField::IncidentLocation => "incident_location",
            SaveField::PeopleInvolved => "people_involved",
            SaveField::Category => "category",
            SaveField::Urgency => "urgency",
            SaveField::Description => "description",
        }
    }

    pub fn parse(s: &str) -> Option<SaveField> {
        SaveField::ALL.iter().copied().find(|f| f.as_str() == s)
    }
}

impl std::fmt::Display for SaveField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field value that does not fit the field's enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for field {field}")]
pub struct InvalidFieldValue {
    pub field: SaveField,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_round_trip() {
        for lang in [Language::En, Language::Af, Language::Pt, Language::Sw] {
            assert_eq!(Language::parse(lang.as_str()), Some(lang));
        }
        assert_eq!(Language::parse("xx"), None);
        assert_eq!(Language::Pt.display_name(), "Portuguese");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("wages"), Some(Category::Wages));
        assert_eq!(Category::parse(" Harassment "), Some(Category::Harassment));
        assert_eq!(Category::parse("payroll"), None);
        assert_eq!(Category::ALL.len(), 11);
    }

    #[test]
    fn test_urgency_accepts_critical() {
        assert_eq!(Urgency::parse("critical"), Some(Urgency::Critical));
        assert_eq!(Urgency::default(), Urgency::Medium);
    }

    #[test]
    fn test_status_serde_names() {
        let status = Status::InProgress;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_save_field_names() {
        assert_eq!(SaveField::parse("submitter_name"), Some(SaveField::SubmitterName));
        assert_eq!(SaveField::parse("ssn"), None);
        let names: Vec<&str> = SaveField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "submitter_name",
                "submitter_contact",
                "incident_date",
                "incident_location",
                "people_involved",
                "category",
                "urgency",
                "description"
            ]
        );
    }

    #[test]
    fn test_patch_from_field() {
        let patch = GrievancePatch::from_field(SaveField::SubmitterName, "Maria").unwrap();
        assert_eq!(patch.submitter_name.as_deref(), Some("Maria"));
        assert!(patch.category.is_none());

        let patch = GrievancePatch::from_field(SaveField::Urgency, "high").unwrap();
        assert_eq!(patch.urgency, Some(Urgency::High));

        let err = GrievancePatch::from_field(SaveField::Category, "payroll").unwrap_err();
        assert_eq!(err.field, SaveField::Category);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(GrievancePatch::default().is_empty());
        assert!(!GrievancePatch::processing_state(ProcessingState::Processing).is_empty());
    }

    #[test]
    fn test_stub_defaults() {
        let stub = NewGrievance::stub("conv_1_abc", Language::Sw);
        assert_eq!(stub.description, "Conversation in progress...");
        assert_eq!(stub.status, Status::New);
    }
}
