//! Save-field tool table
//!
//! The voice agent exposes a fixed set of `save_*` tools, one per record
//! field. Each tool declares exactly one parameter key; payloads are
//! validated against that declaration rather than probed for whatever key
//! happens to be present.

use sauti_core::SaveField;
use serde_json::Value;

use crate::error::ToolError;

/// The tools the voice agent may call during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SaveSubmitterName,
    SaveContactInfo,
    SaveIncidentDate,
    SaveIncidentLocation,
    SavePeopleInvolved,
    SaveCategory,
    SaveUrgency,
    SaveDescription,
}

impl ToolName {
    pub const ALL: [ToolName; 8] = [
        ToolName::SaveSubmitterName,
        ToolName::SaveContactInfo,
        ToolName::SaveIncidentDate,
        ToolName::SaveIncidentLocation,
        ToolName::SavePeopleInvolved,
        ToolName::SaveCategory,
        ToolName::SaveUrgency,
        ToolName::SaveDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SaveSubmitterName => "save_submitter_name",
            ToolName::SaveContactInfo => "save_contact_info",
            ToolName::SaveIncidentDate => "save_incident_date",
            ToolName::SaveIncidentLocation => "save_incident_location",
            ToolName::SavePeopleInvolved => "save_people_involved",
            ToolName::SaveCategory => "save_category",
            ToolName::SaveUrgency => "save_urgency",
            ToolName::SaveDescription => "save_description",
        }
    }

    pub fn parse(s: &str) -> Option<ToolName> {
        ToolName::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// The record field this tool writes
    pub fn field(&self) -> SaveField {
        match self {
            ToolName::SaveSubmitterName => SaveField::SubmitterName,
            ToolName::SaveContactInfo => SaveField::SubmitterContact,
            ToolName::SaveIncidentDate => SaveField::IncidentDate,
            ToolName::SaveIncidentLocation => SaveField::IncidentLocation,
            ToolName::SavePeopleInvolved => SaveField::PeopleInvolved,
            ToolName::SaveCategory => SaveField::Category,
            ToolName::SaveUrgency => SaveField::Urgency,
            ToolName::SaveDescription => SaveField::Description,
        }
    }

    /// The single parameter key this tool declares
    pub fn parameter_key(&self) -> &'static str {
        match self {
            ToolName::SaveSubmitterName => "name",
            ToolName::SaveContactInfo => "contact",
            ToolName::SaveIncidentDate => "date",
            ToolName::SaveIncidentLocation => "location",
            ToolName::SavePeopleInvolved => "people",
            ToolName::SaveCategory => "category",
            ToolName::SaveUrgency => "urgency",
            ToolName::SaveDescription => "description",
        }
    }

    /// Pull the declared parameter out of a payload. Absent, empty or
    /// non-string values are rejected; mismatched payloads are never
    /// guessed at.
    pub fn extract_value(&self, parameters: &Value) -> Result<String, ToolError> {
        let key = self.parameter_key();
        match parameters.get(key).and_then(|v| v.as_str()) {
            Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
            _ => Err(ToolError::MissingValue {
                tool: self.as_str(),
                key,
            }),
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
