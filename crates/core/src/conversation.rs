//! Conversation turns, transcript assembly and conversation ids

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Role of a speaker in a voice session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The worker reporting the grievance
    User,
    /// The voice agent
    Agent,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Agent => "agent",
        }
    }

    /// Capitalized label used when rendering transcripts
    pub fn label(&self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Agent => "Agent",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One utterance in a voice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke
    pub role: TurnRole,
    /// What was said
    pub content: String,
    /// When it was said
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a worker utterance
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Create an agent turn
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Agent, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}

/// Render buffered turns as one transcript string.
///
/// Each turn becomes `"<Label>: <content>"` and turns are separated by a
/// blank line. Turns are rendered in the order given and nothing is
/// filtered out, including empty content.
pub fn assemble_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

const CONVERSATION_ID_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const CONVERSATION_ID_SUFFIX_LEN: usize = 9;

/// Generate a conversation id of the form `conv_<millis>_<random>`.
///
/// The random part is 9 lowercase base36 characters, which keeps the ids
/// compatible with records created by earlier intake clients.
pub fn new_conversation_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CONVERSATION_ID_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CONVERSATION_ID_CHARSET.len());
            CONVERSATION_ID_CHARSET[idx] as char
        })
        .collect();
    format!("conv_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let turn = Turn::user("They have not paid us for two months");
        assert_eq!(turn.role, TurnRole::User);
        assert!(turn.is_user());

        let turn = Turn::agent("I'm sorry to hear that. Can you tell me more?");
        assert_eq!(turn.role, TurnRole::Agent);
        assert!(!turn.is_user());
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(TurnRole::User.label(), "User");
        assert_eq!(TurnRole::Agent.label(), "Agent");
        assert_eq!(TurnRole::User.as_str(), "user");
        assert_eq!(TurnRole::Agent.to_string(), "agent");
    }

    #[test]
    fn test_assemble_transcript() {
        let turns = vec![
            Turn::agent("Hello, how can I help you today?"),
            Turn::user("My supervisor makes us work unpaid overtime"),
        ];
        let transcript = assemble_transcript(&turns);
        assert_eq!(
            transcript,
            "Agent: Hello, how can I help you today?\n\n\
             User: My supervisor makes us work unpaid overtime"
        );
    }

    #[test]
    fn test_assemble_transcript_keeps_empty_turns() {
        let turns = vec![Turn::user(""), Turn::agent("Are you still there?")];
        let transcript = assemble_transcript(&turns);
        assert_eq!(transcript, "User: \n\nAgent: Are you still there?");
    }

    #[test]
    fn test_assemble_transcript_empty() {
        assert_eq!(assemble_transcript(&[]), "");
    }

    #[test]
    fn test_conversation_id_format() {
        let id = new_conversation_id();
        let mut parts = id.splitn(3, '_');
        assert_eq!(parts.next(), Some("conv"));

        let millis = parts.next().unwrap();
        assert!(millis.parse::<i64>().is_ok());

        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_conversation_ids_are_unique() {
        let a = new_conversation_id();
        let b = new_conversation_id();
        assert_ne!(a, b);
    }
}
