//! Core types for the grievance voice backend
//!
//! This crate provides the foundational types used across all other crates:
//! - Grievance record model, field patches and the save-field whitelist
//! - Conversation turns and transcript assembly
//! - Session phase machine

pub mod conversation;
pub mod grievance;
pub mod session;

pub use conversation::{assemble_transcript, new_conversation_id, Turn, TurnRole};
pub use grievance::{
    Category, GrievancePatch, GrievanceRecord, InvalidFieldValue, Language, NewGrievance,
    ProcessingState, SaveField, Status, Urgency,
};
pub use session::{InvalidTransition, SessionPhase};
