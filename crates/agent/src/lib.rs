//! Session orchestration and field extraction for the grievance backend
//!
//! A [`SessionLifecycle`] drives one voice session from connect to a
//! finalized record. Heuristics fill coarse fields the moment the call ends;
//! the [`ExtractionService`] upgrades them with one idempotent LLM pass.

pub mod error;
pub mod extraction;
pub mod heuristics;
pub mod lifecycle;

pub use error::AgentError;
pub use extraction::{BatchSummary, ExtractedFields, ExtractionOutcome, ExtractionService};
pub use heuristics::HeuristicFields;
pub use lifecycle::SessionLifecycle;
