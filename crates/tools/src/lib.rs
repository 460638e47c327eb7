//! Live tool-call handling for grievance sessions
//!
//! The voice agent calls one `save_*` tool per captured field. This crate
//! owns the tool table, tagged parameter validation, and the dispatcher
//! that turns accepted calls into single-field store writes exactly once
//! per `tool_call_id`.

pub mod bridge;
pub mod error;
pub mod registry;

pub use bridge::{ToolAck, ToolCallEvent, ToolDispatcher};
pub use error::ToolError;
pub use registry::ToolName;
