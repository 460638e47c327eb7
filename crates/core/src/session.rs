//! Session phase machine for voice intake sessions

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Phases of a voice intake session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum SessionPhase {
    /// No call yet
    #[default]
    Idle,
    /// Call in progress, turns are being buffered
    Connected,
    /// Call ended, end-of-session pipeline running
    Finalizing,
    /// Pipeline finished, session is inert
    Done,
}

/// Static transition map. The phase chain is strictly linear; a session is
/// never replayed.
static PHASE_TRANSITIONS: Lazy<HashMap<SessionPhase, &'static [SessionPhase]>> = Lazy::new(|| {
    use SessionPhase::*;
    let mut map = HashMap::new();
    map.insert(Idle, &[Connected] as &[_]);
    map.insert(Connected, &[Finalizing] as &[_]);
    map.insert(Finalizing, &[Done] as &[_]);
    map.insert(Done, &[] as &[_]);
    map
});

impl SessionPhase {
    /// Get allowed transitions from the current phase
    pub fn allowed_transitions(&self) -> &'static [SessionPhase] {
        PHASE_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    /// Check if transition to the target phase is allowed
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Validated transition. Returns the target phase, or an error carrying
    /// both endpoints when the move is not in the transition table.
    pub fn transition_to(self, target: SessionPhase) -> Result<SessionPhase, InvalidTransition> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Connected => "connected",
            SessionPhase::Finalizing => "finalizing",
            SessionPhase::Done => "done",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid session transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_chain() {
        let phase = SessionPhase::default();
        assert_eq!(phase, SessionPhase::Idle);

        let phase = phase.transition_to(SessionPhase::Connected).unwrap();
        let phase = phase.transition_to(SessionPhase::Finalizing).unwrap();
        let phase = phase.transition_to(SessionPhase::Done).unwrap();
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        assert!(SessionPhase::Idle
            .transition_to(SessionPhase::Finalizing)
            .is_err());
        assert!(SessionPhase::Idle.transition_to(SessionPhase::Done).is_err());
        assert!(SessionPhase::Connected
            .transition_to(SessionPhase::Done)
            .is_err());
        assert!(SessionPhase::Done
            .transition_to(SessionPhase::Connected)
            .is_err());
    }

    #[test]
    fn test_reconnect_is_not_a_transition() {
        // Re-delivered connected events are handled as no-ops by the
        // lifecycle, never as a self-transition.
        assert!(!SessionPhase::Connected.can_transition_to(SessionPhase::Connected));
    }

    #[test]
    fn test_error_names_both_endpoints() {
        let err = SessionPhase::Done
            .transition_to(SessionPhase::Connected)
            .unwrap_err();
        assert_eq!(err.from, SessionPhase::Done);
        assert_eq!(err.to, SessionPhase::Connected);
        assert_eq!(
            err.to_string(),
            "invalid session transition: done -> connected"
        );
    }
}
