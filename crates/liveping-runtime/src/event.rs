//! Runtime events.

use liveping_models::{LiveState, SessionId};

use crate::dispatcher::DispatchOutcome;

/// Events broadcast by the poll loop.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A poll succeeded and the tracker processed it.
    StateObserved {
        /// State after the observation.
        state: LiveState,
        /// Session seen, when live.
        session_id: Option<SessionId>,
    },
    /// A poll failed; the state was left unchanged.
    PollFailed {
        /// Error message.
        error: String,
    },
    /// A post was attempted.
    Dispatched(DispatchOutcome),
    /// Periodic health summary.
    Summary {
        /// Cycles run so far.
        cycles: u64,
        /// Current state.
        state: LiveState,
        /// Seconds since the loop was created.
        uptime_secs: i64,
    },
    /// The loop stopped.
    Stopped {
        /// Cycles run in total.
        cycles: u64,
    },
}

impl RuntimeEvent {
    /// Returns true if this event reports a failure.
    pub fn is_error(&self) -> bool {
        match self {
            RuntimeEvent::PollFailed { .. } => true,
            RuntimeEvent::Dispatched(outcome) => !outcome.is_success(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{DispatchKind, DispatchStatus};
    use chrono::Utc;

    #[test]
    fn test_event_is_error() {
        let event = RuntimeEvent::PollFailed {
            error: "timeout".to_string(),
        };
        assert!(event.is_error());

        let event = RuntimeEvent::StateObserved {
            state: LiveState::Live,
            session_id: Some(SessionId::from("a")),
        };
        assert!(!event.is_error());

        let failed = DispatchOutcome {
            kind: DispatchKind::Manual,
            session_id: None,
            status: DispatchStatus::Failed("boom".to_string()),
            preview_attached: false,
            at: Utc::now(),
        };
        assert!(RuntimeEvent::Dispatched(failed).is_error());
    }
}
