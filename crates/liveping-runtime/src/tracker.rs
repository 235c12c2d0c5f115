//! Live-state tracking and automatic-post decisions.
//!
//! The tracker is the only owner of the current `LiveState` and the
//! `PostRecord`. A session counts as new purely by its ID: a retitled or
//! recategorised broadcast keeps its ID and is not posted again.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use liveping_models::{LiveState, LiveStatus, PostRecord, SessionId, StreamSession};

/// What the runtime should do after an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to publish.
    NoAction,
    /// Publish an automatic notification for this session.
    PostAutomatic(StreamSession),
}

/// Point-in-time copy of the tracked state, used for manual posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub state: LiveState,
    pub session: Option<StreamSession>,
}

/// Tracks live state and suppresses duplicate automatic posts.
#[derive(Debug, Default)]
pub struct SessionTracker {
    state: LiveState,
    record: PostRecord,
    current: Option<StreamSession>,
}

impl SessionTracker {
    /// Creates a tracker in the `Unknown` state with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current live state.
    pub fn state(&self) -> LiveState {
        self.state
    }

    /// Record of automatic posts.
    pub fn record(&self) -> &PostRecord {
        &self.record
    }

    /// Session seen on the latest live observation.
    pub fn current_session(&self) -> Option<&StreamSession> {
        self.current.as_ref()
    }

    /// Copy of the state for a manual post.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            state: self.state,
            session: self.current.clone(),
        }
    }

    /// Feed one successful poll result and decide whether to post.
    ///
    /// Failed polls must not be fed here; they leave the state untouched.
    pub fn observe(&mut self, status: LiveStatus) -> Decision {
        let previous = self.state;

        if !status.is_live {
            self.state = LiveState::Offline;
            self.current = None;
            if previous == LiveState::Live {
                info!("stream went offline");
            }
            return Decision::NoAction;
        }

        self.state = LiveState::Live;

        let Some(session) = status.session else {
            warn!("channel reported live without stream metadata");
            return Decision::NoAction;
        };

        if previous != LiveState::Live {
            info!(session_id = %session.id, title = %session.title, "stream went live");
        }

        if self.record.has_posted(&session.id) {
            debug!(session_id = %session.id, "session already posted, suppressing");
            self.current = Some(session);
            return Decision::NoAction;
        }

        self.current = Some(session.clone());
        Decision::PostAutomatic(session)
    }

    /// Remember a successful automatic post. Only the dispatcher calls this.
    pub(crate) fn record_post(&mut self, session_id: &SessionId, at: DateTime<Utc>) {
        self.record.record(session_id, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(id: &str) -> LiveStatus {
        LiveStatus::live(StreamSession::new(id, "title", "Just Chatting", Utc::now()))
    }

    /// Observe and, like a successful dispatch, record any automatic post.
    fn observe_and_post(tracker: &mut SessionTracker, status: LiveStatus) -> Decision {
        let decision = tracker.observe(status);
        if let Decision::PostAutomatic(session) = &decision {
            tracker.record_post(&session.id, Utc::now());
        }
        decision
    }

    #[test]
    fn test_initial_state() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.state(), LiveState::Unknown);
        assert!(tracker.record().last_posted_session_id.is_none());
        assert!(tracker.current_session().is_none());
    }

    #[test]
    fn test_offline_to_live_posts() {
        let mut tracker = SessionTracker::new();
        assert_eq!(tracker.observe(LiveStatus::offline()), Decision::NoAction);

        let decision = tracker.observe(live("a"));
        assert!(matches!(decision, Decision::PostAutomatic(ref s) if s.id.as_str() == "a"));
        assert_eq!(tracker.state(), LiveState::Live);
    }

    #[test]
    fn test_first_observation_live_posts() {
        let mut tracker = SessionTracker::new();
        assert!(matches!(
            tracker.observe(live("a")),
            Decision::PostAutomatic(_)
        ));
    }

    #[test]
    fn test_same_session_suppressed() {
        let mut tracker = SessionTracker::new();
        observe_and_post(&mut tracker, live("a"));

        assert_eq!(tracker.observe(live("a")), Decision::NoAction);
        assert_eq!(tracker.state(), LiveState::Live);
    }

    #[test]
    fn test_retitle_does_not_repost() {
        let mut tracker = SessionTracker::new();
        observe_and_post(&mut tracker, live("a"));

        let mut renamed = StreamSession::new("a", "new title", "Celeste", Utc::now());
        renamed.viewer_count = 42;
        assert_eq!(tracker.observe(LiveStatus::live(renamed)), Decision::NoAction);
        assert_eq!(tracker.current_session().unwrap().title, "new title");
    }

    #[test]
    fn test_unposted_session_is_retried() {
        let mut tracker = SessionTracker::new();

        // Publish failed: nothing recorded.
        assert!(matches!(tracker.observe(live("a")), Decision::PostAutomatic(_)));
        // Next poll still sees the same session and tries again.
        assert!(matches!(tracker.observe(live("a")), Decision::PostAutomatic(_)));
    }

    #[test]
    fn test_offline_gap_same_session_not_reposted() {
        let mut tracker = SessionTracker::new();
        observe_and_post(&mut tracker, live("a"));
        tracker.observe(LiveStatus::offline());

        assert_eq!(tracker.observe(live("a")), Decision::NoAction);
    }

    #[test]
    fn test_offline_clears_current_session() {
        let mut tracker = SessionTracker::new();
        observe_and_post(&mut tracker, live("a"));
        assert_eq!(tracker.observe(LiveStatus::offline()), Decision::NoAction);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.state, LiveState::Offline);
        assert!(snapshot.session.is_none());
        assert!(tracker.record().has_posted(&SessionId::from("a")));
    }

    #[test]
    fn test_live_without_metadata() {
        let mut tracker = SessionTracker::new();
        let status = LiveStatus {
            is_live: true,
            session: None,
        };
        assert_eq!(tracker.observe(status), Decision::NoAction);
        assert_eq!(tracker.state(), LiveState::Live);
    }

    #[test]
    fn test_scenario_two_sessions() {
        let mut tracker = SessionTracker::new();
        let sequence = vec![
            LiveStatus::offline(),
            live("A"),
            live("A"),
            LiveStatus::offline(),
            live("B"),
        ];

        let posted: Vec<String> = sequence
            .into_iter()
            .filter_map(|status| match observe_and_post(&mut tracker, status) {
                Decision::PostAutomatic(s) => Some(s.id.to_string()),
                Decision::NoAction => None,
            })
            .collect();

        assert_eq!(posted, vec!["A", "B"]);
    }

    #[test]
    fn test_stale_earlier_session_not_reposted() {
        let mut tracker = SessionTracker::new();
        let mut posted = Vec::new();

        // A lagging status response reports "A" again after "B" went live.
        for id in ["A", "B", "A"] {
            if let Decision::PostAutomatic(s) = observe_and_post(&mut tracker, live(id)) {
                posted.push(s.id.to_string());
            }
        }

        assert_eq!(posted, vec!["A", "B"]);
        assert_eq!(tracker.state(), LiveState::Live);
        assert_eq!(tracker.current_session().unwrap().id.as_str(), "A");
    }

    #[test]
    fn test_each_session_posted_once() {
        let mut tracker = SessionTracker::new();
        let ids = ["a", "a", "b", "b", "a", "c", "c", "c"];
        let mut posted = Vec::new();

        for (i, id) in ids.iter().enumerate() {
            if i % 3 == 2 {
                tracker.observe(LiveStatus::offline());
            }
            if let Decision::PostAutomatic(s) = observe_and_post(&mut tracker, live(id)) {
                posted.push(s.id.to_string());
            }
        }

        assert_eq!(posted, vec!["a", "b", "c"]);
        assert_eq!(
            tracker.record().last_posted_session_id,
            Some(SessionId::from("c"))
        );
    }
}
