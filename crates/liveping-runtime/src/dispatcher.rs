//! Compose-and-publish orchestration.
//!
//! Automatic dispatches update the tracker's `PostRecord` on success; manual
//! dispatches never read or write it, so an override is unconditional and
//! never hides a later automatic post.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use liveping_core::Publisher;
use liveping_models::{LiveState, PostId, SessionId, StreamSession};

use crate::composer::MessageComposer;
use crate::tracker::{SessionTracker, StateSnapshot};

/// Why a post was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Automatic,
    Manual,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKind::Automatic => write!(f, "automatic"),
            DispatchKind::Manual => write!(f, "manual"),
        }
    }
}

/// Result of the publisher call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Published(PostId),
    Failed(String),
}

/// Structured report of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub kind: DispatchKind,
    /// Session the content was composed for; `None` for the fallback.
    pub session_id: Option<SessionId>,
    pub status: DispatchStatus,
    pub preview_attached: bool,
    pub at: DateTime<Utc>,
}

impl DispatchOutcome {
    /// Returns true if the post was published.
    pub fn is_success(&self) -> bool {
        matches!(self.status, DispatchStatus::Published(_))
    }

    /// Post ID on success.
    pub fn post_id(&self) -> Option<&PostId> {
        match &self.status {
            DispatchStatus::Published(id) => Some(id),
            DispatchStatus::Failed(_) => None,
        }
    }
}

/// Composes content and hands it to the publisher.
pub struct Dispatcher {
    composer: MessageComposer,
    publisher: Arc<dyn Publisher>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    pub fn new(composer: MessageComposer, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            composer,
            publisher,
        }
    }

    /// Publish the automatic notification for `session`.
    ///
    /// On failure the record is left untouched so the next poll that still
    /// sees the session retries. No retry happens inside this call.
    pub async fn dispatch_automatic(
        &self,
        tracker: &mut SessionTracker,
        session: &StreamSession,
    ) -> DispatchOutcome {
        let content = self.composer.compose_live(session).await;
        let preview_attached = content.has_preview();

        let status = match self.publisher.publish(&content).await {
            Ok(post_id) => {
                let now = Utc::now();
                tracker.record_post(&session.id, now);
                info!(session_id = %session.id, post_id = %post_id, "posted live notification");
                DispatchStatus::Published(post_id)
            }
            Err(e) => {
                error!(session_id = %session.id, error = %e, "failed to publish live notification");
                DispatchStatus::Failed(e.to_string())
            }
        };

        DispatchOutcome {
            kind: DispatchKind::Automatic,
            session_id: Some(session.id.clone()),
            status,
            preview_attached,
            at: Utc::now(),
        }
    }

    /// Publish immediately, ignoring any dedup record.
    ///
    /// Live snapshots with session metadata get the live message; anything
    /// else gets the fallback.
    pub async fn dispatch_manual(&self, snapshot: &StateSnapshot) -> DispatchOutcome {
        let session = match snapshot.state {
            LiveState::Live => snapshot.session.as_ref(),
            LiveState::Offline | LiveState::Unknown => None,
        };

        let content = self.composer.compose(session).await;
        let preview_attached = content.has_preview();

        let status = match self.publisher.publish(&content).await {
            Ok(post_id) => {
                info!(state = %snapshot.state, post_id = %post_id, "posted manual notification");
                DispatchStatus::Published(post_id)
            }
            Err(e) => {
                error!(state = %snapshot.state, error = %e, "failed to publish manual notification");
                DispatchStatus::Failed(e.to_string())
            }
        };

        DispatchOutcome {
            kind: DispatchKind::Manual,
            session_id: session.map(|s| s.id.clone()),
            status,
            preview_attached,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::test_support::{FailingPreview, RecordingPublisher};
    use crate::tracker::Decision;
    use liveping_models::LiveStatus;

    fn config() -> RuntimeConfig {
        RuntimeConfig::new("testuser").with_post_template("{username} is live")
    }

    fn session(id: &str) -> StreamSession {
        StreamSession::new(id, "title", "Art", Utc::now())
    }

    fn dispatcher(publisher: Arc<RecordingPublisher>) -> Dispatcher {
        Dispatcher::new(MessageComposer::new(&config()), publisher)
    }

    #[tokio::test]
    async fn test_automatic_success_updates_record() {
        let publisher = Arc::new(RecordingPublisher::new());
        let dispatcher = dispatcher(publisher.clone());
        let mut tracker = SessionTracker::new();

        let outcome = dispatcher.dispatch_automatic(&mut tracker, &session("a")).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.kind, DispatchKind::Automatic);
        assert_eq!(outcome.post_id().unwrap().as_str(), "post-1");
        assert!(tracker.record().has_posted(&SessionId::from("a")));
        assert!(tracker.record().last_posted_at.is_some());
        assert_eq!(publisher.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_automatic_failure_leaves_record() {
        let publisher = Arc::new(RecordingPublisher::failing(1));
        let dispatcher = dispatcher(publisher.clone());
        let mut tracker = SessionTracker::new();

        let outcome = dispatcher.dispatch_automatic(&mut tracker, &session("a")).await;

        assert!(!outcome.is_success());
        assert!(matches!(outcome.status, DispatchStatus::Failed(ref msg) if msg.contains("502")));
        assert!(tracker.record().last_posted_session_id.is_none());
        assert!(publisher.posts().is_empty());
    }

    #[tokio::test]
    async fn test_manual_live_uses_session_content() {
        let publisher = Arc::new(RecordingPublisher::new());
        let dispatcher = dispatcher(publisher.clone());
        let snapshot = StateSnapshot {
            state: LiveState::Live,
            session: Some(session("a")),
        };

        let outcome = dispatcher.dispatch_manual(&snapshot).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.kind, DispatchKind::Manual);
        assert_eq!(outcome.session_id, Some(SessionId::from("a")));
        assert!(publisher.posts()[0].text.starts_with("testuser is live"));
    }

    #[tokio::test]
    async fn test_manual_offline_uses_fallback() {
        let publisher = Arc::new(RecordingPublisher::new());
        let dispatcher = dispatcher(publisher.clone());
        let snapshot = StateSnapshot {
            state: LiveState::Offline,
            session: None,
        };

        let outcome = dispatcher.dispatch_manual(&snapshot).await;

        assert!(outcome.is_success());
        assert!(outcome.session_id.is_none());
        assert!(publisher.posts()[0].text.contains("is online"));
    }

    #[tokio::test]
    async fn test_manual_does_not_block_later_automatic() {
        let publisher = Arc::new(RecordingPublisher::new());
        let dispatcher = dispatcher(publisher.clone());
        let mut tracker = SessionTracker::new();

        // Tracker sees the session but the automatic post hasn't run yet.
        let decision = tracker.observe(LiveStatus::live(session("a")));
        assert!(matches!(decision, Decision::PostAutomatic(_)));

        dispatcher.dispatch_manual(&tracker.snapshot()).await;
        assert!(tracker.record().last_posted_session_id.is_none());

        let Decision::PostAutomatic(s) = decision else {
            unreachable!()
        };
        let outcome = dispatcher.dispatch_automatic(&mut tracker, &s).await;
        assert!(outcome.is_success());
        assert_eq!(publisher.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_preview_failure_still_publishes() {
        let publisher = Arc::new(RecordingPublisher::new());
        let composer = MessageComposer::new(&config()).with_preview(Arc::new(FailingPreview));
        let dispatcher = Dispatcher::new(composer, publisher.clone());
        let mut tracker = SessionTracker::new();

        let outcome = dispatcher.dispatch_automatic(&mut tracker, &session("a")).await;

        assert!(outcome.is_success());
        assert!(!outcome.preview_attached);
        assert_eq!(publisher.posts().len(), 1);
    }
}
