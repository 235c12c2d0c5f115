//! Live state and stream session types.
//!
//! A `StreamSession` is produced by a status source on every poll that finds
//! the channel live. It is a transient value: the runtime only keeps the most
//! recent one as a snapshot for manual posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::ids::SessionId;

/// Observed state of the watched channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LiveState {
    /// No successful poll yet.
    #[default]
    Unknown,
    /// Channel is not broadcasting.
    Offline,
    /// Channel is broadcasting.
    Live,
}

impl LiveState {
    /// Returns true if the channel is live.
    pub fn is_live(&self) -> bool {
        matches!(self, LiveState::Live)
    }
}

impl fmt::Display for LiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveState::Unknown => write!(f, "UNKNOWN"),
            LiveState::Offline => write!(f, "OFFLINE"),
            LiveState::Live => write!(f, "LIVE"),
        }
    }
}

/// Metadata of one live broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSession {
    /// Identifier stable for the whole broadcast.
    pub id: SessionId,

    /// Stream title.
    pub title: String,

    /// Category or game being streamed.
    pub category: String,

    /// When the broadcast started.
    pub started_at: DateTime<Utc>,

    /// Current viewer count, if the provider reports one.
    #[serde(default)]
    pub viewer_count: u64,

    /// Provider thumbnail for the broadcast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl StreamSession {
    /// Creates a session with the required fields.
    pub fn new(
        id: impl Into<SessionId>,
        title: impl Into<String>,
        category: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            started_at,
            viewer_count: 0,
            thumbnail_url: None,
        }
    }

    /// Sets the viewer count.
    pub fn with_viewer_count(mut self, viewers: u64) -> Self {
        self.viewer_count = viewers;
        self
    }

    /// Sets the thumbnail URL.
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

/// Result of a single status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    /// Whether the channel is live.
    pub is_live: bool,

    /// Session metadata, present only when live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<StreamSession>,
}

impl LiveStatus {
    /// A live observation with metadata.
    pub fn live(session: StreamSession) -> Self {
        Self {
            is_live: true,
            session: Some(session),
        }
    }

    /// An offline observation.
    pub fn offline() -> Self {
        Self {
            is_live: false,
            session: None,
        }
    }

    /// The live state this observation maps to.
    pub fn state(&self) -> LiveState {
        if self.is_live {
            LiveState::Live
        } else {
            LiveState::Offline
        }
    }
}

/// How many automatically posted session ids a `PostRecord` remembers.
pub const POSTED_HISTORY_LEN: usize = 32;

/// Record of successful automatic posts.
///
/// Lives in process memory only, so a restart forgets it and a still-live
/// session is posted again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Session that triggered the last automatic post.
    pub last_posted_session_id: Option<SessionId>,

    /// When that post was published.
    pub last_posted_at: Option<DateTime<Utc>>,

    /// Recently posted session ids, oldest first.
    #[serde(default, skip_serializing_if = "VecDeque::is_empty")]
    posted: VecDeque<SessionId>,
}

impl PostRecord {
    /// Returns true if `id` already triggered an automatic post.
    ///
    /// Covers the last [`POSTED_HISTORY_LEN`] posted sessions, so a stale
    /// status reporting an older session after a newer one is still
    /// recognised.
    pub fn has_posted(&self, id: &SessionId) -> bool {
        self.last_posted_session_id.as_ref() == Some(id) || self.posted.contains(id)
    }

    /// Remember a successful automatic post for `id`.
    pub fn record(&mut self, id: &SessionId, at: DateTime<Utc>) {
        if !self.posted.contains(id) {
            if self.posted.len() == POSTED_HISTORY_LEN {
                self.posted.pop_front();
            }
            self.posted.push_back(id.clone());
        }
        self.last_posted_session_id = Some(id.clone());
        self.last_posted_at = Some(at);
    }

    /// Number of session ids remembered.
    pub fn remembered(&self) -> usize {
        self.posted.len()
    }
}
