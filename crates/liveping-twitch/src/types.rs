//! Helix wire types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use liveping_models::{LiveStatus, StreamSession};

/// Width and height substituted into Helix thumbnail templates.
pub const THUMBNAIL_WIDTH: u32 = 1280;
pub const THUMBNAIL_HEIGHT: u32 = 720;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest token lifetime believed. App access tokens last about 60 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 60 * 24 * 3600;

/// Response of `POST /oauth2/token` for the client-credentials grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Lifetime in seconds, clamped to `0..=MAX_TOKEN_TTL_SECS`.
    pub fn ttl_secs(&self) -> i64 {
        self.expires_in
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS)
            .clamp(0, MAX_TOKEN_TTL_SECS)
    }
}

/// Response of `GET /helix/streams`.
#[derive(Debug, Deserialize)]
pub struct StreamsResponse {
    #[serde(default)]
    pub data: Vec<HelixStream>,
}

/// One live stream entry.
#[derive(Debug, Clone, Deserialize)]
pub struct HelixStream {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl HelixStream {
    /// Session identifier: the stream ID, else the start timestamp.
    pub fn session_id(&self) -> Option<String> {
        if !self.id.is_empty() {
            return Some(self.id.clone());
        }
        self.started_at.map(|t| t.to_rfc3339())
    }

    /// Thumbnail with the size placeholders filled in.
    pub fn thumbnail(&self) -> Option<String> {
        self.thumbnail_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| {
                url.replace("{width}", &THUMBNAIL_WIDTH.to_string())
                    .replace("{height}", &THUMBNAIL_HEIGHT.to_string())
            })
    }

    /// Converts the entry into a session, if it can be identified.
    pub fn to_session(&self) -> Option<StreamSession> {
        let id = self.session_id()?;
        let started_at = self.started_at.unwrap_or_else(Utc::now);

        let mut session = StreamSession::new(id, self.title.clone(), self.game_name.clone(), started_at)
            .with_viewer_count(self.viewer_count);
        if let Some(thumb) = self.thumbnail() {
            session = session.with_thumbnail(thumb);
        }
        Some(session)
    }
}

impl StreamsResponse {
    /// Maps the response to a live status. An unidentifiable stream is
    /// reported as live without metadata.
    pub fn into_status(self) -> LiveStatus {
        match self.data.first() {
            None => LiveStatus::offline(),
            Some(stream) => match stream.to_session() {
                Some(session) => LiveStatus::live(session),
                None => LiveStatus {
                    is_live: true,
                    session: None,
                },
            },
        }
    }
}
