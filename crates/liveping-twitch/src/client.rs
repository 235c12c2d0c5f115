//! Helix client with a cached app access token.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use liveping_core::StatusSource;
use liveping_models::LiveStatus;

use crate::error::{Result, TwitchError};
use crate::types::{StreamsResponse, TokenResponse};

/// Twitch OAuth base URL.
pub const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv";

/// Twitch Helix base URL.
pub const DEFAULT_API_URL: &str = "https://api.twitch.tv";

/// Public Twitch web URL.
pub const TWITCH_WEB_URL: &str = "https://twitch.tv";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 300;

/// Public channel URL for `username`.
pub fn channel_url(username: &str) -> String {
    format!("{}/{}", TWITCH_WEB_URL, username)
}

#[derive(Debug, Clone)]
struct AppToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl AppToken {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

/// Live-status source backed by the Helix streams endpoint.
pub struct TwitchClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    api_url: String,
    token: Mutex<Option<AppToken>>,
}

impl TwitchClient {
    /// Creates a client for the given app credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Points the client at different OAuth and Helix hosts.
    pub fn with_base_urls(mut self, auth_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into().trim_end_matches('/').to_string();
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch a new app access token.
    async fn request_token(&self) -> Result<AppToken> {
        let url = format!("{}/oauth2/token", self.auth_url);
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| TwitchError::Auth(format!("HTTP error requesting token: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TwitchError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| TwitchError::Auth(format!("parse error on token JSON: {}", e)))?;

        let ttl = token.ttl_secs();
        info!(expires_in = ttl, "obtained Twitch app access token");

        Ok(AppToken {
            access_token: token.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(ttl),
        })
    }

    /// Cached token, refreshed when close to expiry.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.needs_refresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
            debug!("Twitch token near expiry, refreshing");
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn clear_token(&self) {
        *self.token.lock().await = None;
    }

    /// Query the live status of `username`.
    pub async fn stream_status(&self, username: &str) -> Result<LiveStatus> {
        let token = self.access_token().await?;
        let login = username.to_lowercase();
        let url = format!("{}/helix/streams", self.api_url);

        let response = self
            .http
            .get(&url)
            .query(&[("user_login", login.as_str())])
            .header("Client-Id", &self.client_id)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                warn!("Helix rejected the app token, dropping it");
                self.clear_token().await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(TwitchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let streams: StreamsResponse = response.json().await?;
        let live = streams.into_status();

        debug!(username = %login, is_live = live.is_live, "polled Twitch");

        Ok(live)
    }
}

#[async_trait]
impl StatusSource for TwitchClient {
    async fn poll(&self, username: &str) -> liveping_core::error::Result<LiveStatus> {
        Ok(self.stream_status(username).await?)
    }
}
