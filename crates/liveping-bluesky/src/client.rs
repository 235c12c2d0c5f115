//! AT Protocol XRPC client that publishes posts.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use liveping_core::Publisher;
use liveping_models::{Content, PostId, PreviewCard};

use crate::error::{BlueskyError, Result};
use crate::richtext::detect_facets;

/// Default PDS.
pub const DEFAULT_SERVICE: &str = "https://bsky.social";

/// Longest post text accepted by Bluesky.
pub const MAX_POST_CHARS: usize = 300;

/// Languages tagged on every post.
const POST_LANGS: &[&str] = &["en"];

/// Largest thumbnail blob Bluesky accepts.
const MAX_THUMB_BYTES: usize = 1_000_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    #[serde(default)]
    handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    #[serde(default)]
    display_name: Option<String>,
    handle: String,
}

/// Publisher posting to a Bluesky PDS with an app password.
pub struct BlueskyClient {
    http: reqwest::Client,
    service: Url,
    handle: String,
    app_password: String,
    session: Mutex<Option<Session>>,
}

impl BlueskyClient {
    /// Creates a client for `handle` on the default service.
    pub fn new(handle: impl Into<String>, app_password: impl Into<String>) -> Result<Self> {
        Self::with_service(DEFAULT_SERVICE, handle, app_password)
    }

    /// Creates a client for `handle` on `service`.
    pub fn with_service(
        service: &str,
        handle: impl Into<String>,
        app_password: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut service = Url::parse(service)?;
        if !service.path().ends_with('/') {
            let path = format!("{}/", service.path());
            service.set_path(&path);
        }

        Ok(Self {
            http,
            service,
            handle: handle.into(),
            app_password: app_password.into(),
            session: Mutex::new(None),
        })
    }

    fn xrpc_url(&self, method: &str) -> Result<Url> {
        Ok(self.service.join(&format!("xrpc/{}", method))?)
    }

    async fn login(&self) -> Result<Session> {
        info!(handle = %self.handle, "logging into Bluesky");

        let response = self
            .http
            .post(self.xrpc_url("com.atproto.server.createSession")?)
            .json(&json!({
                "identifier": self.handle,
                "password": self.app_password,
            }))
            .send()
            .await
            .map_err(|e| BlueskyError::Auth(format!("HTTP error during login: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlueskyError::Auth(format!("{}: {}", status, body)));
        }

        let session: Session = response
            .json()
            .await
            .map_err(|e| BlueskyError::Auth(format!("parse error on session JSON: {}", e)))?;

        info!(
            did = %session.did,
            handle = session.handle.as_deref().unwrap_or(&self.handle),
            "logged into Bluesky"
        );
        Ok(session)
    }

    async fn session(&self) -> Result<Session> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }

        let session = self.login().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    /// Turns a non-success response into an error, dropping the session when
    /// the token was refused.
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || body.contains("ExpiredToken") {
            warn!(status = status.as_u16(), "Bluesky session rejected, will log in again");
            *self.session.lock().await = None;
        }

        Err(BlueskyError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Download an image and upload it as a blob.
    ///
    /// The image host is not the PDS, so its errors never touch the session.
    async fn upload_thumb(&self, session: &Session, image_url: &str) -> Result<Value> {
        let response = self.http.get(image_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlueskyError::Api {
                status: status.as_u16(),
                body: format!("thumbnail fetch from {}", image_url),
            });
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await?;

        if bytes.len() > MAX_THUMB_BYTES {
            return Err(BlueskyError::Parse(format!(
                "thumbnail is {} bytes, limit is {}",
                bytes.len(),
                MAX_THUMB_BYTES
            )));
        }

        let response = self
            .http
            .post(self.xrpc_url("com.atproto.repo.uploadBlob")?)
            .bearer_auth(&session.access_jwt)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;
        let body: Value = self.check(response).await?.json().await?;

        body.get("blob")
            .cloned()
            .ok_or_else(|| BlueskyError::Parse("uploadBlob response has no blob".to_string()))
    }

    /// `app.bsky.embed.external` for `card`. A thumbnail that cannot be
    /// uploaded is left out.
    async fn external_embed(&self, session: &Session, card: &PreviewCard) -> Value {
        let mut external = json!({
            "uri": card.uri,
            "title": card.title,
            "description": card.description,
        });

        if let Some(image_url) = &card.thumbnail_url {
            match self.upload_thumb(session, image_url).await {
                Ok(blob) => external["thumb"] = blob,
                Err(e) => {
                    warn!(image = %image_url, error = %e, "thumbnail upload failed, posting card without image");
                }
            }
        }

        json!({
            "$type": "app.bsky.embed.external",
            "external": external,
        })
    }

    /// The `app.bsky.feed.post` record for `text`.
    pub fn build_record(&self, text: &str, embed: Option<Value>) -> Value {
        let mut record = json!({
            "$type": "app.bsky.feed.post",
            "text": text,
            "createdAt": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "langs": POST_LANGS,
        });

        let facets: Vec<Value> = detect_facets(text).iter().map(|f| f.to_json()).collect();
        if !facets.is_empty() {
            record["facets"] = Value::Array(facets);
        }
        if let Some(embed) = embed {
            record["embed"] = embed;
        }

        record
    }

    /// Publish `content` and return the new post's AT URI.
    pub async fn create_post(&self, content: &Content) -> Result<String> {
        let len = content.text.chars().count();
        if len > MAX_POST_CHARS {
            return Err(BlueskyError::TooLong {
                len,
                max: MAX_POST_CHARS,
            });
        }

        let session = self.session().await?;

        let embed = match &content.preview {
            Some(card) => Some(self.external_embed(&session, card).await),
            None => None,
        };
        let record = self.build_record(&content.text, embed);

        debug!(chars = len, "creating Bluesky post");

        let response = self
            .http
            .post(self.xrpc_url("com.atproto.repo.createRecord")?)
            .bearer_auth(&session.access_jwt)
            .json(&json!({
                "repo": session.did,
                "collection": "app.bsky.feed.post",
                "record": record,
            }))
            .send()
            .await?;

        let created: CreateRecordResponse = self.check(response).await?.json().await?;
        Ok(created.uri)
    }

    /// Log in if needed and fetch our own profile.
    pub async fn profile(&self) -> Result<String> {
        let session = self.session().await?;

        let mut url = self.xrpc_url("app.bsky.actor.getProfile")?;
        url.query_pairs_mut().append_pair("actor", &self.handle);

        let response = self
            .http
            .get(url)
            .bearer_auth(&session.access_jwt)
            .send()
            .await?;
        let profile: Profile = self.check(response).await?.json().await?;

        Ok(profile.display_name.unwrap_or(profile.handle))
    }
}

#[async_trait]
impl Publisher for BlueskyClient {
    async fn publish(&self, content: &Content) -> liveping_core::error::Result<PostId> {
        let uri = self.create_post(content).await?;
        info!(uri = %uri, "posted to Bluesky");
        Ok(PostId::new(uri))
    }

    async fn check_connection(&self) -> liveping_core::error::Result<()> {
        let name = self.profile().await?;
        info!(profile = %name, "Bluesky connection ok");
        Ok(())
    }
}
