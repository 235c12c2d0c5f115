//! Turns session metadata and templates into post content.
//!
//! Placeholders: `{username}` and `{url}` are always substituted; `{title}`
//! and `{category}` only when composing for a live session.

use std::sync::Arc;

use tracing::{debug, warn};

use liveping_core::PreviewFetcher;
use liveping_models::{Content, StreamSession};

use crate::config::RuntimeConfig;

/// Builds post content for live and offline dispatches.
pub struct MessageComposer {
    template: String,
    fallback_template: String,
    username: String,
    channel_url: String,
    preview: Option<Arc<dyn PreviewFetcher>>,
}

impl MessageComposer {
    /// Creates a composer from the runtime config, without previews.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            template: config.post_template.clone(),
            fallback_template: config.fallback_template.clone(),
            username: config.username.clone(),
            channel_url: config.channel_url.clone(),
            preview: None,
        }
    }

    /// Enables preview cards built by `fetcher`.
    pub fn with_preview(mut self, fetcher: Arc<dyn PreviewFetcher>) -> Self {
        self.preview = Some(fetcher);
        self
    }

    /// Render `template` for `username`, optionally with session details.
    ///
    /// With a session, title and category lines are appended unless the
    /// template already places them itself.
    pub fn render(
        template: &str,
        username: &str,
        channel_url: &str,
        session: Option<&StreamSession>,
    ) -> String {
        let mut text = template
            .replace("{username}", username)
            .replace("{url}", channel_url);

        if let Some(session) = session {
            let title = session.title.trim();
            let category = session.category.trim();

            if template.contains("{title}") {
                text = text.replace("{title}", title);
            } else if !title.is_empty() {
                text.push_str(&format!("\n\n📺 {}", title));
            }

            if template.contains("{category}") {
                text = text.replace("{category}", category);
            } else if !category.is_empty() {
                text.push_str(&format!("\n🎮 Playing {}", category));
            }
        }

        text
    }

    /// Compose for a live session, with a preview card when one can be built.
    ///
    /// A preview failure only drops the card; the text is always returned.
    pub async fn compose_live(&self, session: &StreamSession) -> Content {
        let text = Self::render(&self.template, &self.username, &self.channel_url, Some(session));
        let content = Content::text(text);

        let Some(fetcher) = &self.preview else {
            return content;
        };

        match fetcher.fetch(&self.channel_url).await {
            Ok(mut card) => {
                if card.thumbnail_url.is_none() {
                    card.thumbnail_url = session.thumbnail_url.clone();
                }
                debug!(uri = %card.uri, "preview card attached");
                content.with_preview(card)
            }
            Err(e) => {
                warn!(error = %e, url = %self.channel_url, "preview unavailable, posting text only");
                content
            }
        }
    }

    /// Compose the fixed fallback message used when there is no session.
    pub fn compose_fallback(&self) -> Content {
        Content::text(Self::render(
            &self.fallback_template,
            &self.username,
            &self.channel_url,
            None,
        ))
    }

    /// Compose for `session` if present, otherwise the fallback.
    pub async fn compose(&self, session: Option<&StreamSession>) -> Content {
        match session {
            Some(session) => self.compose_live(session).await,
            None => self.compose_fallback(),
        }
    }
}
