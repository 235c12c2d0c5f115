//! Link previews from OpenGraph tags.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use liveping_core::PreviewFetcher;
use liveping_models::PreviewCard;

use crate::error::{BlueskyError, Result};

/// Longest card description kept.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

const USER_AGENT: &str = concat!("liveping/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn meta_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<meta\s[^>]*>").expect("meta pattern"))
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)([a-zA-Z][\w:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attr pattern")
    })
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern"))
}

/// Decode the handful of entities that show up in meta tags.
pub fn unescape_html(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// `property`/`name` → `content` for every meta tag in `html`.
fn meta_tags(html: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();

    for tag in meta_regex().find_iter(html) {
        let mut key = None;
        let mut content = None;

        for caps in attr_regex().captures_iter(tag.as_str()) {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match name.as_str() {
                "property" | "name" => key = Some(value.to_ascii_lowercase()),
                "content" => content = Some(unescape_html(value.trim())),
                _ => {}
            }
        }

        if let (Some(key), Some(content)) = (key, content) {
            tags.entry(key).or_insert(content);
        }
    }

    tags
}

/// Build a preview card for `page_url` from its HTML.
pub fn parse_card(page_url: &str, html: &str) -> Result<PreviewCard> {
    let tags = meta_tags(html);
    let pick = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| tags.get(*k))
            .find(|v| !v.is_empty())
            .cloned()
    };

    let title = pick(&["og:title", "twitter:title"])
        .or_else(|| {
            title_regex()
                .captures(html)
                .map(|c| unescape_html(c[1].trim()))
                .filter(|t| !t.is_empty())
        })
        .ok_or_else(|| BlueskyError::Parse(format!("no title found at {}", page_url)))?;

    let description: String = pick(&["og:description", "twitter:description", "description"])
        .unwrap_or_default()
        .chars()
        .take(MAX_DESCRIPTION_CHARS)
        .collect();

    Ok(PreviewCard {
        uri: page_url.to_string(),
        title,
        description,
        thumbnail_url: pick(&["og:image", "twitter:image"]),
    })
}

/// Fetches a page and reads its OpenGraph tags.
pub struct OpenGraphPreview {
    http: reqwest::Client,
}

impl OpenGraphPreview {
    /// Creates a fetcher.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch and parse `page_url`.
    pub async fn card(&self, page_url: &str) -> Result<PreviewCard> {
        let response = self.http.get(page_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlueskyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let html = response.text().await?;
        let card = parse_card(page_url, &html)?;
        debug!(uri = %card.uri, title = %card.title, has_image = card.thumbnail_url.is_some(), "built preview card");
        Ok(card)
    }
}

#[async_trait]
impl PreviewFetcher for OpenGraphPreview {
    async fn fetch(&self, page_url: &str) -> liveping_core::error::Result<PreviewCard> {
        Ok(self.card(page_url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWITCH_PAGE: &str = r#"<!DOCTYPE html><html><head>
        <title>Twitch</title>
        <meta property="og:site_name" content="Twitch">
        <meta property="og:title" content="somestreamer - Twitch">
        <meta content="Painting &amp; chill. Come say hi!" property="og:description"/>
        <meta property='og:image' content='https://static-cdn.example/profile.png'>
        <meta name="twitter:title" content="ignored">
        </head><body></body></html>"#;

    #[test]
    fn test_parse_open_graph() {
        let card = parse_card("https://twitch.tv/somestreamer", TWITCH_PAGE).unwrap();

        assert_eq!(card.uri, "https://twitch.tv/somestreamer");
        assert_eq!(card.title, "somestreamer - Twitch");
        assert_eq!(card.description, "Painting & chill. Come say hi!");
        assert_eq!(
            card.thumbnail_url.as_deref(),
            Some("https://static-cdn.example/profile.png")
        );
    }

    #[test]
    fn test_title_tag_fallback() {
        let html = "<html><head><title> My &quot;Stream&quot; </title></head></html>";
        let card = parse_card("https://example.com", html).unwrap();

        assert_eq!(card.title, "My \"Stream\"");
        assert_eq!(card.description, "");
        assert!(card.thumbnail_url.is_none());
    }

    #[test]
    fn test_missing_title_is_error() {
        let err = parse_card("https://example.com", "<html></html>").unwrap_err();
        assert!(matches!(err, BlueskyError::Parse(_)));
    }

    #[test]
    fn test_description_truncated() {
        let long = "a".repeat(500);
        let html = format!(
            r#"<meta property="og:title" content="t"><meta name="description" content="{}">"#,
            long
        );
        let card = parse_card("https://example.com", &html).unwrap();
        assert_eq!(card.description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("a &amp;lt; b"), "a &lt; b");
        assert_eq!(unescape_html("it&#39;s"), "it's");
    }
}
