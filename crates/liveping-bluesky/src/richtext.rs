//! Rich-text facet detection.
//!
//! Bluesky does not linkify post text itself; links and hashtags only become
//! clickable when the record carries facets. Facet ranges are UTF-8 byte
//! offsets into the text.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

/// Longest hashtag Bluesky accepts, excluding `#`.
const MAX_TAG_LEN: usize = 64;

/// Characters stripped from the end of a detected link or tag.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

/// What a facet marks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetFeature {
    /// Clickable link.
    Link(String),
    /// Hashtag, without the leading `#`.
    Tag(String),
}

/// A marked-up byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub byte_start: usize,
    pub byte_end: usize,
    pub feature: FacetFeature,
}

impl Facet {
    /// The `app.bsky.richtext.facet` JSON form.
    pub fn to_json(&self) -> Value {
        let feature = match &self.feature {
            FacetFeature::Link(uri) => json!({
                "$type": "app.bsky.richtext.facet#link",
                "uri": uri,
            }),
            FacetFeature::Tag(tag) => json!({
                "$type": "app.bsky.richtext.facet#tag",
                "tag": tag,
            }),
        };

        json!({
            "index": { "byteStart": self.byte_start, "byteEnd": self.byte_end },
            "features": [feature],
        })
    }
}

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s<>]+").expect("link pattern"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)#([^\s#]+)").expect("tag pattern"))
}

/// Find link and hashtag facets in `text`, ordered by position.
pub fn detect_facets(text: &str) -> Vec<Facet> {
    let mut facets = Vec::new();

    for m in link_regex().find_iter(text) {
        let uri = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        facets.push(Facet {
            byte_start: m.start(),
            byte_end: m.start() + uri.len(),
            feature: FacetFeature::Link(uri.to_string()),
        });
    }

    for caps in tag_regex().captures_iter(text) {
        let Some(body) = caps.get(1) else {
            continue;
        };
        let tag = body.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            continue;
        }
        facets.push(Facet {
            // Include the '#'.
            byte_start: body.start() - 1,
            byte_end: body.start() + tag.len(),
            feature: FacetFeature::Tag(tag.to_string()),
        });
    }

    facets.sort_by_key(|f| f.byte_start);
    facets
}
