//! Post content handed to a publisher.

use serde::{Deserialize, Serialize};

/// Link preview attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewCard {
    /// Page the card links to.
    pub uri: String,
    /// Card title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Image shown on the card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// A composed post: text plus an optional preview card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Post body.
    pub text: String,
    /// Preview attachment, if one could be built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewCard>,
}

impl Content {
    /// Text-only content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            preview: None,
        }
    }

    /// Attaches a preview card.
    pub fn with_preview(mut self, preview: PreviewCard) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Returns true if a preview card is attached.
    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }
}
