//! Collaborator capabilities driven by the runtime.
//!
//! Implementations own their transport details, including timeouts; a call
//! that does not answer within the collaborator's own timeout simply returns
//! an error.

use async_trait::async_trait;

use liveping_models::{Content, LiveStatus, PostId, PreviewCard};

use crate::error::Result;

/// Reports whether an account is currently live.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Poll the live status of `username`.
    async fn poll(&self, username: &str) -> Result<LiveStatus>;
}

/// Publishes composed content to the social service.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `content` and return the created post's ID.
    async fn publish(&self, content: &Content) -> Result<PostId>;

    /// Verify that credentials work without posting anything.
    async fn check_connection(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds link previews from a public page.
#[async_trait]
pub trait PreviewFetcher: Send + Sync {
    /// Fetch preview metadata for `page_url`.
    async fn fetch(&self, page_url: &str) -> Result<PreviewCard>;
}
