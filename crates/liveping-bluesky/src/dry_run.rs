//! Publisher that only logs.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use liveping_core::Publisher;
use liveping_models::{Content, PostId};

/// Records posts in memory instead of sending them. Used by `--mock`.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    posts: Mutex<Vec<Content>>,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything "posted" so far.
    pub fn posts(&self) -> Vec<Content> {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, content: &Content) -> liveping_core::error::Result<PostId> {
        let n = {
            let mut posts = self.posts.lock().unwrap_or_else(|e| e.into_inner());
            posts.push(content.clone());
            posts.len()
        };

        info!(
            n,
            preview = content.has_preview(),
            text = %content.text,
            "[dry run] would post"
        );
        Ok(PostId::new(format!("dry-run://{}", n)))
    }

    async fn check_connection(&self) -> liveping_core::error::Result<()> {
        info!("[dry run] skipping Bluesky connection test");
        Ok(())
    }
}
