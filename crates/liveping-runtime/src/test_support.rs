//! Mock collaborators for runtime tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use liveping_core::{AdapterError, PreviewFetcher, Publisher, StatusSource};
use liveping_models::{Content, LiveStatus, PostId, PreviewCard, StreamSession};

/// One scripted poll result.
pub(crate) enum Step {
    Status(LiveStatus),
    Fail(&'static str),
}

pub(crate) fn live(id: &str) -> Step {
    Step::Status(LiveStatus::live(StreamSession::new(
        id,
        format!("stream {}", id),
        "Just Chatting",
        Utc::now(),
    )))
}

pub(crate) fn offline() -> Step {
    Step::Status(LiveStatus::offline())
}

/// Status source that replays a script, then reports offline.
pub(crate) struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    polls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn poll(&self, _username: &str) -> liveping_core::error::Result<LiveStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Status(status)) => Ok(status),
            Some(Step::Fail(msg)) => Err(AdapterError::Transport(msg.to_string())),
            None => Ok(LiveStatus::offline()),
        }
    }
}

/// Publisher that records everything and can be told to fail.
pub(crate) struct RecordingPublisher {
    posts: Mutex<Vec<Content>>,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Take `delay` to complete each publish call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next `n` publish calls.
    pub fn failing(n: usize) -> Self {
        let publisher = Self::new();
        publisher.failures_left.store(n, Ordering::SeqCst);
        publisher
    }

    pub fn posts(&self) -> Vec<Content> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, content: &Content) -> liveping_core::error::Result<PostId> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(AdapterError::Http {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }

        let mut posts = self.posts.lock().unwrap();
        posts.push(content.clone());
        Ok(PostId::new(format!("post-{}", posts.len())))
    }
}

/// Preview fetcher returning a fixed card.
pub(crate) struct StaticPreview {
    image: Option<String>,
}

impl StaticPreview {
    pub fn without_image() -> Self {
        Self { image: None }
    }
}

#[async_trait]
impl PreviewFetcher for StaticPreview {
    async fn fetch(&self, page_url: &str) -> liveping_core::error::Result<PreviewCard> {
        Ok(PreviewCard {
            uri: page_url.to_string(),
            title: "channel".to_string(),
            description: "watch live".to_string(),
            thumbnail_url: self.image.clone(),
        })
    }
}

/// Preview fetcher that always fails.
pub(crate) struct FailingPreview;

#[async_trait]
impl PreviewFetcher for FailingPreview {
    async fn fetch(&self, _page_url: &str) -> liveping_core::error::Result<PreviewCard> {
        Err(AdapterError::Parse("no og:title".to_string()))
    }
}
