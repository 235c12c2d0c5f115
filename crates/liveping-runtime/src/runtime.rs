//! Main runtime manager.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use liveping_core::{PreviewFetcher, Publisher, StatusSource};

use crate::composer::MessageComposer;
use crate::config::RuntimeConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::{Result, RuntimeError};
use crate::event::RuntimeEvent;
use crate::poller::{CycleReport, PollLoop};
use crate::trigger::{ManualTrigger, TriggerHandle};

const EVENT_CAPACITY: usize = 256;

/// Builder wiring collaborators into a [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    source: Option<Arc<dyn StatusSource>>,
    publisher: Option<Arc<dyn Publisher>>,
    preview: Option<Arc<dyn PreviewFetcher>>,
}

impl RuntimeBuilder {
    /// Creates a builder for `config`.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            source: None,
            publisher: None,
            preview: None,
        }
    }

    /// Sets the status source (required).
    pub fn status_source(mut self, source: Arc<dyn StatusSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the publisher (required).
    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Enables link previews.
    pub fn preview_fetcher(mut self, preview: Arc<dyn PreviewFetcher>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> Result<Runtime> {
        let source = self
            .source
            .ok_or(RuntimeError::MissingCollaborator("status source"))?;
        let publisher = self
            .publisher
            .ok_or(RuntimeError::MissingCollaborator("publisher"))?;

        let mut composer = MessageComposer::new(&self.config);
        if let Some(preview) = self.preview {
            composer = composer.with_preview(preview);
        }

        let dispatcher = Dispatcher::new(composer, publisher);
        let (trigger, manual) = ManualTrigger::channel();
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let poll_loop = PollLoop::new(self.config, source, dispatcher, manual, event_tx.clone());

        Ok(Runtime {
            poll_loop: Some(poll_loop),
            loop_handle: None,
            trigger,
            event_tx,
            shutdown_tx,
            shutdown_rx,
            started: false,
        })
    }
}

/// Owns the poll loop and runs it in a background task.
pub struct Runtime {
    /// The loop while it is not running.
    poll_loop: Option<PollLoop>,
    /// Handle to the running loop task; yields the loop back on exit.
    loop_handle: Option<JoinHandle<PollLoop>>,
    trigger: TriggerHandle,
    event_tx: broadcast::Sender<RuntimeEvent>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver (for cloning to the loop).
    shutdown_rx: watch::Receiver<bool>,
    started: bool,
}

impl Runtime {
    /// Starts building a runtime.
    pub fn builder(config: RuntimeConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    /// Subscribe to runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.event_tx.subscribe()
    }

    /// Handle for requesting manual posts from other tasks.
    pub fn trigger_handle(&self) -> TriggerHandle {
        self.trigger.clone()
    }

    /// The poll loop, when not running.
    pub fn poll_loop(&self) -> Option<&PollLoop> {
        self.poll_loop.as_ref()
    }

    /// Check if the runtime has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }

    fn idle_loop(&mut self) -> Result<&mut PollLoop> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.poll_loop.as_mut().ok_or(RuntimeError::NotStarted)
    }

    /// Run a single cycle in the foreground.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        let poll_loop = self.idle_loop()?;
        Ok(poll_loop.run_cycle().await)
    }

    /// Post from the current state in the foreground.
    ///
    /// While the loop is running use [`Runtime::trigger_handle`] instead.
    pub async fn trigger_manual_post(&mut self) -> Result<DispatchOutcome> {
        let poll_loop = self.idle_loop()?;
        Ok(poll_loop.trigger_manual_post().await)
    }

    /// Start the poll loop in a background task.
    pub async fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        let mut poll_loop = self.poll_loop.take().ok_or(RuntimeError::NotStarted)?;

        info!("starting runtime");

        self.shutdown_tx.send_replace(false);
        let shutdown_rx = self.shutdown_rx.clone();

        let handle = tokio::spawn(async move {
            poll_loop.run(shutdown_rx).await;
            poll_loop
        });

        self.loop_handle = Some(handle);
        self.started = true;

        debug!("runtime started");

        Ok(())
    }

    /// Stop the loop gracefully and take it back.
    ///
    /// An in-flight dispatch completes before the loop exits.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Err(RuntimeError::NotStarted);
        }

        info!("shutting down runtime");

        self.shutdown_tx.send(true).map_err(|e| {
            RuntimeError::Shutdown(format!("failed to send shutdown signal: {}", e))
        })?;

        if let Some(handle) = self.loop_handle.take() {
            debug!("waiting for poll loop to stop");
            let poll_loop = handle
                .await
                .map_err(|e| RuntimeError::Shutdown(format!("poll loop task panicked: {}", e)))?;
            self.poll_loop = Some(poll_loop);
        }

        self.started = false;

        info!("runtime stopped");

        Ok(())
    }

    /// Start, wait for `stop` to resolve, then shut down.
    pub async fn run_forever<F>(&mut self, stop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        stop.await;
        self.shutdown().await
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if self.started {
            let _ = self.shutdown_tx.send(true);
        }
    }
}
