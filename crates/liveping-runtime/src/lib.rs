//! Async runtime for Liveping.
//!
//! This crate drives the whole bot:
//! - `SessionTracker` - owns the live state and decides when to post
//! - `MessageComposer` - renders templates and attaches previews
//! - `Dispatcher` - publishes and reports structured outcomes
//! - `PollLoop` - the poll → decide → dispatch → sleep loop
//! - `Runtime` - spawns the loop and handles shutdown
//!
//! # Example
//!
//! ```ignore
//! use liveping_runtime::{Runtime, RuntimeConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RuntimeConfig::new("somestreamer");
//!     let mut runtime = Runtime::builder(config)
//!         .status_source(Arc::new(twitch))
//!         .publisher(Arc::new(bluesky))
//!         .build()?;
//!
//!     let trigger = runtime.trigger_handle();
//!     runtime.run_forever(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Key Concepts
//!
//! ## Single consumer
//!
//! Only the poll loop mutates the tracker. Manual triggers arrive through a
//! channel and are served while the loop sleeps, so a manual post never races
//! an automatic one.
//!
//! ## Failures
//!
//! Poll and publish failures are logged, broadcast as events, and never stop
//! the loop. A failed automatic post is retried on the next cycle that still
//! sees the session.

pub mod composer;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod poller;
pub mod runtime;
pub mod tracker;
pub mod trigger;

#[cfg(test)]
mod test_support;

pub use composer::MessageComposer;
pub use config::RuntimeConfig;
pub use dispatcher::{DispatchKind, DispatchOutcome, DispatchStatus, Dispatcher};
pub use error::{Result, RuntimeError};
pub use event::RuntimeEvent;
pub use poller::{CycleReport, LoopPhase, PollLoop};
pub use runtime::{Runtime, RuntimeBuilder};
pub use tracker::{Decision, SessionTracker, StateSnapshot};
pub use trigger::{is_trigger_line, listen_lines, ManualTrigger, TriggerHandle};
