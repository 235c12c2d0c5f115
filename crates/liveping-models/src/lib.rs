//! Core data models for Liveping.
//!
//! This crate provides the fundamental data types shared by the runtime and
//! its collaborators: live state, stream sessions, post records and the
//! composed post content.

pub mod content;
pub mod ids;
pub mod session;

// Re-export main types
pub use content::{Content, PreviewCard};
pub use ids::{PostId, SessionId};
pub use session::{LiveState, LiveStatus, PostRecord, StreamSession, POSTED_HISTORY_LEN};
