//! Bluesky publishing for Liveping.
//!
//! - `BlueskyClient` logs in with an app password and creates
//!   `app.bsky.feed.post` records with link/hashtag facets and an optional
//!   external link card
//! - `OpenGraphPreview` builds link cards from a page's OpenGraph tags
//! - `DryRunPublisher` logs posts instead of sending them

pub mod client;
pub mod dry_run;
pub mod error;
pub mod preview;
pub mod richtext;

pub use client::{BlueskyClient, DEFAULT_SERVICE, MAX_POST_CHARS};
pub use dry_run::DryRunPublisher;
pub use error::{BlueskyError, Result};
pub use preview::OpenGraphPreview;
pub use richtext::{detect_facets, Facet, FacetFeature};
