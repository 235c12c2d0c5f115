//! Twitch live-status source for Liveping.
//!
//! `TwitchClient` authenticates with the client-credentials grant, caches the
//! app access token and asks Helix whether a channel is live. The Helix
//! stream ID identifies the broadcast session.

pub mod client;
pub mod error;
pub mod types;

pub use client::{channel_url, TwitchClient, DEFAULT_API_URL, DEFAULT_AUTH_URL};
pub use error::{Result, TwitchError};
