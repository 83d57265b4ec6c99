//! # teamsync-realtime
//!
//! The real-time cache synchronization client: one push-event subscription
//! per active workspace, mapped onto query-cache invalidations.
//!
//! - **Client**: [`client::SyncClient`] with its `activate`/`deactivate`
//!   lifecycle, at most one live subscription at a time
//! - **Channel**: [`channel::EventChannel`] seam, the [`channel::SseChannel`]
//!   transport, and the [`channel::ChannelWorker`] reconnect loop
//! - **Policy**: [`policy::invalidation_targets`], the pure mapping from one
//!   decoded event to the ordered key list to invalidate
//! - **Config**: [`config::RealtimeConfig`], passed explicitly to the client
//!
//! ## Crate Position
//!
//! Sits between the wire and the cache: depends on `teamsync-core` for the
//! event vocabulary and on `teamsync-cache` for the invalidation seam.

#![deny(unsafe_code)]

pub mod channel;
pub mod client;
pub mod config;
pub mod policy;

pub use channel::{ChannelError, EventChannel, EventFrame, SseChannel};
pub use client::SyncClient;
pub use config::RealtimeConfig;
