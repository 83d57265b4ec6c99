//! # teamsync-core
//!
//! Foundation types for the TeamSync real-time client crates.
//!
//! This crate provides the shared vocabulary the other teamsync crates depend on:
//!
//! - **Branded IDs**: [`ids::WorkspaceId`], [`ids::ProjectId`], [`ids::TaskId`] as newtypes
//! - **Events**: [`events::EventEnvelope`] with its [`events::EventKind`] and
//!   [`events::EventPayload`], the decoded unit of one push notification
//! - **Reconnect**: [`reconnect::ReconnectPolicy`] and backoff calculation
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other teamsync crates.

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod reconnect;
