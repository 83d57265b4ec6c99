//! # teamsync-cache
//!
//! Query keys and the invalidation seam between the real-time client and
//! whatever owns the cached read results.
//!
//! - **Keys**: [`QueryKey`], an ordered tuple identifying one cached query
//!   (`["all-tasks", workspace]`), with constructors for the well-known keys
//! - **Seam**: [`QueryCache`], the one-method trait the sync client writes
//!   invalidations through
//! - **Store**: [`MemoryQueryCache`], an in-process stale-marking store
//! - **Test double**: [`RecordingCache`], which captures invalidation order
//!   for assertions
//!
//! ## Crate Position
//!
//! Depends on `teamsync-core` for ID types. Depended on by
//! `teamsync-realtime` and the binary.

#![deny(unsafe_code)]

pub mod key;
pub mod store;

pub use key::QueryKey;
pub use store::{CachedEntry, MemoryQueryCache, QueryCache, RecordingCache};
