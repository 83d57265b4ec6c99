//! Pure mapping from received events to invalidation targets.
//!
//! Kept free of I/O on purpose: the whole invalidation policy is one
//! function from an envelope to an ordered key list, and the imperative
//! shell in [`client`](crate::client) just walks the list. Tests assert on
//! the returned keys instead of observing cache side effects.

use teamsync_cache::QueryKey;
use teamsync_core::events::EventEnvelope;
use teamsync_core::ids::WorkspaceId;

/// Query keys to invalidate for one decoded event, in issue order.
///
/// Every task mutation invalidates the workspace's task list and its
/// analytics rollup; the project rollup is added only when the payload names
/// an owning project. The event kind is deliberately ignored: creations,
/// updates and deletions all move the same aggregates, and a coarse refetch
/// of cheap list queries beats tracking per-kind deltas.
#[must_use]
pub fn invalidation_targets(workspace: &WorkspaceId, envelope: &EventEnvelope) -> Vec<QueryKey> {
    let mut targets = vec![
        QueryKey::all_tasks(workspace),
        QueryKey::workspace_analytics(workspace),
    ];
    if let Some(project) = envelope.payload.project_id() {
        targets.push(QueryKey::project_analytics(project));
    }
    targets
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
