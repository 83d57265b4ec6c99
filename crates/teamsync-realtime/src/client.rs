//! Subscription lifecycle and event dispatch.
//!
//! A [`SyncClient`] owns at most one live subscription: the push-event
//! channel of the currently active workspace. Pointing it at a different
//! workspace closes the old channel before the new one opens; pointing it
//! at nothing (or running without a configured endpoint) leaves it idle.
//!
//! Dispatch is thin by design. Every decoded event runs through
//! [`invalidation_targets`] and the resulting keys are written to the cache
//! seam, one `invalidate` per key. Whatever owns the cache decides what a
//! stale mark means; this module never reads query state.

use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use teamsync_cache::QueryCache;
use teamsync_core::events::{EventEnvelope, EventKind};
use teamsync_core::ids::WorkspaceId;

use crate::channel::{ChannelWorker, EventChannel, EventFrame, SseChannel};
use crate::config::RealtimeConfig;
use crate::policy::invalidation_targets;

/// Real-time cache synchronization client.
///
/// Construct once per app with the resolved [`RealtimeConfig`] and the
/// shared cache handle, then drive it with [`activate`](Self::activate) as
/// the user's workspace selection changes. Dropping the client closes any
/// open subscription.
pub struct SyncClient {
    config: RealtimeConfig,
    cache: Arc<dyn QueryCache>,
    channel: Arc<dyn EventChannel>,
    subscription: Option<Subscription>,
}

/// The live handle for one open push-event channel.
struct Subscription {
    workspace: WorkspaceId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SyncClient {
    /// Client over the production SSE transport.
    #[must_use]
    pub fn new(config: RealtimeConfig, cache: Arc<dyn QueryCache>) -> Self {
        let channel = Arc::new(SseChannel::new(config.session_cookie.clone()));
        Self::with_channel(config, cache, channel)
    }

    /// Client over an injected channel implementation.
    #[must_use]
    pub fn with_channel(
        config: RealtimeConfig,
        cache: Arc<dyn QueryCache>,
        channel: Arc<dyn EventChannel>,
    ) -> Self {
        Self {
            config,
            cache,
            channel,
            subscription: None,
        }
    }

    /// Point the subscription at `workspace`.
    ///
    /// Any existing subscription is closed first, and the replacement
    /// channel does not open until the old one has fully wound down. With no
    /// workspace selected, or no base endpoint configured, the client goes
    /// idle; both are valid states, not errors.
    ///
    /// Spawns onto the current Tokio runtime.
    pub fn activate(&mut self, workspace: Option<WorkspaceId>) {
        let prior = self.close_current();

        let Some(workspace) = workspace else {
            debug!("no workspace selected, realtime idle");
            return;
        };
        let Some(url) = self.config.subscribe_url(&workspace) else {
            debug!(workspace = %workspace, "no base endpoint configured, realtime idle");
            return;
        };

        let cancel = CancellationToken::new();
        let worker = ChannelWorker::new(
            Arc::clone(&self.channel),
            url,
            self.config.reconnect,
            cancel.clone(),
        );
        let cache = Arc::clone(&self.cache);
        let scope = workspace.clone();
        let task = tokio::spawn(async move {
            // The old channel must be fully gone before the new one opens,
            // so two subscriptions never overlap on the wire.
            if let Some(prior) = prior {
                let _ = prior.await;
            }
            worker
                .run(move |frame| dispatch_frame(&scope, &frame, cache.as_ref()))
                .await;
        });

        info!(workspace = %workspace, "subscribing to workspace events");
        self.subscription = Some(Subscription {
            workspace,
            cancel,
            task,
        });
    }

    /// Close the current subscription, if any. Idempotent.
    pub fn deactivate(&mut self) {
        let _ = self.close_current();
    }

    /// Workspace of the current subscription, when one is open.
    #[must_use]
    pub fn active_workspace(&self) -> Option<&WorkspaceId> {
        self.subscription.as_ref().map(|s| &s.workspace)
    }

    /// Whether a subscription is currently open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Request teardown of the live subscription and hand back its task
    /// handle so a successor can wait for the channel to be released.
    fn close_current(&mut self) -> Option<JoinHandle<()>> {
        let sub = self.subscription.take()?;
        sub.cancel.cancel();
        sub.task.abort();
        info!(workspace = %sub.workspace, "workspace event subscription closed");
        Some(sub.task)
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// Decode one frame and apply the invalidation policy.
///
/// Frames with unrecognized names and frames whose data fails to decode are
/// dropped without touching the subscription; the cache simply learns
/// nothing from them.
fn dispatch_frame(workspace: &WorkspaceId, frame: &EventFrame, cache: &dyn QueryCache) {
    if EventKind::from_name(&frame.name).is_none() {
        return;
    }
    let envelope = match EventEnvelope::decode(&frame.data) {
        Ok(envelope) => envelope,
        Err(error) => {
            counter!("teamsync_envelopes_dropped_total").increment(1);
            debug!(event = %frame.name, error = %error, "dropping undecodable event");
            return;
        }
    };
    counter!("teamsync_events_received_total", "kind" => envelope.kind.as_str()).increment(1);
    for key in invalidation_targets(workspace, &envelope) {
        debug!(key = %key, kind = %envelope.kind, "invalidating query");
        counter!("teamsync_invalidations_total").increment(1);
        cache.invalidate(&key);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
