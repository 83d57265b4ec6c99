//! Push-event channel: the SSE transport and its reconnect loop.
//!
//! [`EventChannel`] is the seam between the subscription lifecycle and the
//! wire. One `open` call is one connection attempt, yielding a stream of
//! [`EventFrame`]s until the connection drops. [`SseChannel`] is the
//! production implementation over `reqwest` + `eventsource-stream`; tests
//! substitute scripted channels.
//!
//! [`ChannelWorker`] owns the reconnect loop around a channel, mirroring
//! browser `EventSource` behavior:
//!
//! - reconnect after transport interruptions and server EOF, honoring the
//!   most recent `retry:` hint from the server (otherwise jittered
//!   exponential backoff)
//! - resume with a `Last-Event-ID` header carrying the last seen frame id
//! - fail the subscription permanently on a non-retryable rejection, and
//!   stop immediately on cancellation
//!
//! Reconnecting triggers no cache refresh. Mutations broadcast while the
//! connection was down stay invisible until the next organic event or a
//! manual refetch; the UI reads stale data for that window. Deliberate:
//! invalidation happens only on concrete observed events, never on bare
//! connectivity transitions.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use teamsync_core::reconnect::ReconnectPolicy;

/// Result type alias for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Boxed stream of frames produced by one [`EventChannel::open`] call.
pub type EventFrameStream = Pin<Box<dyn Stream<Item = ChannelResult<EventFrame>> + Send>>;

/// Errors that can occur while opening or consuming a push channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed before the stream was established.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server refused the subscription with an error status.
    #[error("subscribe rejected ({status})")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The established stream stopped being consumable.
    #[error("transport error: {message}")]
    Transport {
        /// Error description.
        message: String,
    },
}

impl ChannelError {
    /// Whether the worker should reconnect after this error.
    ///
    /// Connectivity faults and 408/429/5xx rejections are worth retrying;
    /// any other rejection (bad route, revoked session) fails the
    /// subscription permanently, the way `EventSource` gives up on a
    /// response it cannot treat as an event stream.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Rejected { status } => {
                matches!(status, 408 | 429) || (500..=599).contains(status)
            }
            Self::Transport { .. } => true,
        }
    }
}

/// One received named event, before JSON decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventFrame {
    /// SSE event name (`task.updated`). Servers that omit the field send
    /// `message`, per the SSE processing model.
    pub name: String,
    /// Raw data payload, expected to be a JSON envelope.
    pub data: String,
    /// Frame id for `Last-Event-ID` resumption, when the server sends one.
    pub id: Option<String>,
    /// Server-pushed reconnection delay override in milliseconds.
    pub retry_ms: Option<u64>,
}

/// One connection attempt to a push-event endpoint.
///
/// The worker re-calls [`open`](Self::open) on every reconnect, passing the
/// latest resume position.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Open the subscription and return its frame stream.
    async fn open(
        &self,
        url: &str,
        last_event_id: Option<&str>,
    ) -> ChannelResult<EventFrameStream>;
}

// ─────────────────────────────────────────────────────────────────────────────
// SseChannel — reqwest + eventsource-stream transport
// ─────────────────────────────────────────────────────────────────────────────

/// Production [`EventChannel`]: a persistent HTTP GET decoded as SSE.
pub struct SseChannel {
    client: reqwest::Client,
    session_cookie: Option<String>,
}

impl SseChannel {
    /// Channel with a fresh HTTP client, optionally sending a session cookie
    /// on every connection attempt.
    #[must_use]
    pub fn new(session_cookie: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), session_cookie)
    }

    /// Channel over an injected HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, session_cookie: Option<String>) -> Self {
        Self {
            client,
            session_cookie,
        }
    }
}

#[async_trait]
impl EventChannel for SseChannel {
    async fn open(
        &self,
        url: &str,
        last_event_id: Option<&str>,
    ) -> ChannelResult<EventFrameStream> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(cookie) = &self.session_cookie {
            request = request.header(reqwest::header::COOKIE, cookie.clone());
        }
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
            });
        }

        let frames = response.bytes_stream().eventsource().map(|item| {
            item.map(|event| {
                let id = if event.id.is_empty() {
                    None
                } else {
                    Some(event.id)
                };
                EventFrame {
                    name: event.event,
                    data: event.data,
                    id,
                    retry_ms: event.retry.map(|d| d.as_millis() as u64),
                }
            })
            .map_err(|error| ChannelError::Transport {
                message: error.to_string(),
            })
        });
        Ok(Box::pin(frames))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChannelWorker — reconnect loop
// ─────────────────────────────────────────────────────────────────────────────

/// Reconnect loop around an [`EventChannel`].
///
/// Runs until cancelled or until the server rejects the subscription with a
/// non-retryable status. Frames are handed to the caller's closure in
/// arrival order; ordering across reconnects is not guaranteed by the
/// server and not promised here.
pub struct ChannelWorker {
    channel: Arc<dyn EventChannel>,
    url: String,
    policy: ReconnectPolicy,
    cancel: CancellationToken,
}

impl ChannelWorker {
    /// Worker for one subscription URL.
    #[must_use]
    pub fn new(
        channel: Arc<dyn EventChannel>,
        url: String,
        policy: ReconnectPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            channel,
            url,
            policy,
            cancel,
        }
    }

    /// Consume the channel until shutdown, invoking `on_frame` per frame.
    ///
    /// Cancellation is checked with priority at every await point, so a
    /// frame that arrives after cancellation was requested is never
    /// dispatched.
    pub async fn run<F>(self, mut on_frame: F)
    where
        F: FnMut(EventFrame) + Send,
    {
        let mut attempt: u32 = 0;
        let mut last_event_id: Option<String> = None;
        let mut retry_hint_ms: Option<u64> = None;

        loop {
            let opened = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                result = self.channel.open(&self.url, last_event_id.as_deref()) => result,
            };

            match opened {
                Ok(mut frames) => {
                    attempt = 0;
                    debug!(url = %self.url, "event channel open");
                    loop {
                        let item = tokio::select! {
                            biased;
                            () = self.cancel.cancelled() => return,
                            item = frames.next() => item,
                        };
                        match item {
                            Some(Ok(frame)) => {
                                if let Some(id) = &frame.id {
                                    last_event_id = Some(id.clone());
                                }
                                if let Some(hint) = frame.retry_ms {
                                    retry_hint_ms = Some(hint);
                                }
                                on_frame(frame);
                            }
                            Some(Err(error)) => {
                                debug!(error = %error, "event channel interrupted");
                                break;
                            }
                            None => {
                                debug!(url = %self.url, "event channel ended by server");
                                break;
                            }
                        }
                    }
                }
                Err(error) if !error.is_retryable() => {
                    warn!(url = %self.url, error = %error, "subscription failed permanently");
                    return;
                }
                Err(error) => {
                    debug!(error = %error, "subscribe attempt failed");
                }
            }

            // Reconnect without refreshing anything: mutations missed while
            // disconnected surface only through later events or a manual
            // refetch. The staleness window is accepted.
            counter!("teamsync_channel_reconnects_total").increment(1);
            let delay = retry_hint_ms.map_or_else(|| self.policy.delay(attempt), Duration::from_millis);
            attempt = attempt.saturating_add(1);
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
