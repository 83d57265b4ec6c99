//! Client configuration.
//!
//! A [`RealtimeConfig`] is resolved once at startup and passed to
//! [`SyncClient::new`](crate::client::SyncClient::new) as a value. Nothing in
//! this crate reads configuration ambiently; [`RealtimeConfig::from_env`]
//! exists for binaries that want the conventional environment variables.
//!
//! An absent base URL is a valid configuration: it disables the realtime
//! subsystem entirely, and activation becomes a silent no-op.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use teamsync_core::ids::WorkspaceId;
use teamsync_core::reconnect::ReconnectPolicy;

/// Environment variable naming the API base URL.
pub const ENV_BASE_URL: &str = "TEAMSYNC_API_BASE_URL";
/// Environment variable carrying the session cookie sent with the
/// subscription request.
pub const ENV_SESSION_COOKIE: &str = "TEAMSYNC_SESSION_COOKIE";

/// Characters percent-encoded when an ID travels as a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Configuration for the realtime subsystem.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeConfig {
    /// API base endpoint (`https://api.example.com`). `None` disables the
    /// subsystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Session cookie included with the subscription request, when the
    /// deployment authenticates the event stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    /// Reconnect delay parameters for the push channel.
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

impl RealtimeConfig {
    /// Config pointing at the given base endpoint, defaults elsewhere.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Config resolved from [`ENV_BASE_URL`] and [`ENV_SESSION_COOKIE`].
    ///
    /// Unset or empty variables are treated as absent.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env_value(ENV_BASE_URL),
            session_cookie: env_value(ENV_SESSION_COOKIE),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Attach a session cookie.
    #[must_use]
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Subscription URL for a workspace's event stream, or `None` when no
    /// base endpoint is configured.
    ///
    /// The workspace ID is percent-encoded as a single path segment, so IDs
    /// containing separators cannot escape into the route.
    #[must_use]
    pub fn subscribe_url(&self, workspace: &WorkspaceId) -> Option<String> {
        let base = self.base_url.as_deref()?.trim_end_matches('/');
        let segment = utf8_percent_encode(workspace.as_str(), PATH_SEGMENT);
        Some(format!("{base}/events/workspace/{segment}"))
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
