//! # teamsync-tail
//!
//! Diagnostic tail binary — subscribes to one workspace's push-event stream
//! and logs every cache invalidation those events would produce. Useful for
//! checking that a deployment emits task events and that the client maps
//! them to the expected query keys.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use clap::Parser;

use teamsync_cache::{QueryCache, QueryKey};
use teamsync_core::ids::WorkspaceId;
use teamsync_realtime::{RealtimeConfig, SyncClient};

/// Workspace event tail.
#[derive(Parser, Debug)]
#[command(
    name = "teamsync-tail",
    about = "Tail a workspace's push events as cache invalidations"
)]
struct Cli {
    /// Workspace to subscribe to.
    #[arg(long)]
    workspace: String,

    /// API base URL (falls back to `TEAMSYNC_API_BASE_URL`).
    #[arg(long)]
    base_url: Option<String>,

    /// Session cookie sent with the subscription request (falls back to
    /// `TEAMSYNC_SESSION_COOKIE`).
    #[arg(long)]
    session_cookie: Option<String>,

    /// Minimum log level when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Cache seam that logs instead of storing.
///
/// The subscription drives this exactly as it would a real query cache; the
/// running total makes a quiet stream easy to spot.
struct TailCache {
    invalidations: AtomicU64,
}

impl TailCache {
    fn new() -> Self {
        Self {
            invalidations: AtomicU64::new(0),
        }
    }

    fn count(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }
}

impl QueryCache for TailCache {
    fn invalidate(&self, key: &QueryKey) {
        let total = self.invalidations.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(key = %key, total, "invalidate");
    }
}

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over the CLI level when set.
fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

/// Environment config with CLI flags layered on top.
fn resolve_config(args: &Cli) -> RealtimeConfig {
    let mut config = RealtimeConfig::from_env();
    if let Some(ref base) = args.base_url {
        config.base_url = Some(base.clone());
    }
    if let Some(ref cookie) = args.session_cookie {
        config.session_cookie = Some(cookie.clone());
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_subscriber(&args.log_level);

    let config = resolve_config(&args);
    let base = config
        .base_url
        .clone()
        .context("no API base URL: pass --base-url or set TEAMSYNC_API_BASE_URL")?;

    let cache = Arc::new(TailCache::new());
    let mut client = SyncClient::new(config, Arc::clone(&cache) as Arc<dyn QueryCache>);

    let workspace = WorkspaceId::from(args.workspace.as_str());
    tracing::info!(workspace = %workspace, base = %base, "tailing workspace events");
    client.activate(Some(workspace));

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!(invalidations = cache.count(), "shutting down");
    client.deactivate();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_requires_workspace() {
        let result = Cli::try_parse_from(["teamsync-tail"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_workspace_only() {
        let cli = Cli::parse_from(["teamsync-tail", "--workspace", "w1"]);
        assert_eq!(cli.workspace, "w1");
        assert_eq!(cli.base_url, None);
        assert_eq!(cli.session_cookie, None);
    }

    #[test]
    fn cli_default_log_level() {
        let cli = Cli::parse_from(["teamsync-tail", "--workspace", "w1"]);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn cli_base_url_flag() {
        let cli = Cli::parse_from([
            "teamsync-tail",
            "--workspace",
            "w1",
            "--base-url",
            "https://api.example.com",
        ]);
        assert_eq!(cli.base_url.as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn cli_flags_override_env_config() {
        let cli = Cli::parse_from([
            "teamsync-tail",
            "--workspace",
            "w1",
            "--base-url",
            "https://cli.example.com",
            "--session-cookie",
            "session=xyz",
        ]);
        let config = resolve_config(&cli);
        assert_eq!(config.base_url.as_deref(), Some("https://cli.example.com"));
        assert_eq!(config.session_cookie.as_deref(), Some("session=xyz"));
    }

    #[test]
    fn tail_cache_counts_invalidations() {
        let cache = TailCache::new();
        assert_eq!(cache.count(), 0);

        let key = QueryKey::all_tasks(&WorkspaceId::from("w1"));
        cache.invalidate(&key);
        cache.invalidate(&key);
        assert_eq!(cache.count(), 2);
    }

    #[test]
    fn init_subscriber_does_not_panic() {
        // Multiple calls should be safe (no-op after first)
        init_subscriber("warn");
        init_subscriber("debug");
    }
}
