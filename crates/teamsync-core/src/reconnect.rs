//! Reconnect policy and backoff calculation.
//!
//! Portable, sync-only math for the push-channel reconnect loop. The actual
//! async loop lives in `teamsync-realtime` (which has access to tokio); this
//! module only decides *how long to wait* before attempt N:
//!
//! - [`ReconnectPolicy`]: delay parameters (initial, cap, jitter)
//! - [`ReconnectPolicy::delay_ms_with_random`]: exponential backoff with
//!   explicit jitter input, for deterministic tests
//!
//! There is no attempt cap. The channel reconnects for as long as the
//! subscription is wanted, matching browser `EventSource` behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default delay before the first reconnect attempt, in milliseconds.
///
/// Matches the ~3s default browsers use for `EventSource` reconnection.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 3_000;
/// Default maximum delay between attempts in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Delay parameters for push-channel reconnection.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt in ms (default: 3000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts in ms (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.2).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl ReconnectPolicy {
    /// Backoff delay for a zero-based attempt index, with explicit randomness.
    ///
    /// Formula: `min(max_delay, initial_delay * 2^attempt) * (1 + (random*2-1)
    /// * jitter_factor)`, so `random` in `[0.0, 1.0)` maps to a symmetric
    /// ±`jitter_factor` band around the exponential value.
    #[must_use]
    pub fn delay_ms_with_random(&self, attempt: u32, random: f64) -> u64 {
        let exponential = self.initial_delay_ms.saturating_mul(1u64 << attempt.min(31));
        let capped = exponential.min(self.max_delay_ms);

        let jitter = 1.0 + (random * 2.0 - 1.0) * self.jitter_factor;
        let with_jitter = (capped as f64) * jitter;

        with_jitter.round().max(0.0) as u64
    }

    /// Backoff delay for a zero-based attempt index, jittered with a fresh
    /// random sample.
    #[must_use]
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        self.delay_ms_with_random(attempt, rand::random::<f64>())
    }

    /// [`Self::delay_ms`] as a [`Duration`], the form the async loop sleeps on.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms(attempt))
    }
}

/// Parse an SSE `retry:` field value into a delay override.
///
/// Servers may push the reconnection delay they want clients to use. The
/// value is a base-10 integer of milliseconds; anything else is ignored,
/// per the SSE processing model.
#[must_use]
pub fn parse_retry_hint(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- ReconnectPolicy --

    #[test]
    fn policy_defaults() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.initial_delay_ms, 3_000);
        assert_eq!(policy.max_delay_ms, 30_000);
        assert!((policy.jitter_factor - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn policy_serde_defaults() {
        let policy: ReconnectPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.initial_delay_ms, 3_000);
        assert_eq!(policy.max_delay_ms, 30_000);
    }

    #[test]
    fn policy_serde_roundtrip() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            jitter_factor: 0.1,
        };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("initialDelayMs"));
        let back: ReconnectPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back.initial_delay_ms, 500);
        assert_eq!(back.max_delay_ms, 10_000);
    }

    // -- delay_ms_with_random --

    #[test]
    fn backoff_exponential_growth() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.delay_ms_with_random(0, 0.5), 1000);
        assert_eq!(policy.delay_ms_with_random(1, 0.5), 2000);
        assert_eq!(policy.delay_ms_with_random(2, 0.5), 4000);
        assert_eq!(policy.delay_ms_with_random(3, 0.5), 8000);
    }

    #[test]
    fn backoff_caps_at_max() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.delay_ms_with_random(10, 0.5), 60_000);
    }

    #[test]
    fn backoff_random_zero_is_lower_band() {
        // random = 0.0 → factor = 1 - 0.2 = 0.8
        let policy = ReconnectPolicy {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
        };
        assert_eq!(policy.delay_ms_with_random(0, 0.0), 800);
    }

    #[test]
    fn backoff_random_half_is_exact() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
        };
        assert_eq!(policy.delay_ms_with_random(0, 0.5), 1000);
    }

    #[test]
    fn backoff_random_one_is_upper_band() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
        };
        assert_eq!(policy.delay_ms_with_random(0, 1.0), 1200);
    }

    #[test]
    fn backoff_high_attempt_no_overflow() {
        let policy = ReconnectPolicy::default();
        let delay = policy.delay_ms_with_random(100, 0.5);
        assert_eq!(delay, policy.max_delay_ms);
    }

    #[test]
    fn backoff_sampled_stays_in_band() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
        };
        for attempt in 0..5 {
            let delay = policy.delay_ms(attempt);
            let base = 1000u64 << attempt;
            assert!(delay >= base * 8 / 10);
            assert!(delay <= base * 12 / 10);
        }
    }

    // -- parse_retry_hint --

    #[test]
    fn retry_hint_parses_integer_ms() {
        assert_eq!(parse_retry_hint("3000"), Some(3000));
        assert_eq!(parse_retry_hint("0"), Some(0));
        assert_eq!(parse_retry_hint(" 250 "), Some(250));
    }

    #[test]
    fn retry_hint_rejects_non_integers() {
        assert_eq!(parse_retry_hint(""), None);
        assert_eq!(parse_retry_hint("-5"), None);
        assert_eq!(parse_retry_hint("3.5"), None);
        assert_eq!(parse_retry_hint("soon"), None);
    }
}
