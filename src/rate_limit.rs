//! Sliding-window-log rate limiter.
//!
//! Every admitted request is timestamped into its client's window. A client is
//! admitted while fewer than `max_requests` timestamps are younger than the
//! window duration.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;

/// Immutable limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    window_ms: u64,
    max_requests: usize,
    idle_retention_ms: u64,
}

impl LimiterConfig {
    pub const DEFAULT_WINDOW_MS: u64 = 10_000;
    pub const DEFAULT_MAX_REQUESTS: usize = 5;
    pub const DEFAULT_IDLE_RETENTION_MS: u64 = 60_000;

    pub fn new(window_ms: u64, max_requests: usize) -> Result<Self, ConfigError> {
        if window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if max_requests == 0 {
            return Err(ConfigError::ZeroQuota);
        }

        Ok(Self {
            window_ms,
            max_requests,
            idle_retention_ms: Self::DEFAULT_IDLE_RETENTION_MS,
        })
    }

    /// How long a client with no live timestamps is kept before [`SlidingWindowLimiter::prune_idle`] drops it.
    pub fn with_idle_retention(mut self, idle_retention_ms: u64) -> Self {
        self.idle_retention_ms = idle_retention_ms;
        self
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn idle_retention_ms(&self) -> u64 {
        self.idle_retention_ms
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            window_ms: Self::DEFAULT_WINDOW_MS,
            max_requests: Self::DEFAULT_MAX_REQUESTS,
            idle_retention_ms: Self::DEFAULT_IDLE_RETENTION_MS,
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request recorded; `current_count` includes it.
    Admitted { current_count: usize },
    /// Quota used up; the oldest live entry expires in `retry_after_ms`.
    Rejected { retry_after_ms: u64 },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted { .. })
    }
}

/// Per-client sliding-window limiter, safe to share between request handlers.
pub struct SlidingWindowLimiter {
    config: LimiterConfig,
    clock: Arc<dyn Clock>,
    // client key -> admitted timestamps, oldest first
    windows: DashMap<String, VecDeque<u64>>,
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("config", &self.config)
            .field("clients", &self.windows.len())
            .finish()
    }
}

impl SlidingWindowLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: DashMap::new(),
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Number of client keys currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Checks `client_key` against its quota and records the request if admitted.
    ///
    /// Stale timestamps are swept from the front of the window first, so the
    /// decision only ever sees requests from the trailing window.
    pub fn check_and_record(&self, client_key: &str) -> Decision {
        // shard write lock held until `window` drops
        let mut window = self.windows.entry(client_key.to_owned()).or_default();

        // never let a clock step backwards break ordering
        let now = match window.back() {
            Some(&newest) => self.clock.now_millis().max(newest),
            None => self.clock.now_millis(),
        };

        self.evict_expired(&mut window, now);

        if window.len() < self.config.max_requests {
            window.push_back(now);
            return Decision::Admitted {
                current_count: window.len(),
            };
        }

        // len >= max_requests > 0, so there is a front entry
        let oldest = window.front().copied().unwrap_or(now);
        Decision::Rejected {
            retry_after_ms: self.config.window_ms.saturating_sub(now - oldest),
        }
    }

    // Drops every entry that fell out of the window as of `now`.
    fn evict_expired(&self, window: &mut VecDeque<u64>, now: u64) {
        while let Some(&oldest) = window.front() {
            if now.saturating_sub(oldest) > self.config.window_ms {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Removes clients whose newest request is older than the window plus the idle retention.
    /// Returns the number of removed clients.
    pub fn prune_idle(&self) -> usize {
        let now = self.clock.now_millis();
        let horizon = self
            .config
            .window_ms
            .saturating_add(self.config.idle_retention_ms);

        let before = self.windows.len();
        self.windows.retain(|_, window| match window.back() {
            Some(&newest) => now.saturating_sub(newest) <= horizon,
            None => false,
        });
        before.saturating_sub(self.windows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const A: &str = "127.0.0.1";
    const B: &str = "10.0.0.2";

    fn limiter(window_ms: u64, max: usize) -> (SlidingWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let config = LimiterConfig::new(window_ms, max).unwrap();
        (SlidingWindowLimiter::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn config_rejects_zero_values() {
        assert_eq!(LimiterConfig::new(0, 5), Err(ConfigError::ZeroWindow));
        assert_eq!(LimiterConfig::new(10_000, 0), Err(ConfigError::ZeroQuota));

        let config = LimiterConfig::default();
        assert_eq!(config.window_ms(), 10_000);
        assert_eq!(config.max_requests(), 5);
    }

    #[test]
    fn unseen_key_is_admitted_with_count_one() {
        let limiter = SlidingWindowLimiter::new(LimiterConfig::default());
        assert_eq!(
            limiter.check_and_record("never-seen"),
            Decision::Admitted { current_count: 1 }
        );
    }

    #[test]
    fn five_then_reject_then_recover() {
        let (limiter, clock) = limiter(10_000, 5);

        for expected in 1..=5 {
            assert_eq!(
                limiter.check_and_record(A),
                Decision::Admitted {
                    current_count: expected
                }
            );
        }
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Rejected {
                retry_after_ms: 10_000
            }
        );

        clock.advance(10_001);
        // all five expired at once with the full sweep
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Admitted { current_count: 1 }
        );
    }

    #[test]
    fn quota_holds_within_one_window() {
        let (limiter, clock) = limiter(1_000, 3);

        let admitted = (0..50)
            .filter(|_| {
                clock.advance(10);
                limiter.check_and_record(A).is_admitted()
            })
            .count();
        // 50 calls span 500ms, less than one window
        assert_eq!(admitted, 3);
    }

    #[test]
    fn entry_at_exact_window_edge_is_still_live() {
        let (limiter, clock) = limiter(1_000, 1);

        assert!(limiter.check_and_record(A).is_admitted());

        clock.advance(1_000);
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Rejected { retry_after_ms: 0 }
        );

        clock.advance(1);
        assert!(limiter.check_and_record(A).is_admitted());
    }

    #[test]
    fn sliding_not_fixed_buckets() {
        let (limiter, clock) = limiter(1_000, 2);

        assert!(limiter.check_and_record(A).is_admitted()); // t=0
        clock.advance(600);
        assert!(limiter.check_and_record(A).is_admitted()); // t=600
        clock.advance(401);
        // t=1001: first entry expired, second still live
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Admitted { current_count: 2 }
        );
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Rejected {
                retry_after_ms: 1_000 - 401
            }
        );
    }

    #[test]
    fn retry_estimate_decreases_over_time() {
        let (limiter, clock) = limiter(10_000, 2);
        limiter.check_and_record(A);
        limiter.check_and_record(A);

        let mut last = u64::MAX;
        for _ in 0..9 {
            match limiter.check_and_record(A) {
                Decision::Rejected { retry_after_ms } => {
                    assert!(retry_after_ms < last);
                    last = retry_after_ms;
                }
                Decision::Admitted { .. } => panic!("admitted before the window moved"),
            }
            clock.advance(1_000);
        }

        clock.advance(1_001);
        assert!(limiter.check_and_record(A).is_admitted());
    }

    #[test]
    fn clients_are_isolated() {
        let (limiter, _clock) = limiter(10_000, 5);

        for _ in 0..5 {
            assert!(limiter.check_and_record(A).is_admitted());
            assert!(limiter.check_and_record(B).is_admitted());
        }
        assert!(!limiter.check_and_record(A).is_admitted());
        assert!(!limiter.check_and_record(B).is_admitted());
        assert!(
            limiter.check_and_record("172.16.0.9").is_admitted(),
            "a third client starts with a fresh window"
        );
    }

    #[test]
    fn backwards_clock_does_not_reorder_window() {
        let (limiter, clock) = limiter(1_000, 2);

        assert!(limiter.check_and_record(A).is_admitted());
        clock.set(1_000_000 - 5_000);
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Admitted { current_count: 2 }
        );
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Rejected {
                retry_after_ms: 1_000
            }
        );
    }

    #[test]
    fn prune_drops_only_idle_clients() {
        let clock = Arc::new(ManualClock::new(0));
        let config = LimiterConfig::new(1_000, 5)
            .unwrap()
            .with_idle_retention(2_000);
        let limiter = SlidingWindowLimiter::with_clock(config, clock.clone());

        limiter.check_and_record(A);
        clock.advance(2_500);
        limiter.check_and_record(B);
        assert_eq!(limiter.tracked_clients(), 2);

        clock.advance(600);
        // A idle for 3100ms > 1000 + 2000, B for 600ms
        assert_eq!(limiter.prune_idle(), 1);
        assert_eq!(limiter.tracked_clients(), 1);

        // pruned client comes back with a fresh window
        assert_eq!(
            limiter.check_and_record(A),
            Decision::Admitted { current_count: 1 }
        );
    }

    #[test]
    fn concurrent_checks_respect_quota() {
        let limiter = Arc::new(SlidingWindowLimiter::new(
            LimiterConfig::new(60_000, 25).unwrap(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.check_and_record(A).is_admitted())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 25);
    }
}
