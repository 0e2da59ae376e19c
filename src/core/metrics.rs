//! Bootstrap metrics for observability
//!
//! Counters describing how much work went through the bootstrap window:
//! deferred and replayed events, replay failures, worker churn and
//! surrogate redirection.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for bootstrap observability
///
/// # Example
///
/// ```
/// use rust_bootstrap_logger::BootstrapMetrics;
///
/// let metrics = BootstrapMetrics::new();
///
/// metrics.record_deferred();
/// metrics.record_replayed(1);
///
/// assert_eq!(metrics.events_deferred(), 1);
/// assert_eq!(metrics.pending_replay(), 0);
/// ```
#[derive(Debug)]
pub struct BootstrapMetrics {
    /// Calls captured as deferred events during the bootstrap window
    events_deferred: AtomicU64,

    /// Deferred events delivered to a real logger
    events_replayed: AtomicU64,

    /// Deferred events whose replay failed
    replay_failures: AtomicU64,

    /// Dispatcher tasks that returned an error or panicked
    task_failures: AtomicU64,

    /// Replay worker threads started
    workers_spawned: AtomicU64,

    /// Surrogate loggers handed out
    surrogates_created: AtomicU64,

    /// Surrogate loggers swapped for real loggers
    surrogates_redirected: AtomicU64,
}

impl BootstrapMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            events_deferred: AtomicU64::new(0),
            events_replayed: AtomicU64::new(0),
            replay_failures: AtomicU64::new(0),
            task_failures: AtomicU64::new(0),
            workers_spawned: AtomicU64::new(0),
            surrogates_created: AtomicU64::new(0),
            surrogates_redirected: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn events_deferred(&self) -> u64 {
        self.events_deferred.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_replayed(&self) -> u64 {
        self.events_replayed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn replay_failures(&self) -> u64 {
        self.replay_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn task_failures(&self) -> u64 {
        self.task_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn workers_spawned(&self) -> u64 {
        self.workers_spawned.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn surrogates_created(&self) -> u64 {
        self.surrogates_created.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn surrogates_redirected(&self) -> u64 {
        self.surrogates_redirected.load(Ordering::Relaxed)
    }

    /// Record a deferred event
    #[inline]
    pub fn record_deferred(&self) -> u64 {
        self.events_deferred.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `count` replayed events
    #[inline]
    pub fn record_replayed(&self, count: u64) -> u64 {
        self.events_replayed.fetch_add(count, Ordering::Relaxed)
    }

    /// Record `count` failed replays
    #[inline]
    pub fn record_replay_failures(&self, count: u64) -> u64 {
        self.replay_failures.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_task_failure(&self) -> u64 {
        self.task_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_worker_spawned(&self) -> u64 {
        self.workers_spawned.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_surrogate_created(&self) -> u64 {
        self.surrogates_created.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_surrogate_redirected(&self) -> u64 {
        self.surrogates_redirected.fetch_add(1, Ordering::Relaxed)
    }

    /// Deferred events not yet accounted for by a replay or a failure
    pub fn pending_replay(&self) -> u64 {
        self.events_deferred()
            .saturating_sub(self.events_replayed() + self.replay_failures())
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.events_deferred.store(0, Ordering::Relaxed);
        self.events_replayed.store(0, Ordering::Relaxed);
        self.replay_failures.store(0, Ordering::Relaxed);
        self.task_failures.store(0, Ordering::Relaxed);
        self.workers_spawned.store(0, Ordering::Relaxed);
        self.surrogates_created.store(0, Ordering::Relaxed);
        self.surrogates_redirected.store(0, Ordering::Relaxed);
    }
}

impl Default for BootstrapMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BootstrapMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            events_deferred: AtomicU64::new(self.events_deferred()),
            events_replayed: AtomicU64::new(self.events_replayed()),
            replay_failures: AtomicU64::new(self.replay_failures()),
            task_failures: AtomicU64::new(self.task_failures()),
            workers_spawned: AtomicU64::new(self.workers_spawned()),
            surrogates_created: AtomicU64::new(self.surrogates_created()),
            surrogates_redirected: AtomicU64::new(self.surrogates_redirected()),
        }
    }
}
