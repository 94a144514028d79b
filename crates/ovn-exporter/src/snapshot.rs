//! Refresh-gated snapshot of the last collection pass.
//!
//! Readers always see a snapshot built by exactly one pass. Refreshes are
//! demand driven and single-flight: of several callers that find the
//! snapshot stale, one runs the pass and the rest wait for it and then see
//! the new snapshot.

use arc_swap::ArcSwap;
use ovn_monitor::Sample;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::collector::Collector;

/// Source of unix timestamps in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub samples: Vec<Sample>,
    /// No refresh happens before this unix timestamp.
    pub next_refresh_at: i64,
    pub up: bool,
}

pub struct SnapshotCache {
    collector: Collector,
    clock: Arc<dyn Clock>,
    poll_interval: i64,
    current: ArcSwap<Snapshot>,
    refresh_gate: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(collector: Collector, clock: Arc<dyn Clock>, poll_interval_secs: u64) -> Self {
        Self {
            collector,
            clock,
            poll_interval: i64::try_from(poll_interval_secs).unwrap_or(i64::MAX),
            current: ArcSwap::from_pointee(Snapshot::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// The current snapshot. Never touches the backend.
    pub fn read(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    fn is_stale(&self) -> bool {
        self.clock.now() >= self.current.load().next_refresh_at
    }

    /// Run a collection pass if the snapshot is due.
    ///
    /// The pass runs on its own task, so it completes and publishes even if
    /// the caller is dropped while waiting.
    pub async fn refresh_if_stale(self: &Arc<Self>) {
        if !self.is_stale() {
            return;
        }
        let this = Arc::clone(self);
        if let Err(e) = tokio::spawn(async move { this.refresh_locked().await }).await {
            error!(error = %e, "Refresh task failed");
        }
    }

    /// Returns whether this call ran the pass.
    async fn refresh_locked(&self) -> bool {
        let _gate = self.refresh_gate.lock().await;
        if !self.is_stale() {
            debug!("Snapshot refreshed by a concurrent caller");
            return false;
        }

        let outcome = self.collector.collect().await;
        let next_refresh_at = self.clock.now().saturating_add(self.poll_interval);
        let mut samples = outcome.samples;
        samples.extend(self.collector.baseline(outcome.up, next_refresh_at));
        debug!(samples = samples.len(), up = outcome.up, next_refresh_at, "Publishing snapshot");
        self.current.store(Arc::new(Snapshot {
            samples,
            next_refresh_at,
            up: outcome.up,
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::ErrorCounter;
    use crate::config::DisableConfig;
    use crate::metrics::Metrics;
    use ovn_stubs::MockOvnClientStub;
    use std::time::Duration;

    fn cache(mock: &Arc<MockOvnClientStub>, clock: Arc<ManualClock>) -> Arc<SnapshotCache> {
        let collector = Collector::new(
            mock.clone(),
            Arc::new(Metrics::new()),
            Arc::new(ErrorCounter::new()),
            Duration::from_secs(2),
            DisableConfig::default(),
        );
        Arc::new(SnapshotCache::new(collector, clock, 15))
    }

    #[tokio::test]
    async fn test_empty_before_first_refresh() {
        let mock = MockOvnClientStub::new().into_arc();
        let cache = cache(&mock, Arc::new(ManualClock::new(0)));
        let snap = cache.read();
        assert!(snap.samples.is_empty());
        assert!(!snap.up);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_run_one_pass() {
        let mock = MockOvnClientStub::new().into_arc();
        let cache = cache(&mock, Arc::new(ManualClock::new(100)));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.refresh_if_stale().await }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(mock.call_count("get_system_info"), 1);
        assert_eq!(mock.call_count("get_chassis"), 1);
        assert_eq!(cache.read().next_refresh_at, 115);
    }

    #[tokio::test]
    async fn test_reads_are_identical_between_refreshes() {
        let mock = MockOvnClientStub::new().into_arc();
        let cache = cache(&mock, Arc::new(ManualClock::new(0)));
        cache.refresh_if_stale().await;
        let a = cache.read();
        let b = cache.read();
        cache.refresh_if_stale().await;
        let c = cache.read();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);
    }

    #[tokio::test]
    async fn test_refresh_gated_by_poll_interval() {
        let mock = MockOvnClientStub::new().into_arc();
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(&mock, Arc::clone(&clock));

        cache.refresh_if_stale().await;
        assert_eq!(mock.call_count("get_system_info"), 1);
        mock.clear_calls();

        for t in 1..15 {
            clock.set(t);
            cache.refresh_if_stale().await;
            assert!(mock.calls().is_empty(), "backend queried at t={}", t);
        }

        clock.set(15);
        cache.refresh_if_stale().await;
        assert_eq!(mock.call_count("get_system_info"), 1);
        assert_eq!(cache.read().next_refresh_at, 30);
    }

    #[tokio::test]
    async fn test_total_failure_leaves_baseline_only() {
        let mock = MockOvnClientStub::new().into_arc();
        mock.fail_everything();
        let cache = cache(&mock, Arc::new(ManualClock::new(1000)));
        cache.refresh_if_stale().await;

        let snap = cache.read();
        let names: Vec<&str> = snap.samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ovn_up", "ovn_info", "ovn_failed_req_count", "ovn_next_poll"]);
        assert_eq!(snap.samples[0].value, 0.0);
        assert_eq!(snap.samples[3].value, 1015.0);
        assert!(!snap.up);
    }

    #[tokio::test]
    async fn test_error_counter_survives_refreshes() {
        let mock = MockOvnClientStub::new().into_arc();
        mock.on_chassis(|_| Err(ovn_types::ClientError::Timeout));
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(&mock, Arc::clone(&clock));
        let failures = |cache: &SnapshotCache| {
            cache
                .read()
                .samples
                .iter()
                .find(|s| s.name == "ovn_failed_req_count")
                .map(|s| s.value)
        };

        cache.refresh_if_stale().await;
        assert_eq!(failures(&cache), Some(1.0));
        clock.advance(15);
        cache.refresh_if_stale().await;
        assert_eq!(failures(&cache), Some(2.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_caller_does_not_abort_refresh() {
        let mock = MockOvnClientStub::new().into_arc();
        let gate = mock.gate_system_info();
        let cache = cache(&mock, Arc::new(ManualClock::new(100)));

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh_if_stale().await })
        };
        while mock.call_count("get_system_info") == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let second = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh_if_stale().await })
        };
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        // the second caller waits for the pass that is still in flight
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!second.is_finished());
        assert!(cache.read().samples.is_empty());

        gate.notify_one();
        second.await.unwrap();
        let snap = cache.read();
        assert_eq!(snap.next_refresh_at, 115);
        assert!(snap.up);
        assert!(!snap.samples.is_empty());
        assert_eq!(mock.call_count("get_system_info"), 1);
    }
}
