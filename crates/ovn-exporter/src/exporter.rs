use ovn_monitor::{encode_text, Descriptor, MonitorError, Sample};
use ovn_stubs::IOvnClientStub;
use std::sync::Arc;

use crate::accounting::ErrorCounter;
use crate::collector::Collector;
use crate::config::ExporterConfig;
use crate::metrics::Metrics;
use crate::snapshot::{Clock, SnapshotCache, SystemClock};

/// The scrape-facing side of the exporter.
///
/// Every scrape refreshes the snapshot if it is due and then reads it.
pub struct Exporter {
    metrics: Arc<Metrics>,
    errors: Arc<ErrorCounter>,
    cache: Arc<SnapshotCache>,
}

impl Exporter {
    pub fn new(client: Arc<dyn IOvnClientStub>, config: &ExporterConfig) -> Self {
        Self::with_clock(client, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: Arc<dyn IOvnClientStub>,
        config: &ExporterConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let errors = Arc::new(ErrorCounter::new());
        let collector = Collector::new(
            client,
            Arc::clone(&metrics),
            Arc::clone(&errors),
            config.timeout(),
            config.disable,
        );
        let cache = Arc::new(SnapshotCache::new(collector, clock, config.poll_interval_secs));
        Self {
            metrics,
            errors,
            cache,
        }
    }

    /// Connect to the backend and read the system identity.
    pub async fn initialize(&self) {
        self.cache.collector().initialize().await;
    }

    pub fn describe(&self) -> &[Descriptor] {
        self.metrics.registry().describe()
    }

    pub fn failed_requests(&self) -> u64 {
        self.errors.get()
    }

    /// Samples for one scrape. Never empty: before the first pass has
    /// published anything the four baseline samples are returned with up=0.
    pub async fn collect(&self) -> Vec<Sample> {
        self.cache.refresh_if_stale().await;
        let snapshot = self.cache.read();
        if snapshot.samples.is_empty() {
            return self
                .cache
                .collector()
                .baseline(false, snapshot.next_refresh_at);
        }
        snapshot.samples.clone()
    }

    /// Prometheus text exposition of [`Exporter::collect`].
    pub async fn render(&self) -> Result<String, MonitorError> {
        let samples = self.collect().await;
        encode_text(self.metrics.registry(), &samples)
    }
}
