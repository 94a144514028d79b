//! Prometheus exporter for an OVN control plane.
//!
//! A scrape refreshes a cached snapshot at most once per poll interval. A
//! refresh is one sequential pass over the backend: system info, processes,
//! log files, southbound topology, unixctl counters and raft status, and
//! database port reachability. Failed queries are counted, never fatal.

pub mod accounting;
pub mod cluster;
pub mod collector;
pub mod components;
pub mod config;
pub mod exporter;
pub mod http;
pub mod metrics;
pub mod snapshot;

pub use accounting::ErrorCounter;
pub use cluster::{ClusterAggregator, ClusterState};
pub use collector::{Collector, PassOutcome};
pub use components::{QueryFamily, Toggle, COMPONENT_TABLE};
pub use config::{ConfigError, DisableConfig, ExporterConfig};
pub use exporter::Exporter;
pub use metrics::{MetricId, Metrics};
pub use snapshot::{Clock, ManualClock, Snapshot, SnapshotCache, SystemClock};
