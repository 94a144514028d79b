//! Core types shared by the OVN exporter crates.
//!
//! Holds the component identities the exporter can query, the records the
//! backend client returns, and the client error type.

pub mod cluster;
pub mod component;
pub mod error;
pub mod records;

pub use cluster::{ClusterPeer, ClusterRole, ClusterStatus};
pub use component::{Component, DatabaseRole, PortKind};
pub use error::{ClientError, Result};
pub use records::{
    Chassis, CoverageCounters, FileInfo, LogEventHistogram, LogicalSwitch, LogicalSwitchPort,
    MemoryCounters, ProcessInfo, SystemInfo,
};
