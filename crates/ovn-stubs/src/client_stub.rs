use async_trait::async_trait;
use ovn_types::{
    Chassis, ClusterStatus, Component, CoverageCounters, FileInfo, LogEventHistogram,
    LogicalSwitch, LogicalSwitchPort, MemoryCounters, PortKind, ProcessInfo, Result, SystemInfo,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Queries against the OVS/OVN databases, their control sockets, and the
/// local host.
///
/// Every method is an independent call; callers apply their own timeout.
#[async_trait]
pub trait IOvnClientStub: Send + Sync {
    /// Check that the databases the exporter reads from are reachable.
    async fn connect(&self) -> Result<()>;

    async fn get_system_identity(&self) -> Result<String>;
    async fn get_system_info(&self) -> Result<SystemInfo>;

    async fn get_process_info(&self, component: Component) -> Result<ProcessInfo>;
    async fn get_log_file_info(&self, component: Component) -> Result<FileInfo>;
    async fn get_log_event_histogram(&self, component: Component) -> Result<LogEventHistogram>;
    async fn get_db_file_info(&self, component: Component) -> Result<FileInfo>;

    /// Chassis registered in the southbound database.
    async fn get_chassis(&self) -> Result<Vec<Chassis>>;
    async fn get_logical_switches(&self) -> Result<Vec<LogicalSwitch>>;
    async fn get_logical_switch_ports(&self) -> Result<Vec<LogicalSwitchPort>>;

    /// Commands the component's control socket accepts, e.g.
    /// `"memory/show"` or `"cluster/status DB"`.
    async fn list_commands(&self, component: Component) -> Result<BTreeSet<String>>;
    async fn get_coverage_counters(&self, component: Component) -> Result<CoverageCounters>;
    async fn get_memory_counters(&self, component: Component) -> Result<MemoryCounters>;
    async fn get_cluster_status(&self, component: Component) -> Result<ClusterStatus>;

    async fn is_port_reachable(&self, component: Component, kind: PortKind) -> Result<bool>;
}

#[async_trait]
impl<T: IOvnClientStub + ?Sized> IOvnClientStub for Arc<T> {
    async fn connect(&self) -> Result<()> {
        (**self).connect().await
    }
    async fn get_system_identity(&self) -> Result<String> {
        (**self).get_system_identity().await
    }
    async fn get_system_info(&self) -> Result<SystemInfo> {
        (**self).get_system_info().await
    }
    async fn get_process_info(&self, component: Component) -> Result<ProcessInfo> {
        (**self).get_process_info(component).await
    }
    async fn get_log_file_info(&self, component: Component) -> Result<FileInfo> {
        (**self).get_log_file_info(component).await
    }
    async fn get_log_event_histogram(&self, component: Component) -> Result<LogEventHistogram> {
        (**self).get_log_event_histogram(component).await
    }
    async fn get_db_file_info(&self, component: Component) -> Result<FileInfo> {
        (**self).get_db_file_info(component).await
    }
    async fn get_chassis(&self) -> Result<Vec<Chassis>> {
        (**self).get_chassis().await
    }
    async fn get_logical_switches(&self) -> Result<Vec<LogicalSwitch>> {
        (**self).get_logical_switches().await
    }
    async fn get_logical_switch_ports(&self) -> Result<Vec<LogicalSwitchPort>> {
        (**self).get_logical_switch_ports().await
    }
    async fn list_commands(&self, component: Component) -> Result<BTreeSet<String>> {
        (**self).list_commands(component).await
    }
    async fn get_coverage_counters(&self, component: Component) -> Result<CoverageCounters> {
        (**self).get_coverage_counters(component).await
    }
    async fn get_memory_counters(&self, component: Component) -> Result<MemoryCounters> {
        (**self).get_memory_counters(component).await
    }
    async fn get_cluster_status(&self, component: Component) -> Result<ClusterStatus> {
        (**self).get_cluster_status(component).await
    }
    async fn is_port_reachable(&self, component: Component, kind: PortKind) -> Result<bool> {
        (**self).is_port_reachable(component, kind).await
    }
}
