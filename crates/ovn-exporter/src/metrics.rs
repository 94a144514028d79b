//! The exporter's metric families.

use ovn_monitor::{Descriptor, DescriptorRegistry, DescriptorSpec, MetricKind, Sample};
use tracing::error;

pub const NAMESPACE: &str = "ovn";

/// Index into [`DESCRIPTORS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricId {
    Up,
    Info,
    FailedRequests,
    NextPoll,
    Pid,
    LogFileSize,
    LogEventCount,
    DbFileSize,
    ChassisInfo,
    LogicalSwitchInfo,
    LogicalSwitchExternalId,
    LogicalSwitchPortBinding,
    LogicalSwitchTunnelKey,
    LogicalSwitchPorts,
    LogicalSwitchPortInfo,
    LogicalSwitchPortTunnelKey,
    NetworkPort,
    CoverageAvg,
    CoverageTotal,
    MemoryUsage,
    ClusterEnabled,
    ClusterRole,
    ClusterStatus,
    ClusterTerm,
    ClusterUncommittedEntries,
    ClusterPendingEntries,
    ClusterNextIndex,
    ClusterMatchIndex,
    ClusterLogLowIndex,
    ClusterLogHighIndex,
    ClusterLeaderSelf,
    ClusterVoteSelf,
    ClusterPeerCount,
    ClusterInboundConnTotal,
    ClusterOutboundConnTotal,
    ClusterPeerNextIndex,
    ClusterPeerMatchIndex,
    ClusterInboundPeerConnected,
    ClusterOutboundPeerConnected,
    ClusterGroup,
}

impl MetricId {
    pub const ALL: [MetricId; 40] = [
        MetricId::Up,
        MetricId::Info,
        MetricId::FailedRequests,
        MetricId::NextPoll,
        MetricId::Pid,
        MetricId::LogFileSize,
        MetricId::LogEventCount,
        MetricId::DbFileSize,
        MetricId::ChassisInfo,
        MetricId::LogicalSwitchInfo,
        MetricId::LogicalSwitchExternalId,
        MetricId::LogicalSwitchPortBinding,
        MetricId::LogicalSwitchTunnelKey,
        MetricId::LogicalSwitchPorts,
        MetricId::LogicalSwitchPortInfo,
        MetricId::LogicalSwitchPortTunnelKey,
        MetricId::NetworkPort,
        MetricId::CoverageAvg,
        MetricId::CoverageTotal,
        MetricId::MemoryUsage,
        MetricId::ClusterEnabled,
        MetricId::ClusterRole,
        MetricId::ClusterStatus,
        MetricId::ClusterTerm,
        MetricId::ClusterUncommittedEntries,
        MetricId::ClusterPendingEntries,
        MetricId::ClusterNextIndex,
        MetricId::ClusterMatchIndex,
        MetricId::ClusterLogLowIndex,
        MetricId::ClusterLogHighIndex,
        MetricId::ClusterLeaderSelf,
        MetricId::ClusterVoteSelf,
        MetricId::ClusterPeerCount,
        MetricId::ClusterInboundConnTotal,
        MetricId::ClusterOutboundConnTotal,
        MetricId::ClusterPeerNextIndex,
        MetricId::ClusterPeerMatchIndex,
        MetricId::ClusterInboundPeerConnected,
        MetricId::ClusterOutboundPeerConnected,
        MetricId::ClusterGroup,
    ];
}

const SYSTEM: &[&str] = &["system_id"];
const COMPONENT: &[&str] = &["system_id", "component"];
const COMPONENT_FILE: &[&str] = &["system_id", "component", "filename"];
const UUID: &[&str] = &["system_id", "uuid"];
const CLUSTER: &[&str] = &["system_id", "component", "server_id", "cluster_id"];
const CLUSTER_PEER: &[&str] = &["system_id", "component", "server_id", "cluster_id", "peer_id"];
const CLUSTER_PEER_ADDR: &[&str] = &[
    "system_id",
    "component",
    "server_id",
    "cluster_id",
    "peer_id",
    "peer_address",
];

const fn gauge(name: &'static str, labels: &'static [&'static str], help: &'static str) -> DescriptorSpec {
    DescriptorSpec { name, kind: MetricKind::Gauge, labels, help }
}

const fn counter(name: &'static str, labels: &'static [&'static str], help: &'static str) -> DescriptorSpec {
    DescriptorSpec { name, kind: MetricKind::Counter, labels, help }
}

/// One entry per [`MetricId`], in the same order.
pub const DESCRIPTORS: [DescriptorSpec; 40] = [
    gauge("up", &[], "Is OVN stack up (1) or is it down (0)."),
    gauge(
        "info",
        &["system_id", "rundir", "hostname", "system_type", "system_version", "ovs_version", "db_version"],
        "This metric provides basic information about OVN stack. It is always set to 1.",
    ),
    counter("failed_req_count", SYSTEM, "The number of failed requests to OVN stack."),
    counter("next_poll", SYSTEM, "The timestamp of the next potential poll of OVN stack."),
    gauge(
        "pid",
        &["system_id", "component", "user", "group"],
        "The process ID of a running OVN component.",
    ),
    gauge("log_file_size", COMPONENT_FILE, "The size of a log file associated with an OVN component."),
    gauge(
        "log_event_count",
        &["system_id", "component", "severity", "source"],
        "The number of recorded log messages associated with an OVN component by log severity level and source.",
    ),
    gauge("db_file_size", COMPONENT_FILE, "The size of a database file associated with an OVN component."),
    gauge(
        "chassis_info",
        &["system_id", "uuid", "name", "ip"],
        "Whether the OVN chassis is up (1) or down (0), together with additional information about the chassis.",
    ),
    gauge(
        "logical_switch_info",
        &["system_id", "uuid", "name"],
        "The information about OVN logical switch. This metric is always up (1).",
    ),
    gauge(
        "logical_switch_external_id",
        &["system_id", "uuid", "key", "value"],
        "Provides the external IDs and values associated with OVN logical switches. This metric is always up (1).",
    ),
    gauge(
        "logical_switch_port_binding",
        &["system_id", "uuid", "port"],
        "Provides the association between a logical switch and a logical switch port. This metric is always up (1).",
    ),
    gauge("logical_switch_tunnel_key", UUID, "The value of the tunnel key associated with the logical switch."),
    gauge("logical_switch_ports", UUID, "The number of logical switch ports connected to the OVN logical switch."),
    gauge(
        "logical_switch_port_info",
        &[
            "system_id",
            "uuid",
            "name",
            "chassis",
            "logical_switch",
            "datapath",
            "port_binding",
            "mac_address",
            "ip_address",
        ],
        "The information about OVN logical switch port. This metric is always up (1).",
    ),
    gauge("logical_switch_port_tunnel_key", UUID, "The value of the tunnel key associated with the logical switch port."),
    gauge(
        "network_port",
        &["system_id", "component", "usage"],
        "The TCP port used for database connection. If the value is 0, then the port is not in use.",
    ),
    gauge(
        "coverage_avg",
        &["system_id", "component", "event", "interval"],
        "The average rate of the number of times particular events occur during a OVSDB daemon's runtime.",
    ),
    counter(
        "coverage_total",
        &["system_id", "component", "event"],
        "The total number of times particular events occur during a OVSDB daemon's runtime.",
    ),
    gauge("memory_usage", &["system_id", "component", "facility"], "The memory usage."),
    gauge("cluster_enabled", COMPONENT, "Is OVN clustering enabled (1) or not (0)."),
    gauge(
        "cluster_role",
        &["system_id", "component", "server_id", "server_uuid", "cluster_id", "cluster_uuid"],
        "The role of this server in the cluster. The values are: 3 - leader, 2 - candidate, 1 - follower, 0 - other.",
    ),
    gauge(
        "cluster_status",
        CLUSTER,
        "The status of this server in the cluster. The values are: 1 - cluster member, 0 - other.",
    ),
    counter("cluster_term", CLUSTER, "The current raft term known by this server."),
    gauge("cluster_uncommitted_entry_count", CLUSTER, "The number of raft entries not yet committed by this server."),
    gauge("cluster_pending_entry_count", CLUSTER, "The number of raft entries not yet applied by this server."),
    counter("cluster_next_index", CLUSTER, "The raft's next index associated with this server."),
    counter("cluster_match_index", CLUSTER, "The raft's match index associated with this server."),
    counter("cluster_log_low_index", CLUSTER, "The raft's low log index associated with this server."),
    counter("cluster_log_high_index", CLUSTER, "The raft's high log index associated with this server."),
    gauge("cluster_leader_self", CLUSTER, "Is this server consider itself a leader (1) or not (0)."),
    gauge("cluster_vote_self", CLUSTER, "Is this server voted itself as a leader (1) or not (0)."),
    gauge("cluster_peer_count", CLUSTER, "The total number of peers in this server's cluster."),
    gauge("cluster_inbound_peer_conn_total", CLUSTER, "The total number of inbound connections from cluster peers."),
    gauge("cluster_outbound_peer_conn_total", CLUSTER, "The total number of outbound connections to cluster peers."),
    counter("cluster_peer_next_index", CLUSTER_PEER, "The raft's next index associated with this cluster peer."),
    counter("cluster_peer_match_index", CLUSTER_PEER, "The raft's match index associated with this cluster peer."),
    gauge(
        "cluster_inbound_peer_connected",
        CLUSTER_PEER_ADDR,
        "Whether a cluster peer is connected to this server (1) or not (0).",
    ),
    gauge(
        "cluster_outbound_peer_connected",
        CLUSTER_PEER_ADDR,
        "Whether this server is connected to a cluster peer (1) or not (0).",
    ),
    gauge(
        "cluster_group",
        &["system_id", "cluster_group"],
        "The cluster group in which this server participates. It is a combination of SB and NB cluster IDs. This metric is always up (1).",
    ),
];

/// Descriptor registry for the `ovn` namespace, addressed by [`MetricId`].
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: DescriptorRegistry,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            registry: DescriptorRegistry::new(NAMESPACE, &DESCRIPTORS),
        }
    }

    pub fn descriptor(&self, id: MetricId) -> &Descriptor {
        self.registry.get(id as usize)
    }

    /// Append a sample of `id` to `out`. A sample whose label values do not
    /// match the descriptor is logged and dropped.
    pub fn push(&self, out: &mut Vec<Sample>, id: MetricId, value: f64, labels: &[&str]) {
        match self.descriptor(id).sample(value, labels) {
            Ok(sample) => out.push(sample),
            Err(e) => error!(error = %e, "Dropping malformed sample"),
        }
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

pub fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_index_the_table() {
        assert_eq!(MetricId::ALL.len(), DESCRIPTORS.len());
        for (i, id) in MetricId::ALL.iter().enumerate() {
            assert_eq!(*id as usize, i);
        }
    }

    #[test]
    fn test_names_are_unique_and_namespaced() {
        let metrics = Metrics::new();
        let names: HashSet<&str> = metrics
            .registry()
            .describe()
            .iter()
            .map(|d| d.fq_name.as_str())
            .collect();
        assert_eq!(names.len(), DESCRIPTORS.len());
        assert!(names.iter().all(|n| n.starts_with("ovn_")));
        assert_eq!(metrics.descriptor(MetricId::ClusterGroup).fq_name, "ovn_cluster_group");
    }

    #[test]
    fn test_counter_families() {
        let metrics = Metrics::new();
        let counters: Vec<&str> = MetricId::ALL
            .iter()
            .filter(|id| metrics.descriptor(**id).kind == MetricKind::Counter)
            .map(|id| DESCRIPTORS[*id as usize].name)
            .collect();
        assert_eq!(
            counters,
            vec![
                "failed_req_count",
                "next_poll",
                "coverage_total",
                "cluster_term",
                "cluster_next_index",
                "cluster_match_index",
                "cluster_log_low_index",
                "cluster_log_high_index",
                "cluster_peer_next_index",
                "cluster_peer_match_index",
            ]
        );
    }

    #[test]
    fn test_sample_labels() {
        let metrics = Metrics::new();
        let mut out = Vec::new();
        metrics.push(&mut out, MetricId::NetworkPort, 1.0, &["sys", "ovsdb-server-northbound", "raft"]);
        let s = &out[0];
        assert_eq!(s.name, "ovn_network_port");
        assert_eq!(s.label("usage"), Some("raft"));
        assert_eq!(s.kind, MetricKind::Gauge);
    }

    #[test]
    fn test_malformed_sample_is_dropped() {
        let metrics = Metrics::new();
        let mut out = Vec::new();
        metrics.push(&mut out, MetricId::Pid, 1.0, &["sys", "ovn-northd"]);
        assert!(out.is_empty());
        metrics.push(&mut out, MetricId::Up, 1.0, &[]);
        assert_eq!(out.len(), 1);
    }
}
