//! Raft status samples for the clustered database servers, and the
//! cluster group derived from the northbound and southbound ids.

use ovn_monitor::Sample;
use ovn_types::{ClusterStatus, Component};
use std::collections::BTreeSet;

use crate::metrics::{flag, MetricId, Metrics};

/// Outcome of the cluster query for one component in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterState {
    /// The server does not offer `cluster/status`.
    Unsupported,
    /// The database is standalone, or the query failed.
    Disabled,
    Enabled(Box<ClusterStatus>),
}

/// Collects per-component cluster samples during one pass.
///
/// A fresh aggregator is built for every pass; nothing carries over.
#[derive(Debug, Default)]
pub struct ClusterAggregator {
    enabled: BTreeSet<Component>,
    northbound_id: Option<String>,
    southbound_id: Option<String>,
}

impl ClusterAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, component: Component) -> bool {
        self.enabled.contains(&component)
    }

    pub fn observe(
        &mut self,
        metrics: &Metrics,
        system_id: &str,
        component: Component,
        state: &ClusterState,
        out: &mut Vec<Sample>,
    ) {
        let status = match state {
            ClusterState::Unsupported => return,
            ClusterState::Disabled => {
                metrics.push(out, MetricId::ClusterEnabled, 0.0, &[system_id, component.as_str()]);
                return;
            }
            ClusterState::Enabled(status) => status,
        };

        self.enabled.insert(component);
        match component {
            Component::OvsdbServerNorthbound => self.northbound_id = Some(status.cluster_id.clone()),
            Component::OvsdbServerSouthbound => self.southbound_id = Some(status.cluster_id.clone()),
            _ => {}
        }
        status_samples(metrics, system_id, component, status, out);
    }

    /// `cluster_group`, when both database roles reported a cluster id.
    pub fn finish(&self, metrics: &Metrics, system_id: &str, out: &mut Vec<Sample>) {
        if let Some(group) = self.group() {
            metrics.push(out, MetricId::ClusterGroup, 1.0, &[system_id, group.as_str()]);
        }
    }

    pub fn group(&self) -> Option<String> {
        match (&self.northbound_id, &self.southbound_id) {
            (Some(nb), Some(sb)) if !nb.is_empty() && !sb.is_empty() => Some(format!("{}{}", nb, sb)),
            _ => None,
        }
    }
}

fn status_samples(
    metrics: &Metrics,
    system_id: &str,
    component: Component,
    status: &ClusterStatus,
    out: &mut Vec<Sample>,
) {
    let component = component.as_str();
    let server_id = status.server_id.as_str();
    let cluster_id = status.cluster_id.as_str();

    metrics.push(out, MetricId::ClusterEnabled, 1.0, &[system_id, component]);
    metrics.push(
        out,
        MetricId::ClusterRole,
        f64::from(status.role.ordinal()),
        &[
            system_id,
            component,
            server_id,
            status.server_uuid.as_str(),
            cluster_id,
            status.cluster_uuid.as_str(),
        ],
    );

    let server: [&str; 4] = [system_id, component, server_id, cluster_id];
    for (id, value) in [
        (MetricId::ClusterStatus, flag(status.is_member)),
        (MetricId::ClusterTerm, status.term as f64),
        (MetricId::ClusterUncommittedEntries, status.uncommitted_entries as f64),
        (MetricId::ClusterPendingEntries, status.unapplied_entries as f64),
        (MetricId::ClusterNextIndex, status.next_index as f64),
        (MetricId::ClusterMatchIndex, status.match_index as f64),
        (MetricId::ClusterLogLowIndex, status.log_low as f64),
        (MetricId::ClusterLogHighIndex, status.log_high as f64),
        (MetricId::ClusterLeaderSelf, flag(status.leader_self)),
        (MetricId::ClusterVoteSelf, flag(status.voted_self)),
        (MetricId::ClusterPeerCount, status.peers.len() as f64),
        (MetricId::ClusterInboundConnTotal, status.inbound_connections as f64),
        (MetricId::ClusterOutboundConnTotal, status.outbound_connections as f64),
    ] {
        metrics.push(out, id, value, &server);
    }

    for (peer_id, peer) in &status.peers {
        let peer_id = peer_id.as_str();
        let labels: [&str; 5] = [system_id, component, server_id, cluster_id, peer_id];
        metrics.push(out, MetricId::ClusterPeerNextIndex, peer.next_index as f64, &labels);
        metrics.push(out, MetricId::ClusterPeerMatchIndex, peer.match_index as f64, &labels);
        let labels: [&str; 6] = [system_id, component, server_id, cluster_id, peer_id, peer.address.as_str()];
        metrics.push(out, MetricId::ClusterInboundPeerConnected, flag(peer.inbound), &labels);
        metrics.push(out, MetricId::ClusterOutboundPeerConnected, flag(peer.outbound), &labels);
    }
}
