use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raft role of a clustered database server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterRole {
    Leader,
    Candidate,
    Follower,
    #[default]
    Other,
}

impl ClusterRole {
    /// Numeric encoding exported as `cluster_role`.
    pub fn ordinal(&self) -> u8 {
        match self {
            ClusterRole::Leader => 3,
            ClusterRole::Candidate => 2,
            ClusterRole::Follower => 1,
            ClusterRole::Other => 0,
        }
    }

    pub fn parse(s: &str) -> ClusterRole {
        match s.trim() {
            "leader" => ClusterRole::Leader,
            "candidate" => ClusterRole::Candidate,
            "follower" => ClusterRole::Follower,
            _ => ClusterRole::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPeer {
    pub next_index: u64,
    pub match_index: u64,
    pub inbound: bool,
    pub outbound: bool,
    pub address: String,
}

/// Output of `cluster/status <db>` for one database server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub server_id: String,
    pub server_uuid: String,
    pub cluster_id: String,
    pub cluster_uuid: String,
    pub role: ClusterRole,
    pub is_member: bool,
    pub term: u64,
    pub uncommitted_entries: u64,
    pub unapplied_entries: u64,
    pub next_index: u64,
    pub match_index: u64,
    pub log_low: u64,
    pub log_high: u64,
    pub leader_self: bool,
    pub voted_self: bool,
    pub inbound_connections: u64,
    pub outbound_connections: u64,
    /// Keyed by short server id.
    pub peers: BTreeMap<String, ClusterPeer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordinals() {
        assert_eq!(ClusterRole::parse("leader").ordinal(), 3);
        assert_eq!(ClusterRole::parse("candidate").ordinal(), 2);
        assert_eq!(ClusterRole::parse("follower").ordinal(), 1);
        assert_eq!(ClusterRole::parse("learner").ordinal(), 0);
        assert_eq!(ClusterRole::parse("").ordinal(), 0);
    }

    #[test]
    fn test_default_status_is_other() {
        let status = ClusterStatus::default();
        assert_eq!(status.role, ClusterRole::Other);
        assert!(status.peers.is_empty());
    }
}
