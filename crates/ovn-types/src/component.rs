use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A queryable unit of the OVN/OVS stack.
///
/// The `*Monitoring` variants are the supervising parent processes that
/// `--monitor` mode forks in front of the real daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    OvsdbServer,
    OvsdbServerSouthbound,
    OvsdbServerSouthboundMonitoring,
    OvsdbServerNorthbound,
    OvsdbServerNorthboundMonitoring,
    OvnNorthd,
    OvnNorthdMonitoring,
    OvsVswitchd,
}

impl Component {
    pub const ALL: [Component; 8] = [
        Component::OvsdbServer,
        Component::OvsdbServerSouthbound,
        Component::OvsdbServerSouthboundMonitoring,
        Component::OvsdbServerNorthbound,
        Component::OvsdbServerNorthboundMonitoring,
        Component::OvnNorthd,
        Component::OvnNorthdMonitoring,
        Component::OvsVswitchd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::OvsdbServer => "ovsdb-server",
            Component::OvsdbServerSouthbound => "ovsdb-server-southbound",
            Component::OvsdbServerSouthboundMonitoring => "ovsdb-server-southbound-monitoring",
            Component::OvsdbServerNorthbound => "ovsdb-server-northbound",
            Component::OvsdbServerNorthboundMonitoring => "ovsdb-server-northbound-monitoring",
            Component::OvnNorthd => "ovn-northd",
            Component::OvnNorthdMonitoring => "ovn-northd-monitoring",
            Component::OvsVswitchd => "ovs-vswitchd",
        }
    }

    /// For a monitoring shadow, the daemon it supervises.
    pub fn monitored(&self) -> Option<Component> {
        match self {
            Component::OvsdbServerSouthboundMonitoring => Some(Component::OvsdbServerSouthbound),
            Component::OvsdbServerNorthboundMonitoring => Some(Component::OvsdbServerNorthbound),
            Component::OvnNorthdMonitoring => Some(Component::OvnNorthd),
            _ => None,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitored().is_some()
    }

    /// The database served by this component, if it is a database server.
    pub fn database_role(&self) -> Option<DatabaseRole> {
        match self {
            Component::OvsdbServer => Some(DatabaseRole::Vswitch),
            Component::OvsdbServerNorthbound => Some(DatabaseRole::Northbound),
            Component::OvsdbServerSouthbound => Some(DatabaseRole::Southbound),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown component: {}", s))
    }
}

/// The three OVSDB databases the exporter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseRole {
    Vswitch,
    Northbound,
    Southbound,
}

impl DatabaseRole {
    pub fn server(&self) -> Component {
        match self {
            DatabaseRole::Vswitch => Component::OvsdbServer,
            DatabaseRole::Northbound => Component::OvsdbServerNorthbound,
            DatabaseRole::Southbound => Component::OvsdbServerSouthbound,
        }
    }
}

/// Listening ports probed for a database server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Default,
    Ssl,
    Raft,
}

impl PortKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortKind::Default => "default",
            PortKind::Ssl => "ssl",
            PortKind::Raft => "raft",
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
