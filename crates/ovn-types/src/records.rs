use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::component::Component;

/// Host and software identity of the OVS/OVN node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub id: String,
    pub run_dir: String,
    pub hostname: String,
    pub system_type: String,
    pub system_version: String,
    pub ovs_version: String,
    pub db_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub user: String,
    pub group: String,
}

/// A file (log or database) owned by a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub component: Component,
    pub path: PathBuf,
    pub size: u64,
}

/// severity -> source -> number of log lines.
pub type LogEventHistogram = BTreeMap<String, BTreeMap<String, u64>>;

/// event -> period ("5s", "1m", "1h", "total") -> value.
pub type CoverageCounters = BTreeMap<String, BTreeMap<String, f64>>;

/// facility -> value.
pub type MemoryCounters = BTreeMap<String, f64>;

/// A hypervisor or gateway registered in the southbound database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chassis {
    pub uuid: String,
    pub name: String,
    pub ip: String,
    pub up: bool,
}

/// A logical switch, as seen through its southbound datapath binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSwitch {
    pub uuid: String,
    pub name: String,
    pub tunnel_key: u64,
    pub ports: Vec<String>,
    pub external_ids: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSwitchPort {
    pub uuid: String,
    pub name: String,
    pub chassis_uuid: String,
    pub logical_switch: String,
    pub datapath_uuid: String,
    pub port_binding_uuid: String,
    pub mac_address: String,
    pub ip_address: String,
    pub tunnel_key: u64,
}
