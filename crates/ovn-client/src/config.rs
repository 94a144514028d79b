use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location of one OVSDB database and the server that hosts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Schema name, e.g. `OVN_Northbound`.
    pub name: String,
    /// JSON-RPC socket of the database, e.g. `unix:/run/openvswitch/ovnnb_db.sock`.
    pub socket_remote: String,
    /// unixctl socket of the server. When unset, `<run_dir>/ovsdb-server.<pid>.ctl`.
    #[serde(default)]
    pub socket_control: Option<String>,
    pub data_path: PathBuf,
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
    /// TCP ports; 0 means not configured.
    #[serde(default)]
    pub port_default: u16,
    #[serde(default)]
    pub port_ssl: u16,
    #[serde(default)]
    pub port_raft: u16,
}

/// A daemon that is not a database server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_run_dir")]
    pub run_dir: PathBuf,

    #[serde(default = "default_system_id_path")]
    pub system_id_path: PathBuf,

    /// Host used when probing database TCP ports.
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    #[serde(default = "default_vswitch")]
    pub vswitch: DatabaseConfig,

    #[serde(default = "default_northbound")]
    pub northbound: DatabaseConfig,

    #[serde(default = "default_southbound")]
    pub southbound: DatabaseConfig,

    #[serde(default = "default_vswitchd")]
    pub vswitchd: ServiceConfig,

    #[serde(default = "default_northd")]
    pub northd: ServiceConfig,
}

fn default_run_dir() -> PathBuf {
    PathBuf::from("/var/run/openvswitch")
}

fn default_system_id_path() -> PathBuf {
    PathBuf::from("/etc/openvswitch/system-id.conf")
}

fn default_probe_host() -> String {
    "127.0.0.1".to_string()
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_vswitch() -> DatabaseConfig {
    DatabaseConfig {
        name: "Open_vSwitch".into(),
        socket_remote: "unix:/var/run/openvswitch/db.sock".into(),
        socket_control: None,
        data_path: "/etc/openvswitch/conf.db".into(),
        log_path: "/var/log/openvswitch/ovsdb-server.log".into(),
        pid_path: "/var/run/openvswitch/ovsdb-server.pid".into(),
        port_default: 0,
        port_ssl: 0,
        port_raft: 0,
    }
}

fn default_northbound() -> DatabaseConfig {
    DatabaseConfig {
        name: "OVN_Northbound".into(),
        socket_remote: "unix:/run/openvswitch/ovnnb_db.sock".into(),
        socket_control: Some("unix:/run/openvswitch/ovnnb_db.ctl".into()),
        data_path: "/var/lib/openvswitch/ovnnb_db.db".into(),
        log_path: "/var/log/openvswitch/ovsdb-server-nb.log".into(),
        pid_path: "/run/openvswitch/ovnnb_db.pid".into(),
        port_default: 6641,
        port_ssl: 6631,
        port_raft: 6643,
    }
}

fn default_southbound() -> DatabaseConfig {
    DatabaseConfig {
        name: "OVN_Southbound".into(),
        socket_remote: "unix:/run/openvswitch/ovnsb_db.sock".into(),
        socket_control: Some("unix:/run/openvswitch/ovnsb_db.ctl".into()),
        data_path: "/var/lib/openvswitch/ovnsb_db.db".into(),
        log_path: "/var/log/openvswitch/ovsdb-server-sb.log".into(),
        pid_path: "/run/openvswitch/ovnsb_db.pid".into(),
        port_default: 6642,
        port_ssl: 6632,
        port_raft: 6644,
    }
}

fn default_vswitchd() -> ServiceConfig {
    ServiceConfig {
        log_path: "/var/log/openvswitch/ovs-vswitchd.log".into(),
        pid_path: "/var/run/openvswitch/ovs-vswitchd.pid".into(),
    }
}

fn default_northd() -> ServiceConfig {
    ServiceConfig {
        log_path: "/var/log/openvswitch/ovn-northd.log".into(),
        pid_path: "/run/openvswitch/ovn-northd.pid".into(),
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            run_dir: default_run_dir(),
            system_id_path: default_system_id_path(),
            probe_host: default_probe_host(),
            proc_root: default_proc_root(),
            vswitch: default_vswitch(),
            northbound: default_northbound(),
            southbound: default_southbound(),
            vswitchd: default_vswitchd(),
            northd: default_northd(),
        }
    }
}
