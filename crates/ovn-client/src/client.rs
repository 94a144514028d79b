use async_trait::async_trait;
use ovn_stubs::IOvnClientStub;
use ovn_types::{
    Chassis, ClientError, ClusterStatus, Component, CoverageCounters, DatabaseRole, FileInfo,
    LogEventHistogram, LogicalSwitch, LogicalSwitchPort, MemoryCounters, PortKind, ProcessInfo,
    Result, SystemInfo,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{ClientConfig, DatabaseConfig};
use crate::jsonrpc::{Endpoint, JsonRpcConnection};
use crate::ovsdb::{column_map, column_set, column_string, column_u64};
use crate::procfs::ProcFs;
use crate::{logs, unixctl};

/// Backend client that talks to the local OVS/OVN daemons.
///
/// Holds no open connections; every call dials its socket afresh, so a
/// restarted daemon is picked up on the next poll.
pub struct OvnClient {
    config: ClientConfig,
    procfs: ProcFs,
}

impl OvnClient {
    pub fn new(config: ClientConfig) -> Self {
        let procfs = ProcFs::new(&config.proc_root);
        Self { config, procfs }
    }

    pub fn with_procfs(mut self, procfs: ProcFs) -> Self {
        self.procfs = procfs;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn database(&self, role: DatabaseRole) -> &DatabaseConfig {
        match role {
            DatabaseRole::Vswitch => &self.config.vswitch,
            DatabaseRole::Northbound => &self.config.northbound,
            DatabaseRole::Southbound => &self.config.southbound,
        }
    }

    fn server_database(&self, component: Component, what: &str) -> Result<&DatabaseConfig> {
        component
            .database_role()
            .map(|role| self.database(role))
            .ok_or_else(|| unsupported(component, what))
    }

    async fn open(&self, role: DatabaseRole) -> Result<JsonRpcConnection> {
        let endpoint: Endpoint = self.database(role).socket_remote.parse()?;
        JsonRpcConnection::connect(&endpoint).await
    }

    fn pid_path(&self, component: Component) -> &Path {
        match component {
            Component::OvsdbServer => &self.config.vswitch.pid_path,
            Component::OvsdbServerNorthbound | Component::OvsdbServerNorthboundMonitoring => {
                &self.config.northbound.pid_path
            }
            Component::OvsdbServerSouthbound | Component::OvsdbServerSouthboundMonitoring => {
                &self.config.southbound.pid_path
            }
            Component::OvnNorthd | Component::OvnNorthdMonitoring => &self.config.northd.pid_path,
            Component::OvsVswitchd => &self.config.vswitchd.pid_path,
        }
    }

    fn log_path(&self, component: Component) -> Result<&Path> {
        match component {
            Component::OvsdbServer => Ok(&self.config.vswitch.log_path),
            Component::OvsdbServerNorthbound => Ok(&self.config.northbound.log_path),
            Component::OvsdbServerSouthbound => Ok(&self.config.southbound.log_path),
            Component::OvnNorthd => Ok(&self.config.northd.log_path),
            Component::OvsVswitchd => Ok(&self.config.vswitchd.log_path),
            _ => Err(unsupported(component, "log files")),
        }
    }

    /// Pid of the daemon. A monitoring component resolves to the parent of
    /// the daemon it supervises, provided the parent runs the same program.
    async fn pid(&self, component: Component) -> Result<u32> {
        let daemon = component.monitored().unwrap_or(component);
        let pid = match self.procfs.read_pid_file(self.pid_path(daemon)).await {
            Ok(pid) => pid,
            Err(ClientError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClientError::NotRunning(component));
            }
            Err(e) => return Err(e),
        };
        if !self.procfs.is_alive(pid).await {
            return Err(ClientError::NotRunning(daemon));
        }
        if !component.is_monitoring() {
            return Ok(pid);
        }

        let ppid = self.procfs.parent_pid(pid).await?;
        let comm = self.procfs.comm(pid).await?;
        match self.procfs.comm(ppid).await {
            Ok(parent) if ppid > 1 && parent == comm => Ok(ppid),
            _ => Err(ClientError::NotRunning(component)),
        }
    }

    async fn control_endpoint(&self, component: Component) -> Result<Endpoint> {
        let program = match component {
            Component::OvsdbServer
            | Component::OvsdbServerNorthbound
            | Component::OvsdbServerSouthbound => "ovsdb-server",
            Component::OvnNorthd => "ovn-northd",
            Component::OvsVswitchd => "ovs-vswitchd",
            _ => return Err(unsupported(component, "a control socket")),
        };
        if let Some(db) = component.database_role().map(|role| self.database(role)) {
            if let Some(ctl) = &db.socket_control {
                return ctl.parse();
            }
        }
        let pid = self.pid(component).await?;
        Ok(Endpoint::Unix(
            self.config.run_dir.join(format!("{}.{}.ctl", program, pid)),
        ))
    }

    /// Run a unixctl command and return its text reply.
    async fn appctl(&self, component: Component, command: &str, args: &[&str]) -> Result<String> {
        let endpoint = self.control_endpoint(component).await?;
        debug!(component = %component, command, endpoint = %endpoint, "Running unixctl command");
        let mut conn = JsonRpcConnection::connect(&endpoint).await?;
        let reply = conn.call(command, json!(args)).await?;
        match reply {
            Value::String(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Err(ClientError::Protocol(format!(
                "{} returned non-text reply: {}",
                command, other
            ))),
        }
    }

    async fn hostname(&self, external_ids: &BTreeMap<String, String>) -> String {
        if let Some(name) = external_ids.get("hostname").filter(|h| !h.is_empty()) {
            return name.clone();
        }
        let path = self.config.proc_root.join("sys/kernel/hostname");
        tokio::fs::read_to_string(path)
            .await
            .map(|h| h.trim().to_string())
            .unwrap_or_default()
    }

    async fn file_info(&self, component: Component, path: &Path) -> Result<FileInfo> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(FileInfo {
            component,
            path: PathBuf::from(path),
            size: meta.len(),
        })
    }

    /// Southbound datapath bindings of logical switches, keyed by binding uuid.
    async fn switch_bindings(&self, conn: &mut JsonRpcConnection) -> Result<BTreeMap<String, LogicalSwitch>> {
        let db = &self.config.southbound.name;
        let rows = conn
            .select(db, "Datapath_Binding", &["_uuid", "tunnel_key", "external_ids"])
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let external_ids = column_map(row, "external_ids");
                let uuid = external_ids.get("logical-switch")?.clone();
                let name = external_ids.get("name").cloned().unwrap_or_default();
                Some((
                    column_string(row, "_uuid"),
                    LogicalSwitch {
                        uuid,
                        name,
                        tunnel_key: column_u64(row, "tunnel_key"),
                        ports: Vec::new(),
                        external_ids,
                    },
                ))
            })
            .collect())
    }
}

const STANDALONE_REPLY: &str = "not a clustered database";

fn unsupported(component: Component, what: &str) -> ClientError {
    ClientError::Unsupported {
        component,
        what: what.to_string(),
    }
}

/// `Port_Binding.mac` entries read `"<mac> <ip> [<ip>...]"`.
fn split_mac(entry: &str) -> (String, String) {
    let mut parts = entry.split_whitespace();
    let mac = parts.next().unwrap_or_default().to_string();
    let ip = parts.next().unwrap_or_default().to_string();
    (mac, ip)
}

#[async_trait]
impl IOvnClientStub for OvnClient {
    async fn connect(&self) -> Result<()> {
        for role in [DatabaseRole::Vswitch, DatabaseRole::Northbound, DatabaseRole::Southbound] {
            let mut conn = self.open(role).await?;
            conn.echo().await?;
            debug!(endpoint = conn.endpoint(), "Database reachable");
        }
        Ok(())
    }

    async fn get_system_identity(&self) -> Result<String> {
        let text = tokio::fs::read_to_string(&self.config.system_id_path).await?;
        let id = text.trim();
        if id.is_empty() {
            return Err(ClientError::NotFound(format!(
                "system id in {}",
                self.config.system_id_path.display()
            )));
        }
        Ok(id.to_string())
    }

    async fn get_system_info(&self) -> Result<SystemInfo> {
        let id = self.get_system_identity().await?;
        let mut conn = self.open(DatabaseRole::Vswitch).await?;
        let rows = conn
            .select(
                &self.config.vswitch.name,
                "Open_vSwitch",
                &["ovs_version", "db_version", "system_type", "system_version", "external_ids"],
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| ClientError::NotFound("Open_vSwitch root row".into()))?;
        let external_ids = column_map(row, "external_ids");
        Ok(SystemInfo {
            id,
            run_dir: self.config.run_dir.display().to_string(),
            hostname: self.hostname(&external_ids).await,
            system_type: column_string(row, "system_type"),
            system_version: column_string(row, "system_version"),
            ovs_version: column_string(row, "ovs_version"),
            db_version: column_string(row, "db_version"),
        })
    }

    async fn get_process_info(&self, component: Component) -> Result<ProcessInfo> {
        let pid = self.pid(component).await?;
        self.procfs.process_info(pid).await
    }

    async fn get_log_file_info(&self, component: Component) -> Result<FileInfo> {
        let path = self.log_path(component)?;
        self.file_info(component, path).await
    }

    async fn get_log_event_histogram(&self, component: Component) -> Result<LogEventHistogram> {
        let path = self.log_path(component)?;
        Ok(logs::read_log_events(path).await?)
    }

    async fn get_db_file_info(&self, component: Component) -> Result<FileInfo> {
        let db = self.server_database(component, "database files")?;
        self.file_info(component, &db.data_path).await
    }

    async fn get_chassis(&self) -> Result<Vec<Chassis>> {
        let db = &self.config.southbound.name;
        let mut conn = self.open(DatabaseRole::Southbound).await?;
        let encaps: BTreeMap<String, String> = conn
            .select(db, "Encap", &["_uuid", "ip"])
            .await?
            .iter()
            .map(|row| (column_string(row, "_uuid"), column_string(row, "ip")))
            .collect();
        let rows = conn.select(db, "Chassis", &["_uuid", "name", "encaps"]).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let ip = column_set(row, "encaps")
                    .iter()
                    .find_map(|uuid| encaps.get(uuid).filter(|ip| !ip.is_empty()))
                    .cloned()
                    .unwrap_or_default();
                Chassis {
                    uuid: column_string(row, "_uuid"),
                    name: column_string(row, "name"),
                    up: !ip.is_empty(),
                    ip,
                }
            })
            .collect())
    }

    async fn get_logical_switches(&self) -> Result<Vec<LogicalSwitch>> {
        let mut conn = self.open(DatabaseRole::Southbound).await?;
        let mut switches = self.switch_bindings(&mut conn).await?;
        let ports = conn
            .select(&self.config.southbound.name, "Port_Binding", &["logical_port", "datapath"])
            .await?;
        for row in &ports {
            if let Some(switch) = switches.get_mut(&column_string(row, "datapath")) {
                switch.ports.push(column_string(row, "logical_port"));
            }
        }
        Ok(switches.into_values().collect())
    }

    async fn get_logical_switch_ports(&self) -> Result<Vec<LogicalSwitchPort>> {
        let mut conn = self.open(DatabaseRole::Southbound).await?;
        let switches = self.switch_bindings(&mut conn).await?;
        let rows = conn
            .select(
                &self.config.southbound.name,
                "Port_Binding",
                &["_uuid", "logical_port", "chassis", "datapath", "mac", "tunnel_key"],
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let datapath_uuid = column_string(row, "datapath");
                let switch = switches.get(&datapath_uuid)?;
                let (mac_address, ip_address) = split_mac(&column_string(row, "mac"));
                Some(LogicalSwitchPort {
                    uuid: column_string(row, "_uuid"),
                    name: column_string(row, "logical_port"),
                    chassis_uuid: column_string(row, "chassis"),
                    logical_switch: switch.uuid.clone(),
                    datapath_uuid,
                    port_binding_uuid: column_string(row, "_uuid"),
                    mac_address,
                    ip_address,
                    tunnel_key: column_u64(row, "tunnel_key"),
                })
            })
            .collect())
    }

    async fn list_commands(&self, component: Component) -> Result<BTreeSet<String>> {
        let text = self.appctl(component, "list-commands", &[]).await?;
        Ok(unixctl::parse_list_commands(&text))
    }

    async fn get_coverage_counters(&self, component: Component) -> Result<CoverageCounters> {
        let text = self.appctl(component, "coverage/show", &[]).await?;
        Ok(unixctl::parse_coverage(&text))
    }

    async fn get_memory_counters(&self, component: Component) -> Result<MemoryCounters> {
        let text = self.appctl(component, "memory/show", &[]).await?;
        Ok(unixctl::parse_memory(&text))
    }

    async fn get_cluster_status(&self, component: Component) -> Result<ClusterStatus> {
        let db = self.server_database(component, "clustering")?.name.clone();
        match self.appctl(component, "cluster/status", &[db.as_str()]).await {
            Ok(text) => unixctl::parse_cluster_status(&text),
            // standalone databases answer with an error reply
            Err(ClientError::Rpc(reason)) if reason.contains(STANDALONE_REPLY) => {
                Err(unsupported(component, "clustering"))
            }
            Err(e) => Err(e),
        }
    }

    async fn is_port_reachable(&self, component: Component, kind: PortKind) -> Result<bool> {
        let db = self.server_database(component, "listening ports")?;
        let port = match kind {
            PortKind::Default => db.port_default,
            PortKind::Ssl => db.port_ssl,
            PortKind::Raft => db.port_raft,
        };
        if port == 0 {
            return Ok(false);
        }
        match tokio::net::TcpStream::connect((self.config.probe_host.as_str(), port)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
