use async_trait::async_trait;
use ovn_types::{
    Chassis, ClientError, ClusterStatus, Component, CoverageCounters, FileInfo,
    LogEventHistogram, LogicalSwitch, LogicalSwitchPort, MemoryCounters, PortKind, ProcessInfo,
    Result, SystemInfo,
};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::client_stub::IOvnClientStub;

type Handler<Req, Rsp> = Box<dyn Fn(Req) -> Result<Rsp> + Send + Sync>;
type Slot<Req, Rsp> = Mutex<Option<Handler<Req, Rsp>>>;

pub const MOCK_SYSTEM_ID: &str = "mock-system-id";

/// One recorded invocation on the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockCall {
    pub method: &'static str,
    pub component: Option<Component>,
}

/// A configurable mock for [`IOvnClientStub`].
///
/// Each call can be overridden with a closure. Without a handler the mock
/// answers like a healthy stack with empty topology tables: every process is
/// running, every capability is advertised, and `cluster/status` returns a
/// default (id-less) status. Every invocation is recorded.
pub struct MockOvnClientStub {
    pub connect_handler: Slot<(), ()>,
    pub system_identity_handler: Slot<(), String>,
    pub system_info_handler: Slot<(), SystemInfo>,
    pub process_info_handler: Slot<Component, ProcessInfo>,
    pub log_file_info_handler: Slot<Component, FileInfo>,
    pub log_event_histogram_handler: Slot<Component, LogEventHistogram>,
    pub db_file_info_handler: Slot<Component, FileInfo>,
    pub chassis_handler: Slot<(), Vec<Chassis>>,
    pub logical_switches_handler: Slot<(), Vec<LogicalSwitch>>,
    pub logical_switch_ports_handler: Slot<(), Vec<LogicalSwitchPort>>,
    pub list_commands_handler: Slot<Component, BTreeSet<String>>,
    pub coverage_handler: Slot<Component, CoverageCounters>,
    pub memory_handler: Slot<Component, MemoryCounters>,
    pub cluster_status_handler: Slot<Component, ClusterStatus>,
    pub port_handler: Slot<(Component, PortKind), bool>,
    system_info_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<MockCall>>,
}

fn dispatch<Req, Rsp>(
    slot: &Slot<Req, Rsp>,
    req: Req,
    default: impl FnOnce(Req) -> Result<Rsp>,
) -> Result<Rsp> {
    let guard = slot.lock();
    match guard.as_ref() {
        Some(f) => f(req),
        None => default(req),
    }
}

fn mock_down() -> ClientError {
    ClientError::Connection {
        endpoint: "mock".into(),
        reason: "backend down".into(),
    }
}

impl MockOvnClientStub {
    pub fn new() -> Self {
        Self {
            connect_handler: Mutex::new(None),
            system_identity_handler: Mutex::new(None),
            system_info_handler: Mutex::new(None),
            process_info_handler: Mutex::new(None),
            log_file_info_handler: Mutex::new(None),
            log_event_histogram_handler: Mutex::new(None),
            db_file_info_handler: Mutex::new(None),
            chassis_handler: Mutex::new(None),
            logical_switches_handler: Mutex::new(None),
            logical_switch_ports_handler: Mutex::new(None),
            list_commands_handler: Mutex::new(None),
            coverage_handler: Mutex::new(None),
            memory_handler: Mutex::new(None),
            cluster_status_handler: Mutex::new(None),
            port_handler: Mutex::new(None),
            system_info_gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Wrap in an `Arc` for convenient sharing.
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn record(&self, method: &'static str, component: Option<Component>) {
        self.calls.lock().push(MockCall { method, component });
    }

    /// All invocations so far, in call order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.method == method).count()
    }

    /// Components passed to `method`, in call order.
    pub fn components_for(&self, method: &str) -> Vec<Component> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method)
            .filter_map(|c| c.component)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn on_connect(&self, f: impl Fn(()) -> Result<()> + Send + Sync + 'static) {
        *self.connect_handler.lock() = Some(Box::new(f));
    }

    pub fn on_system_identity(&self, f: impl Fn(()) -> Result<String> + Send + Sync + 'static) {
        *self.system_identity_handler.lock() = Some(Box::new(f));
    }

    pub fn on_system_info(&self, f: impl Fn(()) -> Result<SystemInfo> + Send + Sync + 'static) {
        *self.system_info_handler.lock() = Some(Box::new(f));
    }

    pub fn on_process_info(
        &self,
        f: impl Fn(Component) -> Result<ProcessInfo> + Send + Sync + 'static,
    ) {
        *self.process_info_handler.lock() = Some(Box::new(f));
    }

    pub fn on_log_file_info(&self, f: impl Fn(Component) -> Result<FileInfo> + Send + Sync + 'static) {
        *self.log_file_info_handler.lock() = Some(Box::new(f));
    }

    pub fn on_log_event_histogram(
        &self,
        f: impl Fn(Component) -> Result<LogEventHistogram> + Send + Sync + 'static,
    ) {
        *self.log_event_histogram_handler.lock() = Some(Box::new(f));
    }

    pub fn on_db_file_info(&self, f: impl Fn(Component) -> Result<FileInfo> + Send + Sync + 'static) {
        *self.db_file_info_handler.lock() = Some(Box::new(f));
    }

    pub fn on_chassis(&self, f: impl Fn(()) -> Result<Vec<Chassis>> + Send + Sync + 'static) {
        *self.chassis_handler.lock() = Some(Box::new(f));
    }

    pub fn on_logical_switches(
        &self,
        f: impl Fn(()) -> Result<Vec<LogicalSwitch>> + Send + Sync + 'static,
    ) {
        *self.logical_switches_handler.lock() = Some(Box::new(f));
    }

    pub fn on_logical_switch_ports(
        &self,
        f: impl Fn(()) -> Result<Vec<LogicalSwitchPort>> + Send + Sync + 'static,
    ) {
        *self.logical_switch_ports_handler.lock() = Some(Box::new(f));
    }

    pub fn on_list_commands(
        &self,
        f: impl Fn(Component) -> Result<BTreeSet<String>> + Send + Sync + 'static,
    ) {
        *self.list_commands_handler.lock() = Some(Box::new(f));
    }

    pub fn on_coverage(
        &self,
        f: impl Fn(Component) -> Result<CoverageCounters> + Send + Sync + 'static,
    ) {
        *self.coverage_handler.lock() = Some(Box::new(f));
    }

    pub fn on_memory(&self, f: impl Fn(Component) -> Result<MemoryCounters> + Send + Sync + 'static) {
        *self.memory_handler.lock() = Some(Box::new(f));
    }

    pub fn on_cluster_status(
        &self,
        f: impl Fn(Component) -> Result<ClusterStatus> + Send + Sync + 'static,
    ) {
        *self.cluster_status_handler.lock() = Some(Box::new(f));
    }

    pub fn on_port(
        &self,
        f: impl Fn((Component, PortKind)) -> Result<bool> + Send + Sync + 'static,
    ) {
        *self.port_handler.lock() = Some(Box::new(f));
    }

    /// Hold every `get_system_info` call, after it is recorded, until the
    /// returned gate is notified. Each `notify_one` releases one call.
    pub fn gate_system_info(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.system_info_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Make every call fail with a connection error.
    pub fn fail_everything(&self) {
        self.on_connect(|_| Err(mock_down()));
        self.on_system_identity(|_| Err(mock_down()));
        self.on_system_info(|_| Err(mock_down()));
        self.on_process_info(|_| Err(mock_down()));
        self.on_log_file_info(|_| Err(mock_down()));
        self.on_log_event_histogram(|_| Err(mock_down()));
        self.on_db_file_info(|_| Err(mock_down()));
        self.on_chassis(|_| Err(mock_down()));
        self.on_logical_switches(|_| Err(mock_down()));
        self.on_logical_switch_ports(|_| Err(mock_down()));
        self.on_list_commands(|_| Err(mock_down()));
        self.on_coverage(|_| Err(mock_down()));
        self.on_memory(|_| Err(mock_down()));
        self.on_cluster_status(|_| Err(mock_down()));
        self.on_port(|_| Err(mock_down()));
    }
}

impl Default for MockOvnClientStub {
    fn default() -> Self {
        Self::new()
    }
}

/// Capabilities a stock ovsdb-server advertises that the exporter cares about.
pub fn default_capabilities() -> BTreeSet<String> {
    ["coverage/show", "memory/show", "cluster/status DB"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[async_trait]
impl IOvnClientStub for MockOvnClientStub {
    async fn connect(&self) -> Result<()> {
        self.record("connect", None);
        dispatch(&self.connect_handler, (), |_| Ok(()))
    }

    async fn get_system_identity(&self) -> Result<String> {
        self.record("get_system_identity", None);
        dispatch(&self.system_identity_handler, (), |_| Ok(MOCK_SYSTEM_ID.to_string()))
    }

    async fn get_system_info(&self) -> Result<SystemInfo> {
        self.record("get_system_info", None);
        let gate = self.system_info_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        dispatch(&self.system_info_handler, (), |_| {
            Ok(SystemInfo {
                id: MOCK_SYSTEM_ID.to_string(),
                run_dir: "/var/run/openvswitch".into(),
                hostname: "mock-host".into(),
                system_type: "ubuntu".into(),
                system_version: "22.04".into(),
                ovs_version: "3.1.0".into(),
                db_version: "8.3.0".into(),
            })
        })
    }

    async fn get_process_info(&self, component: Component) -> Result<ProcessInfo> {
        self.record("get_process_info", Some(component));
        dispatch(&self.process_info_handler, component, |_| {
            Ok(ProcessInfo {
                pid: 1000,
                user: "openvswitch".into(),
                group: "openvswitch".into(),
            })
        })
    }

    async fn get_log_file_info(&self, component: Component) -> Result<FileInfo> {
        self.record("get_log_file_info", Some(component));
        dispatch(&self.log_file_info_handler, component, |c| {
            Ok(FileInfo {
                component: c,
                path: PathBuf::from(format!("/var/log/openvswitch/{}.log", c)),
                size: 1024,
            })
        })
    }

    async fn get_log_event_histogram(&self, component: Component) -> Result<LogEventHistogram> {
        self.record("get_log_event_histogram", Some(component));
        dispatch(&self.log_event_histogram_handler, component, |_| {
            Ok(LogEventHistogram::new())
        })
    }

    async fn get_db_file_info(&self, component: Component) -> Result<FileInfo> {
        self.record("get_db_file_info", Some(component));
        dispatch(&self.db_file_info_handler, component, |c| {
            Ok(FileInfo {
                component: c,
                path: PathBuf::from(format!("/var/lib/openvswitch/{}.db", c)),
                size: 4096,
            })
        })
    }

    async fn get_chassis(&self) -> Result<Vec<Chassis>> {
        self.record("get_chassis", None);
        dispatch(&self.chassis_handler, (), |_| Ok(Vec::new()))
    }

    async fn get_logical_switches(&self) -> Result<Vec<LogicalSwitch>> {
        self.record("get_logical_switches", None);
        dispatch(&self.logical_switches_handler, (), |_| Ok(Vec::new()))
    }

    async fn get_logical_switch_ports(&self) -> Result<Vec<LogicalSwitchPort>> {
        self.record("get_logical_switch_ports", None);
        dispatch(&self.logical_switch_ports_handler, (), |_| Ok(Vec::new()))
    }

    async fn list_commands(&self, component: Component) -> Result<BTreeSet<String>> {
        self.record("list_commands", Some(component));
        dispatch(&self.list_commands_handler, component, |_| {
            Ok(default_capabilities())
        })
    }

    async fn get_coverage_counters(&self, component: Component) -> Result<CoverageCounters> {
        self.record("get_coverage_counters", Some(component));
        dispatch(&self.coverage_handler, component, |_| Ok(CoverageCounters::new()))
    }

    async fn get_memory_counters(&self, component: Component) -> Result<MemoryCounters> {
        self.record("get_memory_counters", Some(component));
        dispatch(&self.memory_handler, component, |_| Ok(MemoryCounters::new()))
    }

    async fn get_cluster_status(&self, component: Component) -> Result<ClusterStatus> {
        self.record("get_cluster_status", Some(component));
        dispatch(&self.cluster_status_handler, component, |_| {
            Ok(ClusterStatus::default())
        })
    }

    async fn is_port_reachable(&self, component: Component, kind: PortKind) -> Result<bool> {
        self.record("is_port_reachable", Some(component));
        dispatch(&self.port_handler, (component, kind), |_| Ok(true))
    }
}
