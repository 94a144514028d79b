//! One collection pass over the backend.
//!
//! Queries run sequentially in a fixed order, each under its own timeout.
//! A failed query is logged and counted and the pass moves on; only system
//! info, process and topology failures mark the stack as down.

use ovn_monitor::Sample;
use ovn_stubs::IOvnClientStub;
use ovn_types::{ClientError, Component, PortKind, Result, SystemInfo};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::accounting::ErrorCounter;
use crate::cluster::{ClusterAggregator, ClusterState};
use crate::components::{select, QueryFamily};
use crate::config::DisableConfig;
use crate::metrics::{flag, MetricId, Metrics};

pub const CAP_COVERAGE: &str = "coverage/show";
pub const CAP_MEMORY: &str = "memory/show";
pub const CAP_CLUSTER: &str = "cluster/status DB";

/// Samples of one pass, before the baseline samples are appended.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    pub samples: Vec<Sample>,
    pub up: bool,
}

pub struct Collector {
    client: Arc<dyn IOvnClientStub>,
    metrics: Arc<Metrics>,
    errors: Arc<ErrorCounter>,
    timeout: Duration,
    disable: DisableConfig,
    /// Last system info that was fetched successfully.
    system: Mutex<SystemInfo>,
}

impl Collector {
    pub fn new(
        client: Arc<dyn IOvnClientStub>,
        metrics: Arc<Metrics>,
        errors: Arc<ErrorCounter>,
        timeout: Duration,
        disable: DisableConfig,
    ) -> Self {
        Self {
            client,
            metrics,
            errors,
            timeout,
            disable,
            system: Mutex::new(SystemInfo::default()),
        }
    }

    pub fn system_info(&self) -> SystemInfo {
        self.system.lock().clone()
    }

    /// Connect and read the system identity once at startup. Failures are
    /// counted but not fatal.
    pub async fn initialize(&self) {
        if self.query("connect", None, self.client.connect()).await.is_some() {
            info!("Connected to OVN databases");
        }
        if let Some(id) = self
            .query("get_system_identity", None, self.client.get_system_identity())
            .await
        {
            self.system.lock().id = id;
        }
        if let Some(info) = self.query("get_system_info", None, self.client.get_system_info()).await {
            self.store_system_info(info);
        }
    }

    fn store_system_info(&self, mut info: SystemInfo) {
        let mut system = self.system.lock();
        if info.id.is_empty() {
            info.id = std::mem::take(&mut system.id);
        }
        *system = info;
    }

    /// Run `fut` under the per-call timeout.
    async fn call<T>(
        &self,
        call: &'static str,
        component: Option<Component>,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let component_name = component.map(|c| c.as_str()).unwrap_or("-");
        debug!(call, component = component_name, "Calling backend");
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        };
        if result.is_ok() {
            debug!(call, component = component_name, "Backend call completed");
        }
        result
    }

    fn record_failure(&self, call: &'static str, component: Option<Component>, e: &ClientError) {
        let component_name = component.map(|c| c.as_str()).unwrap_or("-");
        error!(call, component = component_name, error = %e, "Backend call failed");
        self.errors.record_failure();
    }

    /// Like [`Collector::call`], but errors are logged and counted.
    async fn query<T>(
        &self,
        call: &'static str,
        component: Option<Component>,
        fut: impl Future<Output = Result<T>>,
    ) -> Option<T> {
        match self.call(call, component, fut).await {
            Ok(value) => Some(value),
            Err(e) => {
                self.record_failure(call, component, &e);
                None
            }
        }
    }

    /// Query every enabled component and build the pass's samples.
    pub async fn collect(&self) -> PassOutcome {
        let mut out = Vec::new();
        let mut up = true;

        match self.query("get_system_info", None, self.client.get_system_info()).await {
            Some(info) => self.store_system_info(info),
            None => up = false,
        }
        let system_id = self.system.lock().id.clone();
        let sys = system_id.as_str();

        up &= self.collect_processes(sys, &mut out).await;
        self.collect_logs(sys, &mut out).await;
        up &= self.collect_topology(sys, &mut out).await;

        let mut cluster = ClusterAggregator::new();
        self.collect_control(sys, &mut cluster, &mut out).await;
        cluster.finish(&self.metrics, sys, &mut out);
        self.collect_ports(sys, &cluster, &mut out).await;

        PassOutcome { samples: out, up }
    }

    /// `up`, `info`, `failed_req_count` and `next_poll`.
    pub fn baseline(&self, up: bool, next_poll: i64) -> Vec<Sample> {
        baseline_samples(&self.metrics, &self.system_info(), up, self.errors.get(), next_poll)
    }

    async fn collect_processes(&self, sys: &str, out: &mut Vec<Sample>) -> bool {
        let mut ok = true;
        for component in select(&self.disable, QueryFamily::Process) {
            let call = self.client.get_process_info(component);
            match self.query("get_process_info", Some(component), call).await {
                Some(p) => self.metrics.push(
                    out,
                    MetricId::Pid,
                    f64::from(p.pid),
                    &[sys, component.as_str(), p.user.as_str(), p.group.as_str()],
                ),
                None => ok = false,
            }
        }
        ok
    }

    async fn collect_logs(&self, sys: &str, out: &mut Vec<Sample>) {
        for component in select(&self.disable, QueryFamily::Logs) {
            let name = component.as_str();
            let call = self.client.get_log_file_info(component);
            if let Some(file) = self.query("get_log_file_info", Some(component), call).await {
                let path = file.path.display().to_string();
                self.metrics.push(
                    out,
                    MetricId::LogFileSize,
                    file.size as f64,
                    &[sys, file.component.as_str(), path.as_str()],
                );

                let call = self.client.get_log_event_histogram(component);
                if let Some(histogram) = self.query("get_log_event_histogram", Some(component), call).await {
                    for (severity, sources) in &histogram {
                        for (source, count) in sources {
                            self.metrics.push(
                                out,
                                MetricId::LogEventCount,
                                *count as f64,
                                &[sys, name, severity.as_str(), source.as_str()],
                            );
                        }
                    }
                }
            }

            if component.database_role().is_some() {
                let call = self.client.get_db_file_info(component);
                if let Some(file) = self.query("get_db_file_info", Some(component), call).await {
                    let path = file.path.display().to_string();
                    self.metrics.push(
                        out,
                        MetricId::DbFileSize,
                        file.size as f64,
                        &[sys, name, path.as_str()],
                    );
                }
            }
        }
    }

    /// Topology is read from the southbound database on every pass,
    /// whatever the disable flags say.
    async fn collect_topology(&self, sys: &str, out: &mut Vec<Sample>) -> bool {
        let mut ok = true;
        let m = &self.metrics;

        match self.query("get_chassis", None, self.client.get_chassis()).await {
            Some(chassis) => {
                for c in &chassis {
                    m.push(
                        out,
                        MetricId::ChassisInfo,
                        flag(c.up),
                        &[sys, c.uuid.as_str(), c.name.as_str(), c.ip.as_str()],
                    );
                }
            }
            None => ok = false,
        }

        match self
            .query("get_logical_switches", None, self.client.get_logical_switches())
            .await
        {
            Some(switches) => {
                for ls in &switches {
                    let uuid = ls.uuid.as_str();
                    m.push(out, MetricId::LogicalSwitchInfo, 1.0, &[sys, uuid, ls.name.as_str()]);
                    m.push(out, MetricId::LogicalSwitchPorts, ls.ports.len() as f64, &[sys, uuid]);
                    for port in &ls.ports {
                        m.push(out, MetricId::LogicalSwitchPortBinding, 1.0, &[sys, uuid, port.as_str()]);
                    }
                    for (key, value) in &ls.external_ids {
                        m.push(
                            out,
                            MetricId::LogicalSwitchExternalId,
                            1.0,
                            &[sys, uuid, key.as_str(), value.as_str()],
                        );
                    }
                    m.push(out, MetricId::LogicalSwitchTunnelKey, ls.tunnel_key as f64, &[sys, uuid]);
                }
            }
            None => ok = false,
        }

        match self
            .query("get_logical_switch_ports", None, self.client.get_logical_switch_ports())
            .await
        {
            Some(ports) => {
                for p in &ports {
                    m.push(
                        out,
                        MetricId::LogicalSwitchPortInfo,
                        1.0,
                        &[
                            sys,
                            p.uuid.as_str(),
                            p.name.as_str(),
                            p.chassis_uuid.as_str(),
                            p.logical_switch.as_str(),
                            p.datapath_uuid.as_str(),
                            p.port_binding_uuid.as_str(),
                            p.mac_address.as_str(),
                            p.ip_address.as_str(),
                        ],
                    );
                    m.push(
                        out,
                        MetricId::LogicalSwitchPortTunnelKey,
                        p.tunnel_key as f64,
                        &[sys, p.uuid.as_str()],
                    );
                }
            }
            None => ok = false,
        }

        ok
    }

    /// Coverage, memory and cluster status, each gated on the component
    /// advertising the command.
    async fn collect_control(&self, sys: &str, cluster: &mut ClusterAggregator, out: &mut Vec<Sample>) {
        for component in select(&self.disable, QueryFamily::Control) {
            let name = component.as_str();
            let call = self.client.list_commands(component);
            let Some(commands) = self.query("list_commands", Some(component), call).await else {
                continue;
            };

            if commands.contains(CAP_COVERAGE) {
                let call = self.client.get_coverage_counters(component);
                if let Some(coverage) = self.query("get_coverage_counters", Some(component), call).await {
                    for (event, periods) in &coverage {
                        for (period, value) in periods {
                            if period == "total" {
                                self.metrics
                                    .push(out, MetricId::CoverageTotal, *value, &[sys, name, event.as_str()]);
                            } else {
                                self.metrics.push(
                                    out,
                                    MetricId::CoverageAvg,
                                    *value,
                                    &[sys, name, event.as_str(), period.as_str()],
                                );
                            }
                        }
                    }
                }
            }

            if commands.contains(CAP_MEMORY) {
                let call = self.client.get_memory_counters(component);
                if let Some(memory) = self.query("get_memory_counters", Some(component), call).await {
                    for (facility, value) in &memory {
                        self.metrics.push(
                            out,
                            MetricId::MemoryUsage,
                            *value,
                            &[sys, name, facility.as_str()],
                        );
                    }
                }
            }

            let state = if commands.contains(CAP_CLUSTER) {
                let call = self.client.get_cluster_status(component);
                match self.call("get_cluster_status", Some(component), call).await {
                    Ok(status) => ClusterState::Enabled(Box::new(status)),
                    Err(ClientError::Unsupported { .. }) => {
                        debug!(component = name, "Database is not clustered");
                        ClusterState::Disabled
                    }
                    Err(e) => {
                        self.record_failure("get_cluster_status", Some(component), &e);
                        ClusterState::Disabled
                    }
                }
            } else {
                ClusterState::Unsupported
            };
            cluster.observe(&self.metrics, sys, component, &state, out);
        }
    }

    /// Default and SSL ports always; the raft port only for a component whose
    /// cluster query succeeded in this pass.
    async fn collect_ports(&self, sys: &str, cluster: &ClusterAggregator, out: &mut Vec<Sample>) {
        for component in select(&self.disable, QueryFamily::Ports) {
            let mut kinds = vec![PortKind::Default, PortKind::Ssl];
            if cluster.is_enabled(component) {
                kinds.push(PortKind::Raft);
            }
            for kind in kinds {
                let call = self.client.is_port_reachable(component, kind);
                if let Some(reachable) = self.query("is_port_reachable", Some(component), call).await {
                    self.metrics.push(
                        out,
                        MetricId::NetworkPort,
                        flag(reachable),
                        &[sys, component.as_str(), kind.as_str()],
                    );
                }
            }
        }
    }
}

pub fn baseline_samples(
    metrics: &Metrics,
    system: &SystemInfo,
    up: bool,
    failures: u64,
    next_poll: i64,
) -> Vec<Sample> {
    let sys = system.id.as_str();
    let mut out = Vec::with_capacity(4);
    metrics.push(&mut out, MetricId::Up, flag(up), &[]);
    metrics.push(
        &mut out,
        MetricId::Info,
        1.0,
        &[
            sys,
            system.run_dir.as_str(),
            system.hostname.as_str(),
            system.system_type.as_str(),
            system.system_version.as_str(),
            system.ovs_version.as_str(),
            system.db_version.as_str(),
        ],
    );
    metrics.push(&mut out, MetricId::FailedRequests, failures as f64, &[sys]);
    metrics.push(&mut out, MetricId::NextPoll, next_poll as f64, &[sys]);
    out
}
