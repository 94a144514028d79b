//! Which queries apply to which component.
//!
//! Collection order is the order of [`COMPONENT_TABLE`]; every query family
//! walks the table front to back and keeps the entries that carry it.

use ovn_types::Component;

use crate::config::DisableConfig;

/// Configuration switch that disables a component together with its
/// monitoring shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    OvsdbServer,
    OvsVswitchd,
    Northd,
    Northbound,
    Southbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFamily {
    /// pid, user and group.
    Process,
    /// Log file size, log event histogram and database file size.
    Logs,
    /// unixctl capabilities, coverage, memory and cluster status.
    Control,
    /// TCP port reachability.
    Ports,
}

#[derive(Debug, Clone, Copy)]
pub struct ComponentEntry {
    pub component: Component,
    pub toggle: Toggle,
    pub families: &'static [QueryFamily],
}

impl ComponentEntry {
    pub fn has(&self, family: QueryFamily) -> bool {
        self.families.contains(&family)
    }
}

use QueryFamily::{Control, Logs, Ports, Process};

pub const COMPONENT_TABLE: [ComponentEntry; 8] = [
    ComponentEntry {
        component: Component::OvsdbServer,
        toggle: Toggle::OvsdbServer,
        families: &[Process, Logs, Control],
    },
    ComponentEntry {
        component: Component::OvsdbServerSouthbound,
        toggle: Toggle::Southbound,
        families: &[Process, Logs, Control, Ports],
    },
    ComponentEntry {
        component: Component::OvsdbServerSouthboundMonitoring,
        toggle: Toggle::Southbound,
        families: &[Process],
    },
    ComponentEntry {
        component: Component::OvsdbServerNorthbound,
        toggle: Toggle::Northbound,
        families: &[Process, Logs, Control, Ports],
    },
    ComponentEntry {
        component: Component::OvsdbServerNorthboundMonitoring,
        toggle: Toggle::Northbound,
        families: &[Process],
    },
    ComponentEntry {
        component: Component::OvnNorthd,
        toggle: Toggle::Northd,
        families: &[Process, Logs],
    },
    ComponentEntry {
        component: Component::OvnNorthdMonitoring,
        toggle: Toggle::Northd,
        families: &[Process],
    },
    ComponentEntry {
        component: Component::OvsVswitchd,
        toggle: Toggle::OvsVswitchd,
        families: &[Process, Logs],
    },
];

/// Enabled components that take part in `family`, in collection order.
pub fn select(disable: &DisableConfig, family: QueryFamily) -> Vec<Component> {
    COMPONENT_TABLE
        .iter()
        .filter(|entry| entry.has(family) && !disable.is_disabled(entry.toggle))
        .map(|entry| entry.component)
        .collect()
}
