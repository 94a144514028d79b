//! Parsers for the text that OVS/OVN unixctl commands return.

use ovn_types::{ClientError, ClusterPeer, ClusterRole, ClusterStatus, CoverageCounters, MemoryCounters, Result};
use std::collections::{BTreeMap, BTreeSet};

pub const COVERAGE_PERIODS: [&str; 3] = ["5s", "1m", "1h"];

/// `list-commands`: one command signature per line after a header line.
pub fn parse_list_commands(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .collect()
}

/// `coverage/show`:
///
/// ```text
/// Event coverage, avg rate over last: 5 seconds, last minute, last hour,  hash=1a2b3c4d:
/// txn_unchanged     0.0/sec     0.017/sec        0.0119/sec   total: 43
/// ```
pub fn parse_coverage(text: &str) -> CoverageCounters {
    let mut out = CoverageCounters::new();
    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 6 || tokens[4] != "total:" {
            continue;
        }
        let rates: Option<Vec<f64>> = tokens[1..4]
            .iter()
            .map(|t| t.strip_suffix("/sec").and_then(|v| v.parse().ok()))
            .collect();
        let (Some(rates), Ok(total)) = (rates, tokens[5].parse::<f64>()) else {
            continue;
        };
        let periods = out.entry(tokens[0].to_string()).or_default();
        for (period, rate) in COVERAGE_PERIODS.iter().zip(rates) {
            periods.insert(period.to_string(), rate);
        }
        periods.insert("total".to_string(), total);
    }
    out
}

/// `memory/show`: space separated `facility:value` pairs.
pub fn parse_memory(text: &str) -> MemoryCounters {
    text.split_whitespace()
        .filter_map(|pair| {
            let (k, v) = pair.split_once(':')?;
            Some((k.to_string(), v.parse::<f64>().ok()?))
        })
        .collect()
}

/// `cluster/status <db>`.
pub fn parse_cluster_status(text: &str) -> Result<ClusterStatus> {
    let mut status = ClusterStatus::default();
    let mut inbound = BTreeSet::new();
    let mut outbound = BTreeSet::new();
    let mut in_servers = false;

    for line in text.lines() {
        if in_servers && line.starts_with(char::is_whitespace) {
            if let Some((id, peer, is_self)) = parse_server_line(line) {
                if is_self {
                    status.next_index = peer.next_index;
                    status.match_index = peer.match_index;
                } else {
                    status.peers.insert(id, peer);
                }
            }
            continue;
        }
        in_servers = false;

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Cluster ID" => (status.cluster_id, status.cluster_uuid) = split_id(value),
            "Server ID" => (status.server_id, status.server_uuid) = split_id(value),
            "Status" => status.is_member = value == "cluster member",
            "Role" => status.role = ClusterRole::parse(value),
            "Term" => status.term = parse_u64(key, value)?,
            "Leader" => status.leader_self = value == "self",
            "Vote" => status.voted_self = value == "self",
            "Log" => (status.log_low, status.log_high) = parse_log_range(value)?,
            "Entries not yet committed" => status.uncommitted_entries = parse_u64(key, value)?,
            "Entries not yet applied" => status.unapplied_entries = parse_u64(key, value)?,
            "Connections" => {
                for conn in value.split_whitespace() {
                    if let Some(id) = conn.strip_prefix("->") {
                        outbound.insert(id.to_string());
                    } else if let Some(id) = conn.strip_prefix("<-") {
                        inbound.insert(id.to_string());
                    }
                }
            }
            "Servers" => in_servers = true,
            _ => {}
        }
    }

    if status.cluster_id.is_empty() {
        return Err(ClientError::Parse("cluster/status reply has no cluster id".into()));
    }

    status.inbound_connections = inbound.len() as u64;
    status.outbound_connections = outbound.len() as u64;
    for (id, peer) in status.peers.iter_mut() {
        peer.inbound = inbound.contains(id);
        peer.outbound = outbound.contains(id);
    }
    Ok(status)
}

/// `3e0a (3e0a8f2e-...)` -> (`3e0a`, `3e0a8f2e-...`)
fn split_id(value: &str) -> (String, String) {
    match value.split_once('(') {
        Some((short, rest)) => (
            short.trim().to_string(),
            rest.trim_end_matches(')').trim().to_string(),
        ),
        None => (value.to_string(), String::new()),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| ClientError::Parse(format!("{}: not a number: {}", key.trim(), value)))
}

/// `[2, 15]`
fn parse_log_range(value: &str) -> Result<(u64, u64)> {
    let inner = value.trim_start_matches('[').trim_end_matches(']');
    let (low, high) = inner
        .split_once(',')
        .ok_or_else(|| ClientError::Parse(format!("bad log range: {}", value)))?;
    Ok((parse_u64("Log", low.trim())?, parse_u64("Log", high.trim())?))
}

/// `    7a2b (7a2b at tcp:10.0.0.2:6643) next_index=15 match_index=14 last msg 100 ms ago`
fn parse_server_line(line: &str) -> Option<(String, ClusterPeer, bool)> {
    let line = line.trim();
    let (id, rest) = line.split_once(' ')?;
    let address = rest
        .split_once(" at ")
        .and_then(|(_, tail)| tail.split_once(')'))
        .map(|(addr, _)| addr.to_string())
        .unwrap_or_default();
    let mut peer = ClusterPeer {
        address,
        ..Default::default()
    };
    let mut fields: BTreeMap<&str, u64> = BTreeMap::new();
    for token in rest.split_whitespace() {
        if let Some((k, v)) = token.split_once('=') {
            if let Ok(v) = v.parse() {
                fields.insert(k, v);
            }
        }
    }
    peer.next_index = fields.get("next_index").copied().unwrap_or(0);
    peer.match_index = fields.get("match_index").copied().unwrap_or(0);
    Some((id.to_string(), peer, rest.contains("(self)")))
}
