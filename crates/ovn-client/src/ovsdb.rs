//! OVSDB `transact` reads and datum decoding (RFC 7047).

use ovn_types::{ClientError, Result};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::jsonrpc::JsonRpcConnection;

pub type Row = Map<String, Value>;

impl JsonRpcConnection {
    /// `select` every row of `table`, returning only `columns`.
    pub async fn select(&mut self, db: &str, table: &str, columns: &[&str]) -> Result<Vec<Row>> {
        let params = json!([
            db,
            { "op": "select", "table": table, "where": [], "columns": columns }
        ]);
        let result = self.call("transact", params).await?;
        let first = result
            .as_array()
            .and_then(|ops| ops.first())
            .ok_or_else(|| ClientError::Protocol(format!("empty transact reply for {}", table)))?;
        if let Some(err) = first.get("error") {
            let details = first.get("details").and_then(Value::as_str).unwrap_or("");
            return Err(ClientError::Rpc(format!("select {}: {} {}", table, err, details).trim_end().to_string()));
        }
        let rows = first
            .get("rows")
            .and_then(Value::as_array)
            .ok_or_else(|| ClientError::Protocol(format!("no rows in reply for {}", table)))?;
        Ok(rows
            .iter()
            .filter_map(|row| row.as_object().cloned())
            .collect())
    }

    pub async fn echo(&mut self) -> Result<()> {
        self.call("echo", json!([])).await.map(|_| ())
    }
}

/// Decode an atom: a string, a number, a boolean, or `["uuid", ...]`.
pub fn atom_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(pair) if pair.len() == 2 && pair[0] == "uuid" => {
            pair[1].as_str().map(str::to_string)
        }
        _ => None,
    }
}

/// Decode a set datum. A bare atom is a one-element set.
pub fn datum_set(value: &Value) -> Vec<String> {
    match value {
        Value::Array(pair) if pair.len() == 2 && pair[0] == "set" => pair[1]
            .as_array()
            .map(|items| items.iter().filter_map(atom_string).collect())
            .unwrap_or_default(),
        other => atom_string(other).into_iter().collect(),
    }
}

pub fn datum_map(value: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if let Value::Array(pair) = value {
        if pair.len() == 2 && pair[0] == "map" {
            for entry in pair[1].as_array().into_iter().flatten() {
                if let Some(kv) = entry.as_array() {
                    if let (Some(k), Some(v)) = (
                        kv.first().and_then(atom_string),
                        kv.get(1).and_then(atom_string),
                    ) {
                        out.insert(k, v);
                    }
                }
            }
        }
    }
    out
}

pub fn column_string(row: &Row, column: &str) -> String {
    row.get(column)
        .map(datum_set)
        .and_then(|set| set.into_iter().next())
        .unwrap_or_default()
}

pub fn column_u64(row: &Row, column: &str) -> u64 {
    row.get(column).and_then(Value::as_u64).unwrap_or(0)
}

pub fn column_map(row: &Row, column: &str) -> BTreeMap<String, String> {
    row.get(column).map(datum_map).unwrap_or_default()
}

pub fn column_set(row: &Row, column: &str) -> Vec<String> {
    row.get(column).map(datum_set).unwrap_or_default()
}
