//! Socket- and file-backed implementation of the OVN exporter's backend
//! client.
//!
//! Databases are read with OVSDB `transact`/`select` over JSON-RPC; daemon
//! internals (coverage, memory, raft state) come from their unixctl control
//! sockets; process and log information comes from pid files, `/proc`, and
//! the log files themselves.

pub mod client;
pub mod config;
pub mod jsonrpc;
pub mod logs;
pub mod ovsdb;
pub mod procfs;
pub mod unixctl;

pub use client::OvnClient;
pub use config::{ClientConfig, DatabaseConfig, ServiceConfig};
pub use jsonrpc::{Endpoint, JsonRpcConnection};
