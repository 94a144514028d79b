//! Backend client interface for the OVN exporter.
//!
//! [`IOvnClientStub`] is everything the collection pipeline needs from the
//! OVS/OVN stack. The socket-backed implementation lives in `ovn-client`;
//! [`MockOvnClientStub`] answers from closures and is what the pipeline
//! tests run against.

pub mod client_stub;
pub mod mock;

pub use client_stub::IOvnClientStub;
pub use mock::{default_capabilities, MockCall, MockOvnClientStub, MOCK_SYSTEM_ID};
