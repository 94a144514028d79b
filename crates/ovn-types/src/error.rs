use thiserror::Error;

use crate::component::Component;

/// Errors returned by the backend client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The socket or endpoint could not be reached.
    #[error("connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    /// The call did not complete within the per-call timeout.
    #[error("timeout")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The peer sent something that is not valid JSON-RPC.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The peer answered the call with an error object.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// A reply or file could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0} is not running")]
    NotRunning(Component),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{component} does not support {what}")]
    Unsupported { component: Component, what: String },
}

impl ClientError {
    /// Whether the error means the backend could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ClientError::Connection { .. } | ClientError::Timeout | ClientError::NotRunning(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_connection() {
        let err = ClientError::Connection {
            endpoint: "unix:/run/openvswitch/ovnnb_db.sock".into(),
            reason: "no such file".into(),
        };
        assert_eq!(
            err.to_string(),
            "connection to unix:/run/openvswitch/ovnnb_db.sock failed: no such file"
        );
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_display_not_running() {
        let err = ClientError::NotRunning(Component::OvnNorthd);
        assert_eq!(err.to_string(), "ovn-northd is not running");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ClientError = io_err.into();
        assert!(matches!(err, ClientError::Io(_)));
        assert!(!err.is_connectivity());
    }
}
