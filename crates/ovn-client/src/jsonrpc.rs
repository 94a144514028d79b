//! JSON-RPC 1.0 over stream sockets, as spoken by ovsdb-server and by every
//! OVS/OVN unixctl control socket.
//!
//! Messages are bare concatenated JSON objects with no framing, so replies
//! are decoded incrementally from a growing buffer.

use ovn_types::{ClientError, Result};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

/// Where a database or control socket listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    /// `host:port`
    Tcp(String),
}

impl FromStr for Endpoint {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(path) = s.strip_prefix("unix:") {
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = s.strip_prefix("tcp:") {
            if addr.rsplit_once(':').is_none() {
                return Err(ClientError::Parse(format!("tcp endpoint without port: {}", s)));
            }
            return Ok(Endpoint::Tcp(addr.to_string()));
        }
        if s.starts_with('/') {
            return Ok(Endpoint::Unix(PathBuf::from(s)));
        }
        Err(ClientError::Parse(format!("unsupported endpoint: {}", s)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

const READ_CHUNK: usize = 16 * 1024;

/// A single JSON-RPC session.
pub struct JsonRpcConnection {
    endpoint: String,
    stream: Box<dyn Stream>,
    buf: Vec<u8>,
    next_id: u64,
}

impl JsonRpcConnection {
    pub async fn connect(endpoint: &Endpoint) -> Result<Self> {
        let connection_error = |e: std::io::Error| ClientError::Connection {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        };
        let stream: Box<dyn Stream> = match endpoint {
            Endpoint::Unix(path) => Box::new(UnixStream::connect(path).await.map_err(connection_error)?),
            Endpoint::Tcp(addr) => Box::new(TcpStream::connect(addr.as_str()).await.map_err(connection_error)?),
        };
        tracing::trace!(endpoint = %endpoint, "jsonrpc connected");
        Ok(Self {
            endpoint: endpoint.to_string(),
            stream,
            buf: Vec::new(),
            next_id: 0,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a request and wait for the reply with the matching id.
    ///
    /// `echo` requests from the peer are answered while waiting; other
    /// notifications are dropped.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&json!({ "id": id, "method": method, "params": params }))
            .await?;

        loop {
            let msg = self.read_message().await?;
            if let Some(peer_method) = msg.get("method").and_then(Value::as_str) {
                if peer_method == "echo" {
                    let reply = json!({
                        "id": msg.get("id").cloned().unwrap_or(Value::Null),
                        "result": msg.get("params").cloned().unwrap_or(Value::Null),
                        "error": Value::Null,
                    });
                    self.send(&reply).await?;
                }
                continue;
            }
            if msg.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }
            match msg.get("error") {
                None | Some(Value::Null) => {}
                Some(err) => {
                    let text = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
                    return Err(ClientError::Rpc(format!("{}: {}", method, text.trim())));
                }
            }
            return Ok(msg.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    async fn send(&mut self, msg: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(msg)?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_message(&mut self) -> Result<Value> {
        loop {
            if let Some(msg) = self.try_decode()? {
                return Ok(msg);
            }
            let mut chunk = vec![0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(ClientError::Protocol(format!(
                    "{} closed the connection before replying",
                    self.endpoint
                )));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn try_decode(&mut self) -> Result<Option<Value>> {
        let (decoded, consumed) = {
            let mut stream = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            match stream.next() {
                Some(Ok(v)) => (Some(v), stream.byte_offset()),
                Some(Err(e)) if e.is_eof() => (None, 0),
                Some(Err(e)) => return Err(ClientError::Protocol(e.to_string())),
                None => (None, self.buf.len()),
            }
        };
        self.buf.drain(..consumed);
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    fn socket_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ovn-client-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("peer.sock")
    }

    #[test]
    fn test_endpoint_parse() {
        assert_eq!(
            "unix:/run/openvswitch/ovnnb_db.sock".parse::<Endpoint>().unwrap(),
            Endpoint::Unix(PathBuf::from("/run/openvswitch/ovnnb_db.sock"))
        );
        assert_eq!(
            "tcp:10.0.0.1:6641".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("10.0.0.1:6641".into())
        );
        assert_eq!(
            "/var/run/openvswitch/db.sock".parse::<Endpoint>().unwrap(),
            Endpoint::Unix(PathBuf::from("/var/run/openvswitch/db.sock"))
        );
        assert!("ssl:10.0.0.1:6641".parse::<Endpoint>().is_err());
        assert!("tcp:nohost".parse::<Endpoint>().is_err());
        assert_eq!(
            Endpoint::Tcp("h:1".into()).to_string(),
            "tcp:h:1"
        );
    }

    #[tokio::test]
    async fn test_call_skips_echo_and_splits_reply() {
        let path = socket_path("echo");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = sock.read(&mut buf).await.unwrap();
            let req: Value = serde_json::from_slice(&buf[..n]).unwrap();
            assert_eq!(req["method"], "list-commands");
            let id = req["id"].clone();

            sock.write_all(br#"{"id":"echo","method":"echo","params":[]}"#)
                .await
                .unwrap();
            let n = sock.read(&mut buf).await.unwrap();
            let echo_reply: Value = serde_json::from_slice(&buf[..n]).unwrap();
            assert_eq!(echo_reply["id"], "echo");

            let reply = serde_json::to_vec(&json!({"id": id, "result": "ok", "error": null})).unwrap();
            let (a, b) = reply.split_at(reply.len() / 2);
            sock.write_all(a).await.unwrap();
            sock.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            sock.write_all(b).await.unwrap();
        });

        let mut conn = JsonRpcConnection::connect(&Endpoint::Unix(path.clone()))
            .await
            .unwrap();
        let result = conn.call("list-commands", json!([])).await.unwrap();
        assert_eq!(result, json!("ok"));
        server.await.unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_call_reports_rpc_error() {
        let path = socket_path("error");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = sock.read(&mut buf).await.unwrap();
            let req: Value = serde_json::from_slice(&buf[..n]).unwrap();
            let reply = json!({"id": req["id"], "result": null, "error": "unknown database\n"});
            sock.write_all(&serde_json::to_vec(&reply).unwrap())
                .await
                .unwrap();
        });

        let mut conn = JsonRpcConnection::connect(&Endpoint::Unix(path.clone()))
            .await
            .unwrap();
        let err = conn
            .call("cluster/status", json!(["Open_vSwitch"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rpc(ref m) if m == "cluster/status: unknown database"));
        server.await.unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_connect_missing_socket() {
        let err = JsonRpcConnection::connect(&Endpoint::Unix("/nonexistent/ovn.sock".into()))
            .await
            .err()
            .unwrap();
        assert!(err.is_connectivity());
    }
}
