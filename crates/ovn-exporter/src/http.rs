//! HTTP scrape endpoint.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use ovn_monitor::content_type;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::exporter::Exporter;

type Body = Full<Bytes>;

fn build_response(status: StatusCode, content_type: &str, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

fn landing_page(metrics_path: &str) -> String {
    format!(
        "<html>\n<head><title>OVN Exporter</title></head>\n<body>\n<h1>OVN Exporter</h1>\n<p><a href=\"{}\">Metrics</a></p>\n</body>\n</html>\n",
        metrics_path
    )
}

async fn handle_request(
    req: Request<Incoming>,
    exporter: Arc<Exporter>,
    metrics_path: Arc<str>,
) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path();
    let response = match req.method() {
        &Method::GET if path == &*metrics_path => match exporter.render().await {
            Ok(body) => build_response(StatusCode::OK, &content_type(), body),
            Err(e) => {
                error!(error = %e, "Cannot encode metrics");
                build_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain; charset=utf-8",
                    format!("{}\n", e),
                )
            }
        },
        &Method::GET if path == "/" => {
            build_response(StatusCode::OK, "text/html; charset=utf-8", landing_page(&metrics_path))
        }
        _ => build_response(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", "not found\n".to_string()),
    };
    debug!(method = %req.method(), path, status = %response.status(), "Scrape request");
    Ok(response)
}

/// Bind `addr` and serve until `shutdown_rx` fires.
pub async fn serve(
    addr: SocketAddr,
    metrics_path: &str,
    exporter: Arc<Exporter>,
    shutdown_rx: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, metrics_path, "Listening for scrapes");
    serve_listener(listener, metrics_path, exporter, shutdown_rx).await;
    Ok(())
}

pub async fn serve_listener(
    listener: TcpListener,
    metrics_path: &str,
    exporter: Arc<Exporter>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let metrics_path: Arc<str> = Arc::from(metrics_path);
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _peer)) => {
                        let io = TokioIo::new(stream);
                        let exporter = Arc::clone(&exporter);
                        let metrics_path = Arc::clone(&metrics_path);

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                handle_request(req, Arc::clone(&exporter), Arc::clone(&metrics_path))
                            });
                            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                debug!(error = %e, "Scrape connection error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Scrape server shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExporterConfig;
    use ovn_stubs::MockOvnClientStub;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_routes() {
        let mock = MockOvnClientStub::new().into_arc();
        let exporter = Arc::new(Exporter::new(mock.clone(), &ExporterConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let server = tokio::spawn(async move {
            serve_listener(listener, "/metrics", exporter, shutdown_rx).await
        });

        let reply = get(addr, "/metrics").await;
        assert!(reply.starts_with("HTTP/1.1 200 OK"));
        assert!(reply.contains("text/plain; version=0.0.4"));
        assert!(reply.contains("# TYPE ovn_up gauge"));
        assert_eq!(mock.call_count("get_system_info"), 1);

        let reply = get(addr, "/").await;
        assert!(reply.starts_with("HTTP/1.1 200 OK"));
        assert!(reply.contains("<a href=\"/metrics\">"));

        let reply = get(addr, "/nope").await;
        assert!(reply.starts_with("HTTP/1.1 404"));

        shutdown_tx.send(()).unwrap();
        server.await.unwrap();
    }
}
