use anyhow::Context;
use clap::Parser;
use ovn_client::OvnClient;
use ovn_exporter::{http, Exporter, ExporterConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Prometheus exporter for Open Virtual Network
#[derive(Parser, Debug)]
#[command(name = "ovn-exporter", version, about)]
struct Args {
    /// Path to configuration file. Built-in defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dump default configuration and exit
    #[arg(long)]
    dump_default_config: bool,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Override the configured listen address, e.g. 0.0.0.0:9476
    #[arg(long)]
    listen_address: Option<String>,

    /// Override the configured poll interval, in seconds
    #[arg(long)]
    poll_interval: Option<u64>,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExporterConfig::default(),
        };
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(addr) = &self.listen_address {
            config.listen_address = addr.clone();
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => { tracing::info!("Received CTRL+C"); }
                _ = sigterm.recv() => { tracing::info!("Received SIGTERM"); }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for SIGTERM");
            let _ = ctrl_c.await;
            tracing::info!("Received CTRL+C");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        print!("{}", ExporterConfig::default().to_toml_string()?);
        return Ok(());
    }

    let config = args.load_config()?;
    let _log_guard = ovn_logging::init_logging(&config.log)?;
    let addr = config.socket_addr()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        poll_interval_secs = config.poll_interval_secs,
        timeout_secs = config.timeout_secs,
        "Starting OVN exporter"
    );

    let client = Arc::new(OvnClient::new(config.client.clone()));
    let exporter = Arc::new(Exporter::new(client, &config));
    exporter.initialize().await;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut server = tokio::spawn({
        let exporter = Arc::clone(&exporter);
        let metrics_path = config.metrics_path.clone();
        async move { http::serve(addr, &metrics_path, exporter, shutdown_rx).await }
    });

    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            let _ = shutdown_tx.send(());
        }
        result = &mut server => {
            result??;
            return Ok(());
        }
    }

    server.await??;
    tracing::info!(failed_requests = exporter.failed_requests(), "OVN exporter stopped");
    Ok(())
}
