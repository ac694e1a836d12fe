//! resilient-client command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   host signals (stdin) ──▶ ConnectivityMonitor ◀── HttpProbe (periodic)
//!                                   │
//!                                   ▼ ConnectivityReader
//!   CLI command ──▶ ResilientClient::request / health_check / diagnose
//!                        │  gate → deadline → classify → retry/backoff
//!                        ▼
//!                  ReqwestTransport ──▶ network
//!
//!   observers: TracingObserver, MetricsObserver, DiagnosticsRecorder
//!   config watcher (monitor mode) ──▶ default retry policy swap
//! ```

use std::error::Error;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use resilient_client::config::watcher::{apply_policy_updates, ConfigWatcher};
use resilient_client::config::{load_config, ClientConfig};
use resilient_client::connectivity::{
    connectivity_channel, ConnectivityMonitor, HostEvent, HttpProbe,
};
use resilient_client::health::HealthTarget;
use resilient_client::http::{ClientBuilder, ReqwestTransport, RequestOptions, Transport};
use resilient_client::lifecycle::signals::interrupted;
use resilient_client::lifecycle::Shutdown;
use resilient_client::observability::logging::init_logging;
use resilient_client::observability::metrics::init_metrics;
use resilient_client::observability::{DiagnosticsRecorder, MetricsObserver, TracingObserver};

#[derive(Parser)]
#[command(name = "resilient-client")]
#[command(version, about = "HTTP requests with bounded retries and connectivity awareness", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request through the retry pipeline
    Request {
        url: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// "Name: value", repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        #[arg(short = 'd', long)]
        data: Option<String>,

        /// Total attempts, overriding the configured policy
        #[arg(long)]
        max_retries: Option<u32>,

        /// Per-attempt deadline, overriding the configured policy
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Check the configured (or given) targets once
    Health {
        /// name=url, repeatable; replaces the configured targets
        #[arg(long = "target")]
        targets: Vec<String>,
    },
    /// Check connectivity and targets, then print suggestions
    Diagnose {
        #[arg(long = "target")]
        targets: Vec<String>,
    },
    /// Track connectivity until interrupted; reads "online"/"offline" lines on stdin
    Monitor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "resilient-client starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config.transport)?);

    // Connectivity
    let (writer, reader) = connectivity_channel();
    let mut monitor = ConnectivityMonitor::new(writer, &config.connectivity);
    if let Some(probe_url) = &config.connectivity.probe_url {
        let probe = HttpProbe::new(
            transport.clone(),
            Url::parse(probe_url)?,
            Duration::from_millis(config.connectivity.probe_timeout_ms),
        );
        monitor = monitor.with_probe(Arc::new(probe));
    }
    let (host_tx, host_rx) = mpsc::unbounded_channel();
    let monitor_task = tokio::spawn(monitor.run(host_rx, shutdown.subscribe()));

    let diagnostics = Arc::new(DiagnosticsRecorder::new(config.observability.recent_attempts));
    let client = ClientBuilder::from_config(&config)
        .transport(transport)
        .connectivity(reader.clone())
        .observer(Arc::new(TracingObserver))
        .observer(Arc::new(MetricsObserver))
        .observer(diagnostics.clone())
        .build()?;

    let outcome = match cli.command {
        Commands::Request {
            url,
            method,
            headers,
            data,
            max_retries,
            timeout_ms,
        } => {
            let mut options = RequestOptions::new(Method::from_bytes(method.to_uppercase().as_bytes())?);
            for header in &headers {
                let (name, value) = parse_header(header)?;
                options = options.header(name, value);
            }
            if let Some(data) = data {
                options = options.body(data);
            }

            let mut policy = (*client.default_policy()).clone();
            if let Some(n) = max_retries {
                policy = policy.with_max_retries(n);
            }
            if let Some(ms) = timeout_ms {
                policy = policy.with_timeout(Duration::from_millis(ms));
            }

            let cancel = CancellationToken::new();
            let interrupt = tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    interrupted().await;
                    cancel.cancel();
                }
            });

            let result = client
                .request(&url, options.signal(cancel), Some(&policy))
                .await;
            interrupt.abort();

            match result {
                Ok(response) => {
                    println!("HTTP {}", response.status);
                    println!("{}", response.text());
                    Ok(())
                }
                Err(err) => {
                    eprintln!("{}", err.user_message());
                    Err(Box::new(err) as Box<dyn Error>)
                }
            }
        }
        Commands::Health { targets } => {
            let targets = resolve_targets(&targets, &config)?;
            let reports = client.health_check(&targets).await;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            Ok(())
        }
        Commands::Diagnose { targets } => {
            let targets = resolve_targets(&targets, &config)?;
            let report = client.diagnose(&targets).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_clear() {
                println!("No problems found.");
            }
            for suggestion in &report.suggestions {
                println!("- {suggestion}");
            }
            Ok(())
        }
        Commands::Monitor => {
            let _watcher = match &cli.config {
                Some(path) => {
                    let (watcher, updates) = ConfigWatcher::new(path);
                    tokio::spawn(apply_policy_updates(
                        client.clone(),
                        updates,
                        shutdown.subscribe(),
                    ));
                    Some(watcher.run()?)
                }
                None => None,
            };

            forward_stdin(host_tx.clone());

            reader
                .follow(interrupted(), |event| {
                    println!(
                        "{} (via {:?})",
                        if event.is_online { "online" } else { "offline" },
                        event.source
                    )
                })
                .await;
            Ok(())
        }
    };

    drop(host_tx);
    let receivers = shutdown.trigger();
    tracing::debug!(receivers, "Shutdown signalled");
    if let Err(e) = monitor_task.await {
        tracing::error!(error = %e, "Connectivity monitor task failed");
    }

    let summary = diagnostics.summary();
    if summary.requests > 0 {
        eprint!("{summary}");
    }

    tracing::info!("Shutdown complete");
    outcome
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), Box<dyn Error>> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header must look like 'Name: value', got '{raw}'"))?;
    Ok((
        HeaderName::from_bytes(name.trim().as_bytes())?,
        HeaderValue::from_str(value.trim())?,
    ))
}

fn resolve_targets(raw: &[String], config: &ClientConfig) -> Result<Vec<HealthTarget>, Box<dyn Error>> {
    if raw.is_empty() {
        return Ok(config.health.targets.clone());
    }
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(name, url)| HealthTarget::new(name, url))
                .ok_or_else(|| -> Box<dyn Error> {
                    format!("target must look like 'name=url', got '{entry}'").into()
                })
        })
        .collect()
}

/// Map stdin lines to host connectivity signals.
///
/// Runs on a detached thread so a pending read never holds up shutdown.
fn forward_stdin(tx: mpsc::UnboundedSender<HostEvent>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read host signals");
                    break;
                }
            };
            let event = match line.trim() {
                "online" => HostEvent::Online,
                "offline" => HostEvent::Offline,
                "" => continue,
                other => {
                    tracing::warn!(input = other, "Ignoring unknown host signal");
                    continue;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}
