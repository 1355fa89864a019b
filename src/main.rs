//! CLA bot allowlisting service
//!
//! Serves `skip_cla` allowlist checks over stdio or HTTP.

use clap::Parser;
use skip_cla::{
    allowlist::AllowlistResolver,
    config::{LogFormat, TransportMode, load_config},
    events::TracingEventSink,
    metrics::RequestMetrics,
    server::AllowlistService,
    store::{InMemoryOrganizationStore, OrganizationStore},
    transport::{HttpConfig, run_http, run_stdio},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// CLA bot allowlisting service
#[derive(Parser, Debug)]
#[command(name = "skip-cla")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SKIP_CLA_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SKIP_CLA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Transport mode (stdio, http)
    #[arg(long, env = "SKIP_CLA_TRANSPORT")]
    transport: Option<String>,

    /// HTTP server host (for http transport)
    #[arg(long, env = "SKIP_CLA_HTTP_HOST")]
    http_host: Option<String>,

    /// HTTP server port (for http transport)
    #[arg(long, env = "SKIP_CLA_HTTP_PORT")]
    http_port: Option<u16>,

    /// JSON file with organization records (overrides store.organizations_path)
    #[arg(long, env = "SKIP_CLA_ORGANIZATIONS")]
    organizations: Option<String>,
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so the configured format applies
    let config = load_config(args.config.as_deref())?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, config.logging.format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        grammar = %config.allowlist.grammar,
        "Starting skip-cla"
    );

    // Load organization records
    let organizations_path = args
        .organizations
        .as_deref()
        .or(config.store.organizations_path.as_deref());
    let store: Arc<dyn OrganizationStore> = match organizations_path {
        Some(path) => Arc::new(
            InMemoryOrganizationStore::from_path(path)
                .inspect_err(|e| error!(error = %e, "Failed to load organization records"))?,
        ),
        None => {
            warn!("No organizations file configured, every lookup will fail");
            Arc::new(InMemoryOrganizationStore::new())
        }
    };

    let resolver = Arc::new(AllowlistResolver::new(
        &config.allowlist,
        Arc::new(TracingEventSink),
    ));
    let metrics = Arc::new(RequestMetrics::new(Duration::from_secs(
        config.metrics.ttl_secs,
    )));
    let service = AllowlistService::new_with_shared(&config, resolver, store, metrics);

    // Determine transport mode
    let transport = args
        .transport
        .as_deref()
        .map(|t| match t {
            "stdio" => TransportMode::Stdio,
            "http" => TransportMode::Http,
            _ => config.server.transport,
        })
        .unwrap_or(config.server.transport);

    match transport {
        TransportMode::Stdio => run_stdio(service).await?,
        TransportMode::Http => {
            let host = args.http_host.as_deref().unwrap_or(&config.server.host);
            let port = args.http_port.unwrap_or(config.server.port);
            let http_config = HttpConfig::from_host_port(host, port)?;
            run_http(service, http_config).await?;
        }
    }

    Ok(())
}
