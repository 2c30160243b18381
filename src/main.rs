use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use datadog_extension::config::load_config;
use datadog_extension::datadog::DatadogClient;
use datadog_extension::http::{AppState, HttpServer};
use datadog_extension::lifecycle::Shutdown;
use datadog_extension::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "datadog-extension")]
#[command(about = "Datadog monitor actions for chaos experiments", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "datadog-extension starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        site_url = %config.datadog.site_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses when metrics are enabled.
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let datadog = DatadogClient::new(&config.datadog)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let server = HttpServer::new(AppState::new(config, datadog));
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
