//! Greeks Server
//!
//! REST API serving implied volatility and Greeks for an option universe.

use anyhow::Context;
use clap::Parser;
use greeks_server::config::{build_config, CliArgs as ConfigCliArgs};
use greeks_server::server::Server;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Greeks Server - REST API for option implied volatility and Greeks
#[derive(Parser, Debug)]
#[command(name = "greeks_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, env = "GREEKS_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "GREEKS_SERVER_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GREEKS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Spot series CSV
    #[arg(long, value_name = "FILE", env = "GREEKS_SPOT_CSV")]
    spot_csv: Option<PathBuf>,

    /// Directory of per-instrument option CSVs
    #[arg(long, value_name = "DIR", env = "GREEKS_OPTIONS_DIR")]
    options_dir: Option<PathBuf>,
}

impl From<Args> for ConfigCliArgs {
    fn from(args: Args) -> Self {
        ConfigCliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            spot_csv: args.spot_csv,
            options_dir: args.options_dir,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_args: ConfigCliArgs = args.into();
    let config = build_config(&cli_args).context("invalid configuration")?;

    init_tracing(config.log_level.as_filter_str());

    tracing::info!("Greeks Server v{}", greeks_server::VERSION);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_level = %config.log_level,
        environment = %config.environment,
        spot_csv = %config.data.spot_csv.display(),
        options_dir = %config.data.options_dir.display(),
        series_ttl_secs = config.cache.series_ttl_secs,
        result_ttl_secs = config.cache.result_ttl_secs,
        "Server configuration loaded"
    );

    let server = Server::new(config);
    let addr = server.socket_addr().context("invalid bind address")?;
    tracing::info!(address = %addr, "Starting server");

    server.run().await.context("server error")?;

    Ok(())
}
