//! Population Gravity API Server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gravity_engine::CellStoreRoot;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use gravity_api::config::ApiConfig;
use gravity_api::routes;
use gravity_api::state::AppState;

/// Population Gravity API Server
#[derive(Parser, Debug)]
#[command(name = "gravity-api")]
#[command(about = "Distance and travel-time population gravity queries over HTTP")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8090", env = "GRAVITY_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "GRAVITY_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Directory holding per-origin travel-time files
    #[arg(long, env = "TRAVEL_TIME_DATA_DIR")]
    travel_time_dir: Option<PathBuf>,

    /// Base URL serving per-origin travel-time files (takes precedence over the directory)
    #[arg(long, env = "TRAVEL_TIME_DATA_URL")]
    travel_time_url: Option<String>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Remote raster reads block on the runtime, which needs worker threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting population gravity API server");

    let mut config = ApiConfig::from_env();
    if let Some(url) = args.travel_time_url {
        config.travel_time_root = Some(CellStoreRoot::BaseUrl(url));
    } else if let Some(dir) = args.travel_time_dir {
        config.travel_time_root = Some(CellStoreRoot::Directory(dir));
    }

    if !config.raster.has_source() {
        tracing::warn!(
            "No population raster configured; population queries will fail until \
             POPULATION_RASTER_PATH or POPULATION_RASTER_URL is set"
        );
    }

    let state = Arc::new(AppState::new(config, Some(prometheus_handle))?);
    let app = routes::router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Gravity API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
