//! FlashStore Server Binary
//!
//! Serves the static files of a data directory over HTTP.

use clap::Parser;
use flashstore::network::Server;
use flashstore::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// FlashStore static-file server
#[derive(Parser, Debug)]
#[command(name = "flashstore-server")]
#[command(about = "Serve files from a FlashStore data directory over HTTP")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./flashstore_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Maximum requests served at once
    #[arg(short, long, default_value = "4")]
    max_connections: usize,

    /// Per-request timeout in milliseconds
    #[arg(short = 't', long, default_value = "5000")]
    request_timeout_ms: u64,

    /// File served for directory paths
    #[arg(short, long, default_value = "index.htm")]
    index_file: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flashstore=debug,tower_http=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("FlashStore Server v{}", flashstore::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .request_timeout_ms(args.request_timeout_ms)
        .index_file(&args.index_file)
        .build();

    let server = match Server::bind(config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    };

    if let Err(e) = server.run_until(shutdown).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
