//! # Mongo gRPC Proxy Entry Point
//!
//! The main executable. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    `tracing` subscriber.
//! 2. **Connection**: Connects to MongoDB and binds the configured collection.
//! 3. **Serving**: Binds the listen address and serves `mongo.CollectionProxy` until Ctrl-C.
//!
//! Any startup failure is printed to standard error and ends the process with status 1.
mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, ProxyConfig};
use colored::Colorize;
use mongo_grpc_core::{service::CollectionProxyService, store::mongo::MongoCollection};
use std::{process, sync::Arc};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    init_logging(&args);

    if let Err(err) = run(args.config()).await {
        eprintln!("{} {err:#}", "[fatal]".red().bold());
        process::exit(1);
    }
}

/// `RUST_LOG` wins over the `-v` flags when set.
fn init_logging(args: &Cli) {
    let filter = EnvFilter::builder()
        .with_default_directive(args.log_level().into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!args.no_color)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: ProxyConfig) -> anyhow::Result<()> {
    debug!(uri = %config.uri, "Connecting");
    debug!(database = %config.database, "Using database");
    debug!(collection = %config.collection, "Using collection");

    let store = MongoCollection::connect(&config.uri, &config.database, &config.collection)
        .await
        .with_context(|| format!("Failed to connect to '{}'", config.uri))?;

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind '{}'", config.addr))?;
    let addr = listener.local_addr()?;

    info!("Listening on {addr}");

    Server::builder()
        .add_service(CollectionProxyService::new(Arc::new(store)).into_server())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown_signal())
        .await
        .context("gRPC server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    // An error here means no handler could be installed, keep serving
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    } else {
        std::future::pending::<()>().await;
    }
}
