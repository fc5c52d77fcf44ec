mod cli;
mod server;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};

use chainlens_core::rpc::{redact_connection, HttpRpcClient, NodeRpc, RpcClientOptions};
use chainlens_core::{ChainStateService, ChainStore, MemoryStore};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    validate_durations(&args)?;

    let options = RpcClientOptions {
        requests_per_second: args.rpc_requests_per_second,
        request_timeout: args.rpc_timeout_secs.map(Duration::from_secs),
    };
    let rpc: Arc<dyn NodeRpc> = Arc::new(
        HttpRpcClient::new(
            &args.rpc_url,
            args.rpc_user.as_deref(),
            args.rpc_pass.as_deref(),
            args.rpc_cookie_file.as_deref(),
            options,
        )
        .wrap_err("configure daemon RPC client")?,
    );

    // The daemon is not required to be up at startup; report what we see.
    match rpc.get_chain_tip().await {
        Ok(tip) => tracing::info!(
            chain = %args.chain,
            height = tip.height,
            hash = %tip.hash,
            "connected to daemon"
        ),
        Err(err) => tracing::warn!(
            rpc_url = %redact_connection(&args.rpc_url),
            error = %err,
            "daemon not reachable yet; queries will fail until it is"
        ),
    }

    let store: Arc<dyn ChainStore> = match &args.snapshot_dir {
        Some(dir) => Arc::new(
            MemoryStore::from_snapshot_dir(dir)
                .wrap_err_with(|| format!("load store snapshot from {}", dir.display()))?,
        ),
        None => {
            tracing::info!("no snapshot directory given; starting with an empty store");
            Arc::new(MemoryStore::new())
        }
    };

    let service = ChainStateService::new(store)
        .with_daemon(&args.chain, &args.network, rpc)
        .with_anchor_cache_ttl(Duration::from_secs(args.anchor_cache_ttl_secs));

    let state = server::AppState {
        service: Arc::new(service),
    };
    let router = server::build_router(state, Duration::from_secs(args.request_timeout_secs));

    let bind_addr = format!("{}:{}", args.bind, args.port);
    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0 and reachable from the network");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .wrap_err("bind TCP listener")?;

    tracing::info!(
        chain = %args.chain,
        network = %args.network.to_ascii_lowercase(),
        "listening on {bind_addr}"
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("run HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Every duration flag must be non-zero: a zero TTL caches nothing and a
/// zero timeout fails every request.
fn validate_durations(args: &cli::Cli) -> eyre::Result<()> {
    if args.anchor_cache_ttl_secs == 0 {
        return Err(eyre!("--anchor-cache-ttl-secs must be at least 1"));
    }
    if args.request_timeout_secs == 0 {
        return Err(eyre!("--request-timeout-secs must be at least 1"));
    }
    if args.rpc_timeout_secs == Some(0) {
        return Err(eyre!("--rpc-timeout-secs must be at least 1"));
    }
    Ok(())
}
