//! balance-server: account balance decrements served from memory with
//! write-behind persistence to Postgres.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use balance_cache::config::Args;
use balance_cache::{service, AccountCache, BalanceService, PgAccountStore, WriteBehindScheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("balance_cache={},tower_http=info", args.log_level).into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let write_behind = args.write_behind();
    write_behind
        .validate()
        .context("invalid write-behind configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(args.db_max_connections)
        .connect(&args.db_connection_string)
        .await
        .context("failed to connect to Postgres")?;
    info!("postgres connected");

    let store = PgAccountStore::new(pool.clone());
    if args.skip_bootstrap {
        info!("skipping users table bootstrap");
    } else {
        store
            .bootstrap(args.seed_balance)
            .await
            .context("failed to bootstrap users table")?;
    }

    let cache = Arc::new(AccountCache::new(store));
    let scheduler = WriteBehindScheduler::start(Arc::clone(&cache), write_behind)
        .context("failed to start write-behind scheduler")?;
    let balance = Arc::new(BalanceService::new(cache, scheduler.notifier()));

    let addr = args.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "starting application");

    service::serve(balance, listener, shutdown_signal())
        .await
        .context("http server failed")?;
    info!("server stopped");

    // In-memory changes not yet flushed are lost here.
    scheduler.signal_stop();
    pool.close().await;
    info!("shutdown complete");
    Ok(())
}

/// Resolves on the first of SIGINT, SIGTERM, SIGHUP, SIGQUIT, SIGUSR1 or
/// SIGUSR2.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    async fn recv(kind: SignalKind) {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    }

    tokio::select! {
        _ = recv(SignalKind::interrupt()) => {}
        _ = recv(SignalKind::terminate()) => {}
        _ = recv(SignalKind::hangup()) => {}
        _ = recv(SignalKind::quit()) => {}
        _ = recv(SignalKind::user_defined1()) => {}
        _ = recv(SignalKind::user_defined2()) => {}
    }
    info!("shutting down...");
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down...");
}
