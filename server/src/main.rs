use anyhow::Context;
use clap::Parser;
use server::command::ServerCommand;
use server::config::ServerConfig;
use server::{driver, worker};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Buffer of in-flight commands the driver has not yet drained. Generous
/// relative to the player/spectator count any single room supports.
const COMMAND_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
/// Activates error tracing, binds the listener from the parsed CLI
/// config, spawns the tick/broadcast driver, then accepts connections
/// until the process receives an interrupt.
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true) // Modul-Path (e.g. server::driver)
                .with_thread_ids(true) // Thread-ID (helpful for Tokio)
                .with_thread_names(true), // Thread-Name
        )
        .init();

    let config = ServerConfig::parse();
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    tracing::info!(address = %config.bind_addr(), "listening");

    let (cmd_tx, cmd_rx) = mpsc::channel::<ServerCommand>(COMMAND_CHANNEL_CAPACITY);
    tokio::spawn(driver::run(cmd_rx));

    let next_conn_id = AtomicU64::new(0);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(?err, "failed to accept connection");
                        continue;
                    }
                };
                let id = next_conn_id.fetch_add(1, Ordering::Relaxed);
                tracing::info!(connection = id, %peer_addr, "accepted connection");
                let to_driver = cmd_tx.clone();
                tokio::spawn(worker::handle_connection(id, socket, to_driver));
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received, stopping listener");
                break;
            }
        }
    }

    Ok(())
}
