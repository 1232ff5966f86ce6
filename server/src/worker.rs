//! Per-connection worker lifecycle: a reader task turning socket lines
//! into [`ServerCommand`]s, a writer task draining this connection's
//! outbound queue, raced with `tokio::select!` so that either side
//! ending the connection tears down the other.

use crate::command::{ConnId, ServerCommand};
use crate::connection::OUTBOUND_QUEUE_CAPACITY;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Registers the connection with the driver, then runs its reader and
/// writer tasks until either ends, aborting the other. Always posts a
/// final [`ServerCommand::Disconnected`] so the driver's bookkeeping
/// stays correct even if the writer side is what failed.
pub async fn handle_connection(id: ConnId, socket: TcpStream, to_driver: mpsc::Sender<ServerCommand>) {
    let (read_half, write_half) = socket.into_split();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

    if to_driver
        .send(ServerCommand::Connected { id, outbound: outbound_tx })
        .await
        .is_err()
    {
        return;
    }

    let mut read_task = tokio::spawn(read_loop(id, read_half, to_driver.clone()));
    let mut write_task = tokio::spawn(write_loop(write_half, outbound_rx));

    tokio::select! {
        res = &mut read_task => {
            write_task.abort();
            if let Err(err) = res {
                tracing::warn!(?err, connection = id, "reader task ended abnormally");
            }
        }
        res = &mut write_task => {
            read_task.abort();
            if let Err(err) = res {
                tracing::warn!(?err, connection = id, "writer task ended abnormally");
            }
        }
    }

    let _ = to_driver.send(ServerCommand::Disconnected { id }).await;
}

async fn read_loop(
    id: ConnId,
    read_half: tokio::net::tcp::OwnedReadHalf,
    to_driver: mpsc::Sender<ServerCommand>,
) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if to_driver.send(ServerCommand::Line { id, line }).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                // A line with malformed UTF-8 is a protocol error, not a
                // transport error: ignore it at line granularity and keep
                // reading rather than tearing down the connection.
                tracing::debug!(?err, connection = id, "dropped line with invalid utf-8");
            }
            Err(err) => {
                tracing::debug!(?err, connection = id, "read error, closing connection");
                return;
            }
        }
    }
}

async fn write_loop(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut outbound_rx: mpsc::Receiver<String>,
) {
    while let Some(line) = outbound_rx.recv().await {
        if write_half.write_all(line.as_bytes()).await.is_err() {
            return;
        }
        if write_half.write_all(b"\n").await.is_err() {
            return;
        }
    }
}
