//! The single inbound channel every connection posts to. The driver task
//! is the exclusive owner of [`game_core::Simulation`] and the
//! connection registry; it drains this channel once per tick, which is
//! what gives commands from different connections a deterministic,
//! consistent order within a tick window.

use tokio::sync::mpsc;

pub type ConnId = u64;

/// Posted by a connection's lifecycle, not by the protocol translator —
/// these are the three things a worker can tell the driver about itself.
pub enum ServerCommand {
    /// A socket was accepted; admit it and start tracking its outbound
    /// sender under `id`.
    Connected {
        id: ConnId,
        outbound: mpsc::Sender<String>,
    },
    /// One line of text arrived on an already-admitted connection.
    Line { id: ConnId, line: String },
    /// The connection's reader or writer task ended; clean up its slot.
    Disconnected { id: ConnId },
}
