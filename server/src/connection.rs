//! The driver's bookkeeping for every admitted connection: its outbound
//! sender and whether it currently plays as a player or watches as a
//! spectator.

use crate::command::ConnId;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// What a connection is admitted as. A spectator's id is its `sid`; once
/// converted to a player, the same connection's role flips to `Player`
/// carrying the new `pid` — the next command from that connection is
/// then interpreted under the new identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnRole {
    Player(u32),
    Spectator(u32),
}

pub struct ConnHandle {
    pub outbound: mpsc::Sender<String>,
    pub role: ConnRole,
}

/// Bounded size of each connection's outbound queue. A slow consumer
/// that cannot keep up is disconnected rather than allowed to stall the
/// tick driver — see the `try_send` call sites in `driver.rs`.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// All admitted connections, keyed by the opaque id their worker pair
/// was registered under. Owned by the same task that owns
/// [`game_core::Simulation`], so no lock is needed around it.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnId, ConnHandle>,
}

impl ConnectionRegistry {
    pub fn insert(&mut self, id: ConnId, outbound: mpsc::Sender<String>, role: ConnRole) {
        self.connections.insert(id, ConnHandle { outbound, role });
    }

    pub fn remove(&mut self, id: ConnId) -> Option<ConnHandle> {
        self.connections.remove(&id)
    }

    pub fn role_of(&self, id: ConnId) -> Option<ConnRole> {
        self.connections.get(&id).map(|h| h.role)
    }

    pub fn set_role(&mut self, id: ConnId, role: ConnRole) {
        if let Some(handle) = self.connections.get_mut(&id) {
            handle.role = role;
        }
    }

    /// Sends one line to a single connection, dropping it on a full
    /// queue rather than blocking the caller.
    pub fn send_to(&mut self, id: ConnId, line: String) {
        if let Some(handle) = self.connections.get(&id) {
            if handle.outbound.try_send(line).is_err() {
                self.connections.remove(&id);
            }
        }
    }

    /// Broadcasts one line to every connection, pruning any whose queue
    /// is full (and therefore presumed stuck or gone).
    pub fn broadcast(&mut self, line: &str) {
        self.connections.retain(|_, handle| handle.outbound.try_send(line.to_string()).is_ok());
    }

    /// Connection ids whose role is a player id no longer present in
    /// `live_pids`. Periodic housekeeping purges these.
    pub fn stale_player_connections(&self, live_pids: &std::collections::HashSet<u32>) -> Vec<ConnId> {
        self.connections
            .iter()
            .filter_map(|(id, handle)| match handle.role {
                ConnRole::Player(pid) if !live_pids.contains(&pid) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn remove_many(&mut self, ids: &[ConnId]) {
        for id in ids {
            self.connections.remove(id);
        }
    }
}
