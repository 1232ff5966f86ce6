//! The aggregate world state and its phase machine.

use crate::chat::ChatLog;
use crate::entities::{Bomb, Explosion, Player, Spectator};
use crate::map::GameMap;
use protocol::SPECTATOR_ID_BASE;
use std::collections::HashMap;

/// Where the round currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Playing,
    Victory,
}

/// The single source of truth for a round. Owned exclusively by the
/// [`crate::Simulation`] that wraps it; nothing outside this crate or its
/// owning task ever mutates it directly.
pub struct State {
    pub phase: Phase,
    /// `Some(pid)` for a solo winner, `Some(-1)` for a draw, `None` outside victory.
    pub winner_id: Option<i32>,
    pub victory_timer: u32,
    pub map: Option<GameMap>,
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<Explosion>,
    pub players: HashMap<u32, Player>,
    pub spectators: HashMap<u32, Spectator>,
    pub current_host_id: Option<u32>,
    pub chat_log: ChatLog,
    pub block_regen_timer: u32,
    next_spectator_id: u32,
}

impl Default for State {
    fn default() -> Self {
        State {
            phase: Phase::Lobby,
            winner_id: None,
            victory_timer: 0,
            map: None,
            bombs: Vec::new(),
            explosions: Vec::new(),
            players: HashMap::new(),
            spectators: HashMap::new(),
            current_host_id: None,
            chat_log: ChatLog::default(),
            block_regen_timer: 0,
            next_spectator_id: SPECTATOR_ID_BASE,
        }
    }
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_spectator_id(&mut self) -> u32 {
        let id = self.next_spectator_id;
        self.next_spectator_id += 1;
        id
    }

    pub fn find_free_pid(&self) -> Option<u32> {
        (0..protocol::MAX_PLAYERS as u32).find(|pid| !self.players.contains_key(pid))
    }

    pub fn connected_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_connected())
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.alive)
    }

    pub fn name_taken(&self, candidate: &str) -> bool {
        let lowered = candidate.to_lowercase();
        self.players.values().any(|p| p.name.to_lowercase() == lowered)
            || self.spectators.values().any(|s| s.name.to_lowercase() == lowered)
    }
}
