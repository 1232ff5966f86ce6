//! Shared constants and wire types for the bomb arena server.
//!
//! This crate is the one thing both the server and any client agree on:
//! the grid dimensions and timing constants, the tile/direction vocabulary,
//! and the line-delimited JSON shapes exchanged after a connection is
//! admitted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Grid layout.

/// Tiles across the map.
pub const MAP_WIDTH: usize = 15;
/// Tiles down the map.
pub const MAP_HEIGHT: usize = 13;

// Player / spectator bookkeeping.

/// Maximum concurrent players in a round.
pub const MAX_PLAYERS: usize = 4;
/// Starting lives per player.
pub const PLAYER_LIVES: u8 = 3;
/// First id handed to a spectator; disjoint from the player id space.
pub const SPECTATOR_ID_BASE: u32 = 100;

// Bomb / explosion timing, in ticks.

/// Ticks from placement to detonation.
pub const BOMB_TIMER_TICKS: u32 = 20;
/// Ticks an explosion lingers for rendering after damage has been applied.
pub const EXPLOSION_TTL_TICKS: u32 = 5;
/// Cells a blast travels outward in each cardinal direction.
pub const EXPLOSION_RANGE: u32 = 2;

// Round pacing.

/// Ticks the victory screen holds before an automatic return to the lobby.
pub const VICTORY_TIMER_TICKS: u32 = 50;
/// Lower bound (inclusive) for the randomized block-regeneration interval.
pub const BLOCK_REGEN_MIN_TICKS: u32 = 30;
/// Upper bound (inclusive) for the randomized block-regeneration interval.
pub const BLOCK_REGEN_MAX_TICKS: u32 = 80;
/// Destructible blocks are never regenerated past this count.
pub const MAX_BLOCKS_ON_MAP: usize = 30;
/// Random samples attempted per regeneration trigger before giving up.
pub const BLOCK_REGEN_SAMPLE_ATTEMPTS: u32 = 50;
/// Connections are swept for stale player mappings every this many ticks.
pub const HOUSEKEEPING_INTERVAL_TICKS: u64 = 50;

// Chat.

/// Messages kept in the chat log before the oldest is evicted.
pub const MAX_CHAT_MESSAGES: usize = 100;
/// Characters a chat message is truncated to.
pub const MAX_MESSAGE_LENGTH: usize = 150;
/// Sender id used for system-authored chat lines.
pub const SYSTEM_SENDER_ID: i32 = -1;

// Networking defaults.

/// Default bind host when none is given on the command line.
pub const DEFAULT_HOST: &str = "localhost";
/// Default bind port when none is given on the command line.
pub const DEFAULT_PORT: u16 = 5555;
/// Simulation tick period.
pub const TICK_MILLIS: u64 = 100;

/// One cell of the map grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Tile {
    Empty = 0,
    Wall = 1,
    Block = 2,
}

impl Tile {
    /// Whether a player or the map generator may treat this cell as open ground.
    pub fn is_walkable(self) -> bool {
        matches!(self, Tile::Empty)
    }
}

/// A requested movement direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The `(dx, dy)` unit offset this direction applies to a grid position.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The four cardinal directions, in a fixed order used for explosion
    /// propagation and neighbor scans.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Why an admission request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("name is too short")]
    NameTooShort,
    #[error("name is already in use")]
    NameTaken,
}

impl AdmissionError {
    /// The wire-level error kind string for this failure.
    pub fn kind(self) -> &'static str {
        match self {
            AdmissionError::NameTooShort => "name_too_short",
            AdmissionError::NameTaken => "name_taken",
        }
    }
}

/// Successful admission reply, sent once as the first line on a new connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdmissionReply {
    pub join_success: bool,
    pub player_id: u32,
    pub is_spectator: bool,
    pub player_name: String,
}

/// Admission failure reply. The connection is closed immediately after.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdmissionErrorReply {
    pub error: String,
    pub details: String,
}

impl AdmissionErrorReply {
    pub fn from_error(err: AdmissionError, name: &str) -> Self {
        let details = match err {
            AdmissionError::NameTooShort => {
                format!("Name '{name}' is too short")
            }
            AdmissionError::NameTaken => {
                format!("Name '{name}' is already in use")
            }
        };
        AdmissionErrorReply {
            error: err.kind().to_string(),
            details,
        }
    }
}

/// Reply to a spectator's `JOIN_GAME` request, sent to that connection only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionReply {
    pub conversion_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_player_id: Option<u32>,
}

/// Public view of a player, as embedded in a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub alive: bool,
    pub lives: u8,
    pub disconnected: bool,
    pub host: bool,
}

/// Public view of a spectator, as embedded in a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpectatorView {
    pub name: String,
}

/// One bomb, as embedded in a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BombView {
    pub x: i32,
    pub y: i32,
    pub timer: u32,
    pub owner: u32,
}

/// One explosion, as embedded in a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExplosionView {
    pub positions: Vec<(i32, i32)>,
    pub timer: u32,
}

/// One chat entry, as embedded in a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessageView {
    pub sender_id: i32,
    pub message: String,
    pub timestamp: u64,
    pub is_system: bool,
    pub is_spectator: bool,
}

/// The per-tick world snapshot broadcast to every connection.
///
/// Fields outside a phase's relevant set are omitted rather than sent as
/// `null`, so a lobby snapshot carries no `map`/`bombs`/`explosions` and a
/// playing snapshot carries no `winner_id`/`victory_timer`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub game_state: String,
    pub players: HashMap<String, PlayerView>,
    pub spectators: HashMap<String, SpectatorView>,
    pub chat_messages: Vec<ChatMessageView>,
    pub current_host_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_start: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_spectator_join: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<Vec<Vec<u8>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bombs: Option<Vec<BombView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explosions: Option<Vec<ExplosionView>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory_timer: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_error_kinds_match_wire_strings() {
        assert_eq!(AdmissionError::NameTooShort.kind(), "name_too_short");
        assert_eq!(AdmissionError::NameTaken.kind(), "name_taken");
    }

    #[test]
    fn lobby_snapshot_omits_playing_only_fields() {
        let snap = Snapshot {
            game_state: "lobby".into(),
            players: HashMap::new(),
            spectators: HashMap::new(),
            chat_messages: Vec::new(),
            current_host_id: None,
            can_start: Some(false),
            can_spectator_join: Some(true),
            map: None,
            bombs: None,
            explosions: None,
            winner_id: None,
            victory_timer: None,
        };
        let encoded = serde_json::to_string(&snap).unwrap();
        assert!(!encoded.contains("\"map\""));
        assert!(!encoded.contains("\"winner_id\""));
        assert!(encoded.contains("\"can_start\":false"));
    }

    #[test]
    fn direction_offsets_are_unit_vectors() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.offset();
            assert_eq!(dx.abs() + dy.abs(), 1);
        }
    }
}
