//! Parses a single line of client text into a [`ClientMessage`]. Dispatch
//! against the current connection role (player vs. spectator) happens in
//! the driver, not here — this module only knows about text.

use protocol::Direction;

/// A parsed command, still uninterpreted with respect to phase or role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Ping,
    Move(Direction),
    Bomb,
    StartGame,
    PlayAgain,
    JoinGame,
    LeaveTemporarily,
    Chat(String),
    Ignored,
}

pub fn parse_line(line: &str) -> ClientMessage {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ClientMessage::Ignored;
    }

    if let Some(text) = trimmed.strip_prefix("CHAT:") {
        return ClientMessage::Chat(text.to_string());
    }

    match trimmed.to_ascii_uppercase().as_str() {
        "PING" => ClientMessage::Ping,
        "UP" => ClientMessage::Move(Direction::Up),
        "DOWN" => ClientMessage::Move(Direction::Down),
        "LEFT" => ClientMessage::Move(Direction::Left),
        "RIGHT" => ClientMessage::Move(Direction::Right),
        "BOMB" => ClientMessage::Bomb,
        "START_GAME" => ClientMessage::StartGame,
        "PLAY_AGAIN" => ClientMessage::PlayAgain,
        "JOIN_GAME" => ClientMessage::JoinGame,
        "LEAVE_TEMPORARILY" => ClientMessage::LeaveTemporarily,
        _ => ClientMessage::Ignored,
    }
}
