//! Converts [`State`] into the wire-level [`protocol::Snapshot`], tailored
//! to the current phase.

use crate::state::{Phase, State};
use protocol::{BombView, ChatMessageView, ExplosionView, PlayerView, Snapshot, SpectatorView};
use std::collections::HashMap;

pub fn build(state: &State) -> Snapshot {
    let players: HashMap<String, PlayerView> = state
        .players
        .iter()
        .map(|(pid, p)| {
            (
                pid.to_string(),
                PlayerView {
                    name: p.name.clone(),
                    x: p.x,
                    y: p.y,
                    alive: p.alive,
                    lives: p.lives,
                    disconnected: p.disconnected,
                    host: state.current_host_id == Some(*pid),
                },
            )
        })
        .collect();

    let spectators: HashMap<String, SpectatorView> = state
        .spectators
        .iter()
        .map(|(sid, s)| (sid.to_string(), SpectatorView { name: s.name.clone() }))
        .collect();

    let chat_messages: Vec<ChatMessageView> = state
        .chat_log
        .iter()
        .map(|m| ChatMessageView {
            sender_id: m.sender_id,
            message: m.message.clone(),
            timestamp: m.timestamp,
            is_system: m.is_system,
            is_spectator: m.is_spectator,
        })
        .collect();

    let mut snapshot = Snapshot {
        game_state: match state.phase {
            Phase::Lobby => "lobby",
            Phase::Playing => "playing",
            Phase::Victory => "victory",
        }
        .to_string(),
        players,
        spectators,
        chat_messages,
        current_host_id: state.current_host_id,
        can_start: None,
        can_spectator_join: None,
        map: None,
        bombs: None,
        explosions: None,
        winner_id: None,
        victory_timer: None,
    };

    match state.phase {
        Phase::Lobby => {
            snapshot.can_start = Some(state.connected_players().count() >= 2);
            snapshot.can_spectator_join = Some(state.find_free_pid().is_some());
        }
        Phase::Playing => {
            snapshot.map = state.map.as_ref().map(|m| m.as_wire_grid());
            snapshot.bombs = Some(
                state
                    .bombs
                    .iter()
                    .map(|b| BombView {
                        x: b.x,
                        y: b.y,
                        timer: b.timer,
                        owner: b.owner,
                    })
                    .collect(),
            );
            snapshot.explosions = Some(
                state
                    .explosions
                    .iter()
                    .map(|e| ExplosionView {
                        positions: e.positions.clone(),
                        timer: e.timer,
                    })
                    .collect(),
            );
        }
        Phase::Victory => {
            snapshot.winner_id = state.winner_id;
            snapshot.victory_timer = Some(state.victory_timer);
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn lobby_snapshot_carries_can_start_and_no_map() {
        let mut state = State::new();
        orchestrator::admit(&mut state, "Alice").unwrap();
        let snap = build(&state);
        assert_eq!(snap.game_state, "lobby");
        assert_eq!(snap.can_start, Some(false));
        assert!(snap.map.is_none());
    }

    #[test]
    fn playing_snapshot_carries_a_map() {
        let mut state = State::new();
        let mut rng = StdRng::seed_from_u64(5);
        let a = orchestrator::admit(&mut state, "Alice").unwrap();
        orchestrator::admit(&mut state, "Bob").unwrap();
        orchestrator::start_game(&mut state, &mut rng, a.id);
        let snap = build(&state);
        assert_eq!(snap.game_state, "playing");
        assert!(snap.map.is_some());
        assert!(snap.can_start.is_none());
    }
}
