//! Lobby and match orchestration: admission, host election,
//! spectator/player conversion, round start/reset and disconnect handling.

use crate::entities::{Player, Spectator};
use crate::map;
use crate::names;
use crate::state::{Phase, State};
use protocol::{AdmissionError, BLOCK_REGEN_MAX_TICKS, BLOCK_REGEN_MIN_TICKS};
use rand::Rng;

/// The outcome of a successful admission.
pub struct AdmissionOutcome {
    pub id: u32,
    pub is_player: bool,
    pub name: String,
}

fn validate_name(state: &State, candidate: &str) -> Result<(), AdmissionError> {
    if candidate.chars().count() < 2 {
        return Err(AdmissionError::NameTooShort);
    }
    if state.name_taken(candidate) {
        return Err(AdmissionError::NameTaken);
    }
    Ok(())
}

/// Admits a new connection as a player (if the lobby has a free slot) or
/// as a spectator otherwise. A connection is never rejected for "room
/// full" — only for a malformed or colliding name.
pub fn admit(state: &mut State, candidate_name: &str) -> Result<AdmissionOutcome, AdmissionError> {
    validate_name(state, candidate_name)?;

    let as_player = state.phase == Phase::Lobby && state.find_free_pid().is_some();

    if as_player {
        let pid = state.find_free_pid().expect("checked above");
        state
            .players
            .insert(pid, Player::spawn(pid, candidate_name.to_string()));
        state
            .chat_log
            .push_system(format!("{candidate_name} joined the lobby"));
        elect_host(state);
        Ok(AdmissionOutcome {
            id: pid,
            is_player: true,
            name: candidate_name.to_string(),
        })
    } else {
        let sid = state.allocate_spectator_id();
        state.spectators.insert(
            sid,
            Spectator {
                sid,
                name: candidate_name.to_string(),
            },
        );
        state
            .chat_log
            .push_system(format!("{candidate_name} joined as spectator"));
        Ok(AdmissionOutcome {
            id: sid,
            is_player: false,
            name: candidate_name.to_string(),
        })
    }
}

/// Generates a server-assigned unique name and admits the connection
/// under it, per §4.7: callers never let a client pick its own name.
pub fn admit_with_generated_name(
    state: &mut State,
    rng: &mut impl Rng,
) -> Result<AdmissionOutcome, AdmissionError> {
    let name = names::generate_unique_name(state, rng);
    admit(state, &name)
}

/// Converts a lobby spectator into a player, if a slot is free. Returns
/// the new pid on success.
pub fn convert_spectator_to_player(state: &mut State, sid: u32) -> Option<u32> {
    if state.phase != Phase::Lobby {
        return None;
    }
    let pid = state.find_free_pid()?;
    let spectator = state.spectators.remove(&sid)?;
    state
        .players
        .insert(pid, Player::spawn(pid, spectator.name.clone()));
    state
        .chat_log
        .push_system(format!("{} joined as Player {pid}", spectator.name));
    elect_host(state);
    Some(pid)
}

/// Recomputes the host as the lowest pid among connected players,
/// logging a system message whenever the host actually changes. The
/// very first host ever assigned (no previous host existed) gets its
/// own distinct wording from a later re-election.
pub fn elect_host(state: &mut State) {
    let had_host_before = state.current_host_id.is_some();
    let new_host = state
        .connected_players()
        .map(|p| p.pid)
        .min();
    if new_host != state.current_host_id {
        state.current_host_id = new_host;
        if let Some(pid) = new_host {
            if let Some(player) = state.players.get(&pid) {
                tracing::info!(pid, name = %player.name, "host elected");
                let message = if had_host_before {
                    format!("{} is now the host", player.name)
                } else {
                    format!("{} is the host", player.name)
                };
                state.chat_log.push_system(message);
            }
        }
    }
}

/// Starts a round: only valid from [`Phase::Lobby`], requested by the
/// current host, with at least two connected players.
pub fn start_game(state: &mut State, rng: &mut impl Rng, requester_pid: u32) -> bool {
    if state.phase != Phase::Lobby {
        return false;
    }
    if state.current_host_id != Some(requester_pid) {
        return false;
    }
    if state.connected_players().count() < 2 {
        return false;
    }

    state.map = Some(map::generate_map(rng));
    state.bombs.clear();
    state.explosions.clear();
    state.winner_id = None;
    state.victory_timer = 0;
    state.block_regen_timer = rng.gen_range(BLOCK_REGEN_MIN_TICKS..=BLOCK_REGEN_MAX_TICKS);
    for player in state.players.values_mut() {
        player.reset_for_round();
    }
    state.phase = Phase::Playing;
    tracing::info!(players = state.players.len(), "round started");
    true
}

/// Returns to the lobby: clears the round's transient state, purges
/// disconnected players, and resets the remaining players for a fresh
/// game. Called either from a victory-timer expiry or a `PLAY_AGAIN`.
pub fn return_to_lobby(state: &mut State) {
    state.players.retain(|_, p| !p.disconnected);
    state.map = None;
    state.bombs.clear();
    state.explosions.clear();
    state.winner_id = None;
    state.victory_timer = 0;
    for player in state.players.values_mut() {
        player.alive = true;
        player.lives = protocol::PLAYER_LIVES;
    }
    state.phase = Phase::Lobby;
    elect_host(state);
}

/// Handles a dropped connection for a player. In the lobby the player is
/// removed outright; mid-round they are kept as a disconnected corpse
/// until the next [`return_to_lobby`], and victory is re-evaluated since
/// their drop may leave a single survivor.
pub fn handle_player_disconnect(state: &mut State, pid: u32) {
    match state.phase {
        Phase::Lobby => {
            if let Some(player) = state.players.remove(&pid) {
                state
                    .chat_log
                    .push_system(format!("{} left the lobby", player.name));
            }
            elect_host(state);
        }
        Phase::Playing | Phase::Victory => {
            if let Some(player) = state.players.get_mut(&pid) {
                player.disconnected = true;
                player.alive = false;
                player.lives = 0;
            }
            elect_host(state);
            crate::kernel::check_victory(state);
        }
    }
}

pub fn remove_spectator(state: &mut State, sid: u32) {
    state.spectators.remove(&sid);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn first_two_joiners_become_players_and_first_is_host() {
        let mut state = State::new();
        let a = admit(&mut state, "Alice").unwrap();
        let b = admit(&mut state, "Bob").unwrap();
        assert!(a.is_player && b.is_player);
        assert_eq!(state.current_host_id, Some(a.id));
    }

    #[test]
    fn fifth_joiner_becomes_a_spectator_not_a_rejection() {
        let mut state = State::new();
        for name in ["A", "B", "C", "D"] {
            admit(&mut state, name).unwrap();
        }
        let fifth = admit(&mut state, "E").unwrap();
        assert!(!fifth.is_player);
        assert!(fifth.id >= protocol::SPECTATOR_ID_BASE);
    }

    #[test]
    fn duplicate_name_is_rejected_case_insensitively() {
        let mut state = State::new();
        admit(&mut state, "Alice").unwrap();
        let err = admit(&mut state, "alice").unwrap_err();
        assert_eq!(err, AdmissionError::NameTaken);
    }

    #[test]
    fn too_short_name_is_rejected() {
        let mut state = State::new();
        let err = admit(&mut state, "A").unwrap_err();
        assert_eq!(err, AdmissionError::NameTooShort);
    }

    #[test]
    fn host_is_reelected_on_disconnect() {
        let mut state = State::new();
        let a = admit(&mut state, "Alice").unwrap();
        admit(&mut state, "Bob").unwrap();
        handle_player_disconnect(&mut state, a.id);
        assert_ne!(state.current_host_id, Some(a.id));
    }

    #[test]
    fn start_game_requires_host_and_two_players() {
        let mut state = State::new();
        let mut rng = StdRng::seed_from_u64(1);
        let a = admit(&mut state, "Alice").unwrap();
        assert!(!start_game(&mut state, &mut rng, a.id));
        admit(&mut state, "Bob").unwrap();
        assert!(start_game(&mut state, &mut rng, a.id));
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn disconnect_during_play_keeps_the_slot_until_return_to_lobby() {
        let mut state = State::new();
        let mut rng = StdRng::seed_from_u64(2);
        let a = admit(&mut state, "Alice").unwrap();
        let b = admit(&mut state, "Bob").unwrap();
        start_game(&mut state, &mut rng, a.id);
        handle_player_disconnect(&mut state, b.id);
        assert!(state.players.contains_key(&b.id));
        assert_eq!(state.phase, Phase::Victory);
        return_to_lobby(&mut state);
        assert!(!state.players.contains_key(&b.id));
    }

    #[test]
    fn host_disconnect_mid_round_hands_off_to_a_connected_player() {
        let mut state = State::new();
        let mut rng = StdRng::seed_from_u64(4);
        let a = admit(&mut state, "Alice").unwrap();
        let b = admit(&mut state, "Bob").unwrap();
        admit(&mut state, "Carol").unwrap();
        start_game(&mut state, &mut rng, a.id);
        assert_eq!(state.current_host_id, Some(a.id));

        handle_player_disconnect(&mut state, a.id);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.current_host_id, Some(b.id));
        assert_ne!(state.current_host_id, Some(a.id));
    }
}
