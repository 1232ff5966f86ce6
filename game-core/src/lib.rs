//! The authoritative simulation core: map geometry, the entity model, the
//! pure kernel transitions, lobby/match orchestration, the chat ring and
//! the snapshot builder. None of this crate touches a socket — it is the
//! part of the system a test can drive without networking at all.
//!
//! [`Simulation`] is the single entry point a caller needs: it owns the
//! [`State`] plus the RNG every randomized operation (map generation,
//! name assignment, block regeneration) draws from.

pub mod chat;
pub mod entities;
pub mod kernel;
pub mod map;
pub mod names;
pub mod orchestrator;
pub mod snapshot;
pub mod state;

pub use orchestrator::AdmissionOutcome;
pub use state::{Phase, State};

use protocol::{AdmissionError, Direction, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Owns the world and the RNG that drives it. This is the type a
/// connection manager and tick driver hold: every operation a player's
/// command can trigger is a method here.
pub struct Simulation {
    state: State,
    rng: StdRng,
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation {
            state: State::new(),
            rng: StdRng::from_entropy(),
        }
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Admits a connection under a server-generated, guaranteed-unique
    /// name. Only fails if name generation itself produced a collision,
    /// which [`names::generate_unique_name`] is constructed not to do.
    pub fn admit(&mut self) -> Result<AdmissionOutcome, AdmissionError> {
        orchestrator::admit_with_generated_name(&mut self.state, &mut self.rng)
    }

    pub fn convert_spectator_to_player(&mut self, sid: u32) -> Option<u32> {
        orchestrator::convert_spectator_to_player(&mut self.state, sid)
    }

    pub fn start_game(&mut self, requester_pid: u32) -> bool {
        orchestrator::start_game(&mut self.state, &mut self.rng, requester_pid)
    }

    pub fn return_to_lobby(&mut self) {
        orchestrator::return_to_lobby(&mut self.state)
    }

    pub fn handle_player_disconnect(&mut self, pid: u32) {
        orchestrator::handle_player_disconnect(&mut self.state, pid)
    }

    pub fn remove_spectator(&mut self, sid: u32) {
        orchestrator::remove_spectator(&mut self.state, sid)
    }

    pub fn move_player(&mut self, pid: u32, dir: Direction) {
        kernel::move_player(&mut self.state, pid, dir)
    }

    pub fn place_bomb(&mut self, pid: u32) {
        kernel::place_bomb(&mut self.state, pid)
    }

    pub fn add_chat(&mut self, sender_id: i32, text: &str, is_spectator: bool) {
        self.state.chat_log.push_user(sender_id, text, is_spectator)
    }

    /// Advances the world by exactly one tick: a defensive host
    /// re-election, victory-timer countdown and auto-return, bomb/explosion
    /// resolution, victory detection and block regeneration, in that
    /// order. Does nothing while in the lobby besides the victory-timer
    /// check (which is itself a no-op outside [`Phase::Victory`]).
    pub fn tick(&mut self) {
        orchestrator::elect_host(&mut self.state);

        if self.state.phase == Phase::Victory {
            if self.state.victory_timer > 0 {
                self.state.victory_timer -= 1;
            }
            if self.state.victory_timer == 0 {
                self.return_to_lobby();
            }
        }

        if self.state.phase != Phase::Playing {
            return;
        }

        kernel::tick_bombs_and_explosions(&mut self.state);
        kernel::check_victory(&mut self.state);
        if self.state.phase == Phase::Playing {
            kernel::try_regen_block(&mut self.state, &mut self.rng);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        snapshot::build(&self.state)
    }
}
