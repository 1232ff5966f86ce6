//! The mutable pieces that make up a round: players, bombs, explosions
//! and spectators.

use protocol::PLAYER_LIVES;

/// A connected player. `host` is never stored — it is always derived from
/// [`crate::state::State::current_host_id`] at the moment it is needed.
#[derive(Clone, Debug)]
pub struct Player {
    pub pid: u32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub alive: bool,
    pub lives: u8,
    pub disconnected: bool,
}

impl Player {
    pub fn spawn(pid: u32, name: String) -> Self {
        let (x, y) = crate::map::spawn_for(pid);
        Player {
            pid,
            name,
            x,
            y,
            alive: true,
            lives: PLAYER_LIVES,
            disconnected: false,
        }
    }

    /// Resets position and vitals for a new round without changing identity.
    pub fn reset_for_round(&mut self) {
        let (x, y) = crate::map::spawn_for(self.pid);
        self.x = x;
        self.y = y;
        self.alive = true;
        self.lives = PLAYER_LIVES;
    }

    pub fn is_connected(&self) -> bool {
        !self.disconnected
    }
}

/// A ticking bomb on the grid, owned by the player who placed it.
#[derive(Clone, Debug)]
pub struct Bomb {
    pub x: i32,
    pub y: i32,
    pub timer: u32,
    pub owner: u32,
}

/// A resolved blast: the cells it touched, lingering only for rendering.
#[derive(Clone, Debug)]
pub struct Explosion {
    pub positions: Vec<(i32, i32)>,
    pub timer: u32,
}

/// A connected, non-playing observer.
#[derive(Clone, Debug)]
pub struct Spectator {
    pub sid: u32,
    pub name: String,
}
