//! Pure simulation transitions: movement, bombs, explosions, block
//! regeneration and victory detection. None of this touches networking;
//! every function here takes a [`State`] and nothing else.

use crate::map;
use crate::state::{Phase, State};
use protocol::{
    BLOCK_REGEN_MAX_TICKS, BLOCK_REGEN_MIN_TICKS, BLOCK_REGEN_SAMPLE_ATTEMPTS, BOMB_TIMER_TICKS,
    Direction, EXPLOSION_RANGE, EXPLOSION_TTL_TICKS, MAX_BLOCKS_ON_MAP, Tile, VICTORY_TIMER_TICKS,
};
use rand::Rng;

/// Moves a player one cell if the target is open ground and unoccupied.
/// A no-op outside [`Phase::Playing`], for a dead player, or for an
/// unknown `pid`. A bomb sitting on the target cell never blocks the move.
pub fn move_player(state: &mut State, pid: u32, dir: Direction) {
    if state.phase != Phase::Playing {
        return;
    }
    let Some(map) = state.map.as_ref() else { return };

    let (nx, ny) = {
        let Some(player) = state.players.get(&pid) else { return };
        if !player.alive {
            return;
        }
        let (dx, dy) = dir.offset();
        (player.x + dx, player.y + dy)
    };

    if !map.is_walkable(nx, ny) {
        return;
    }
    let occupied = state
        .players
        .values()
        .any(|p| p.pid != pid && p.alive && p.x == nx && p.y == ny);
    if occupied {
        return;
    }

    if let Some(player) = state.players.get_mut(&pid) {
        player.x = nx;
        player.y = ny;
    }
}

/// Drops a bomb at the player's current cell, refusing a second bomb on
/// the same cell. A no-op outside [`Phase::Playing`] or for a dead player.
pub fn place_bomb(state: &mut State, pid: u32) {
    if state.phase != Phase::Playing {
        return;
    }
    let Some(player) = state.players.get(&pid) else { return };
    if !player.alive {
        return;
    }
    let (x, y) = (player.x, player.y);
    if state.bombs.iter().any(|b| b.x == x && b.y == y) {
        return;
    }
    state.bombs.push(crate::entities::Bomb {
        x,
        y,
        timer: BOMB_TIMER_TICKS,
        owner: pid,
    });
}

/// Advances every bomb and explosion timer by one tick, detonating bombs
/// that reach zero and dropping explosions whose lingering time has
/// elapsed. Returns the affected-cell sets of bombs that exploded this
/// tick, for callers that want to log or react to detonations.
pub fn tick_bombs_and_explosions(state: &mut State) {
    let mut detonated = Vec::new();
    state.bombs.retain_mut(|bomb| {
        if bomb.timer == 0 {
            return false;
        }
        bomb.timer -= 1;
        if bomb.timer == 0 {
            detonated.push((bomb.x, bomb.y, bomb.owner));
            false
        } else {
            true
        }
    });

    for (x, y, _owner) in detonated {
        explode_at(state, x, y);
    }

    state.explosions.retain_mut(|explosion| {
        if explosion.timer == 0 {
            return false;
        }
        explosion.timer -= 1;
        explosion.timer > 0
    });
}

/// Resolves a single detonation: walks outward from `(x, y)` in each
/// cardinal direction up to [`EXPLOSION_RANGE`] cells, stopping at walls,
/// converting and stopping at blocks, and damaging every alive player
/// caught in the affected set. Chain reactions are not triggered — a
/// bomb sitting in the blast keeps counting down on its own.
fn explode_at(state: &mut State, x: i32, y: i32) {
    let Some(map) = state.map.as_mut() else { return };
    let mut affected = vec![(x, y)];

    for dir in Direction::ALL {
        let (dx, dy) = dir.offset();
        let mut cx = x;
        let mut cy = y;
        for _ in 0..EXPLOSION_RANGE {
            cx += dx;
            cy += dy;
            match map.tile_at(cx, cy) {
                None | Some(Tile::Wall) => break,
                Some(Tile::Block) => {
                    affected.push((cx, cy));
                    map.clear_block(cx, cy);
                    break;
                }
                Some(Tile::Empty) => {
                    affected.push((cx, cy));
                }
            }
        }
    }

    for player in state.players.values_mut() {
        if player.alive && affected.contains(&(player.x, player.y)) {
            player.lives = player.lives.saturating_sub(1);
            if player.lives == 0 {
                player.alive = false;
            }
        }
    }

    state.explosions.push(crate::entities::Explosion {
        positions: affected,
        timer: EXPLOSION_TTL_TICKS,
    });
}

/// `true` once zero or one connected player remains alive, the only
/// condition that ends a round.
pub fn check_victory(state: &mut State) {
    if state.phase != Phase::Playing {
        return;
    }

    let alive: Vec<u32> = state
        .players
        .values()
        .filter(|p| p.alive && p.is_connected())
        .map(|p| p.pid)
        .collect();

    if alive.len() > 1 {
        return;
    }

    state.phase = Phase::Victory;
    state.winner_id = Some(alive.first().map(|&pid| pid as i32).unwrap_or(-1));
    state.victory_timer = VICTORY_TIMER_TICKS;
}

/// A cell is safe to drop a new block on only if it is open ground,
/// outside every permanent safe zone, and outside the 3x3 neighborhood
/// of any connected, alive player.
fn safe_to_place_block(state: &State, x: i32, y: i32) -> bool {
    if map::safe_zones().contains(&(x, y)) {
        return false;
    }
    let Some(map) = state.map.as_ref() else { return false };
    if !map.is_walkable(x, y) {
        return false;
    }
    !state.players.values().any(|p| {
        p.alive && p.is_connected() && (p.x - x).abs() <= 1 && (p.y - y).abs() <= 1
    })
}

/// Counts down the block-regeneration timer; on reaching zero, attempts
/// a bounded number of random placements (capped total blocks on the
/// map) and always re-randomizes the next interval regardless of
/// whether a placement succeeded.
pub fn try_regen_block(state: &mut State, rng: &mut impl Rng) {
    if state.phase != Phase::Playing {
        return;
    }
    if state.block_regen_timer > 0 {
        state.block_regen_timer -= 1;
        return;
    }

    let at_cap = state
        .map
        .as_ref()
        .is_some_and(|m| m.count_blocks() >= MAX_BLOCKS_ON_MAP);

    if !at_cap {
        let (w, h) = {
            let map = state.map.as_ref().unwrap();
            (map.width() as i32, map.height() as i32)
        };
        for _ in 0..BLOCK_REGEN_SAMPLE_ATTEMPTS {
            let x = rng.gen_range(1..w - 1);
            let y = rng.gen_range(1..h - 1);
            if safe_to_place_block(state, x, y) {
                state.map.as_mut().unwrap().try_place_block(x, y);
                break;
            }
        }
    }

    state.block_regen_timer = rng.gen_range(BLOCK_REGEN_MIN_TICKS..=BLOCK_REGEN_MAX_TICKS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Player;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn playing_state() -> State {
        let mut state = State::new();
        state.phase = Phase::Playing;
        state.map = Some(map::generate_map(&mut StdRng::seed_from_u64(1)));
        state.players.insert(0, Player::spawn(0, "A".into()));
        state.players.insert(1, Player::spawn(1, "B".into()));
        state
    }

    #[test]
    fn move_blocked_by_wall_is_a_no_op() {
        let mut state = playing_state();
        let before = (state.players[&0].x, state.players[&0].y);
        // Pushing straight up from spawn (1,1) runs into the perimeter wall at y=0.
        move_player(&mut state, 0, Direction::Up);
        assert_eq!((state.players[&0].x, state.players[&0].y), before);
    }

    #[test]
    fn bomb_does_not_block_movement() {
        let mut state = playing_state();
        place_bomb(&mut state, 0);
        // Player 0 stands on their own bomb; stepping off and back must not be
        // blocked by the bomb cell itself.
        move_player(&mut state, 0, Direction::Right);
        assert_eq!(state.players[&0].x, 2);
    }

    #[test]
    fn second_bomb_on_same_cell_is_refused() {
        let mut state = playing_state();
        place_bomb(&mut state, 0);
        place_bomb(&mut state, 0);
        assert_eq!(state.bombs.len(), 1);
    }

    #[test]
    fn detonation_damages_players_in_blast_and_clears_blocks() {
        let mut state = playing_state();
        state.map.as_mut().unwrap().try_place_block(2, 1);
        place_bomb(&mut state, 0);
        for _ in 0..BOMB_TIMER_TICKS {
            tick_bombs_and_explosions(&mut state);
        }
        assert!(state.bombs.is_empty());
        assert_eq!(state.players[&0].lives, 2);
        assert_eq!(state.map.as_ref().unwrap().tile_at(2, 1), Some(Tile::Empty));
    }

    #[test]
    fn last_player_standing_triggers_victory() {
        let mut state = playing_state();
        state.players.get_mut(&1).unwrap().alive = false;
        state.players.get_mut(&1).unwrap().lives = 0;
        check_victory(&mut state);
        assert_eq!(state.phase, Phase::Victory);
        assert_eq!(state.winner_id, Some(0));
    }

    #[test]
    fn all_dead_is_a_draw() {
        let mut state = playing_state();
        for p in state.players.values_mut() {
            p.alive = false;
            p.lives = 0;
        }
        check_victory(&mut state);
        assert_eq!(state.phase, Phase::Victory);
        assert_eq!(state.winner_id, Some(-1));
    }

    #[test]
    fn block_regen_never_overwrites_a_safe_zone() {
        let mut state = playing_state();
        let mut rng = StdRng::seed_from_u64(42);
        for zone in map::safe_zones() {
            state.map.as_mut().unwrap().clear_block(zone.0, zone.1);
        }
        for _ in 0..500 {
            try_regen_block(&mut state, &mut rng);
        }
        for (x, y) in map::safe_zones() {
            assert_eq!(state.map.as_ref().unwrap().tile_at(x, y), Some(Tile::Empty));
        }
    }
}
