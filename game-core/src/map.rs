//! The tile grid: generation, walkability, spawns and the safe zones
//! carved out around each spawn corner.

use protocol::{Direction, MAP_HEIGHT, MAP_WIDTH, Tile};
use rand::Rng;

/// Probability (0..100) that an eligible interior cell starts as a block.
const BLOCK_SPAWN_CHANCE_PERCENT: u32 = 20;

/// The 15x13 tile grid. Stored row-major, `grid[y][x]`.
#[derive(Clone, Debug)]
pub struct GameMap {
    grid: Vec<Vec<Tile>>,
}

impl GameMap {
    pub fn width(&self) -> usize {
        MAP_WIDTH
    }

    pub fn height(&self) -> usize {
        MAP_HEIGHT
    }

    pub fn tile_at(&self, x: i32, y: i32) -> Option<Tile> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(y as usize)?.get(x as usize).copied()
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_some_and(Tile::is_walkable)
    }

    pub fn is_in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < MAP_WIDTH && (y as usize) < MAP_HEIGHT
    }

    /// Turns a block into open ground; no-op on any other tile kind.
    pub fn clear_block(&mut self, x: i32, y: i32) {
        if let Some(row) = self.grid.get_mut(y as usize) {
            if let Some(cell) = row.get_mut(x as usize) {
                if *cell == Tile::Block {
                    *cell = Tile::Empty;
                }
            }
        }
    }

    /// Places a block if and only if the cell is currently empty.
    pub fn try_place_block(&mut self, x: i32, y: i32) -> bool {
        if let Some(cell) = self.grid.get_mut(y as usize).and_then(|r| r.get_mut(x as usize)) {
            if *cell == Tile::Empty {
                *cell = Tile::Block;
                return true;
            }
        }
        false
    }

    pub fn count_blocks(&self) -> usize {
        self.grid
            .iter()
            .flat_map(|row| row.iter())
            .filter(|t| **t == Tile::Block)
            .count()
    }

    /// A flat `u8` grid suitable for the wire snapshot.
    pub fn as_wire_grid(&self) -> Vec<Vec<u8>> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|t| *t as u8).collect())
            .collect()
    }
}

/// The four corner spawn points, one per player slot.
pub fn spawn_for(pid: u32) -> (i32, i32) {
    let w = MAP_WIDTH as i32;
    let h = MAP_HEIGHT as i32;
    match pid {
        0 => (1, 1),
        1 => (1, h - 2),
        2 => (w - 2, 1),
        _ => (w - 2, h - 2),
    }
}

/// The twelve cells kept permanently clear around the four spawns: each
/// spawn point plus its two orthogonal neighbors toward the map interior.
pub fn safe_zones() -> [(i32, i32); 12] {
    let w = MAP_WIDTH as i32;
    let h = MAP_HEIGHT as i32;
    [
        (1, 1),
        (1, 2),
        (2, 1),
        (1, h - 2),
        (1, h - 3),
        (2, h - 2),
        (w - 2, 1),
        (w - 3, 1),
        (w - 2, 2),
        (w - 2, h - 2),
        (w - 2, h - 3),
        (w - 3, h - 2),
    ]
}

fn is_safe_zone(x: i32, y: i32) -> bool {
    safe_zones().contains(&(x, y))
}

/// The cell one step from `(x, y)` in each cardinal direction, in the
/// fixed order `Direction::ALL`.
pub fn cardinal_neighbors(x: i32, y: i32) -> [(i32, i32); 4] {
    let mut out = [(0, 0); 4];
    for (i, dir) in Direction::ALL.into_iter().enumerate() {
        let (dx, dy) = dir.offset();
        out[i] = (x + dx, y + dy);
    }
    out
}

/// Builds a fresh map: a walled perimeter, walled pillars at every
/// even/even interior cell, scattered destructible blocks elsewhere
/// (never inside a safe zone), and open ground everywhere else.
pub fn generate_map(rng: &mut impl Rng) -> GameMap {
    let w = MAP_WIDTH as i32;
    let h = MAP_HEIGHT as i32;
    let mut grid = vec![vec![Tile::Empty; MAP_WIDTH]; MAP_HEIGHT];

    for y in 0..h {
        for x in 0..w {
            let tile = if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                Tile::Wall
            } else if x % 2 == 0 && y % 2 == 0 {
                Tile::Wall
            } else if is_safe_zone(x, y) {
                Tile::Empty
            } else if rng.gen_range(0..100) < BLOCK_SPAWN_CHANCE_PERCENT {
                Tile::Block
            } else {
                Tile::Empty
            };
            grid[y as usize][x as usize] = tile;
        }
    }

    GameMap { grid }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn perimeter_is_always_wall() {
        let map = generate_map(&mut rng());
        for x in 0..map.width() as i32 {
            assert_eq!(map.tile_at(x, 0), Some(Tile::Wall));
            assert_eq!(map.tile_at(x, map.height() as i32 - 1), Some(Tile::Wall));
        }
        for y in 0..map.height() as i32 {
            assert_eq!(map.tile_at(0, y), Some(Tile::Wall));
            assert_eq!(map.tile_at(map.width() as i32 - 1, y), Some(Tile::Wall));
        }
    }

    #[test]
    fn even_interior_cells_are_pillars() {
        let map = generate_map(&mut rng());
        assert_eq!(map.tile_at(2, 2), Some(Tile::Wall));
        assert_eq!(map.tile_at(4, 6), Some(Tile::Wall));
    }

    #[test]
    fn safe_zones_are_never_blocked() {
        for _ in 0..20 {
            let map = generate_map(&mut rng());
            for (x, y) in safe_zones() {
                assert_eq!(map.tile_at(x, y), Some(Tile::Empty));
            }
        }
    }

    #[test]
    fn spawns_land_on_safe_zone_cells() {
        for pid in 0..4 {
            let (x, y) = spawn_for(pid);
            assert!(safe_zones().contains(&(x, y)));
        }
    }
}
