//! Random name assignment for freshly accepted connections.

use crate::state::State;
use rand::Rng;
use rand::seq::SliceRandom;

/// Curated name pool handed out before falling back to numeric suffixes.
pub const RANDOM_NAMES: &[&str] = &[
    "Bomber", "Blaster", "Dynamite", "Thunder", "Flash", "Storm", "Phoenix", "Shadow", "Viper",
    "Rocket", "Ninja", "Falcon", "Tiger", "Wolf", "Eagle", "Hunter", "Warrior", "Knight", "Ranger",
    "Scout", "Sniper", "Ghost", "Phantom", "Mystic", "Raven", "Hawk", "Dragon", "Cobra", "Panther",
    "Lion", "Ace", "Blade", "Cyber", "Echo", "Frost", "Grim", "Hero", "Iron", "Jade", "King",
    "Legend", "Master", "Nova", "Onyx", "Prime", "Quest", "Rebel", "Spike", "Titan", "Ultra",
    "Vector", "Wild", "Xenon", "Yell", "Zero",
];

/// Picks a name guaranteed to be unique (case-insensitively) among
/// currently connected players and spectators: a random pool entry
/// first, then the same entry with a numeric suffix, then a fully random
/// tag once the pool is exhausted.
pub fn generate_unique_name(state: &State, rng: &mut impl Rng) -> String {
    let mut pool: Vec<&str> = RANDOM_NAMES.to_vec();
    pool.shuffle(rng);

    for base in &pool {
        if !state.name_taken(base) {
            return base.to_string();
        }
    }

    for base in &pool {
        for suffix in 1..=999 {
            let candidate = format!("{base}{suffix}");
            if !state.name_taken(&candidate) {
                return candidate;
            }
        }
    }

    loop {
        let candidate = format!("Player{:04}", rng.gen_range(0..10_000));
        if !state.name_taken(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Player;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn never_collides_with_an_existing_player_name() {
        let mut state = State::new();
        let mut rng = StdRng::seed_from_u64(3);
        for pid in 0..4 {
            let name = generate_unique_name(&state, &mut rng);
            assert!(!state.name_taken(&name));
            state.players.insert(pid, Player::spawn(pid, name));
        }
        let names: Vec<String> = state.players.values().map(|p| p.name.clone()).collect();
        let mut lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        lowered.sort();
        lowered.dedup();
        assert_eq!(lowered.len(), names.len());
    }

    #[test]
    fn falls_back_to_numeric_suffix_once_pool_is_exhausted() {
        let mut state = State::new();
        for (i, name) in RANDOM_NAMES.iter().enumerate() {
            state.players.insert(i as u32 % 4, Player::spawn(i as u32 % 4, name.to_string()));
        }
        let mut rng = StdRng::seed_from_u64(9);
        let name = generate_unique_name(&state, &mut rng);
        assert!(!state.name_taken(&name));
    }
}
