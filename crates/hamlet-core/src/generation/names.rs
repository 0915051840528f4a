//! Name generation

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

const MAX_PLAIN_ATTEMPTS: usize = 20;

pub fn generate_name(rng: &mut impl Rng) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Wren");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Reed");
    format!("{first} {last}")
}

/// A name not already in `taken`. Falls back to adding a middle initial,
/// then a number, once plain first/last pairs keep colliding.
pub fn generate_unique_name(taken: &HashSet<String>, rng: &mut impl Rng) -> String {
    for _ in 0..MAX_PLAIN_ATTEMPTS {
        let name = generate_name(rng);
        if !taken.contains(&name) {
            return name;
        }
    }

    for _ in 0..MAX_PLAIN_ATTEMPTS {
        let name = generate_name(rng);
        let initial = (b'A' + rng.gen_range(0..26)) as char;
        let (first, last) = name.split_once(' ').unwrap_or((name.as_str(), ""));
        let candidate = format!("{first} {initial}. {last}");
        if !taken.contains(&candidate) {
            return candidate;
        }
    }

    let base = generate_name(rng);
    let mut n = 2;
    loop {
        let candidate = format!("{base} {n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

static FIRST_NAMES: &[&str] = &[
    "Aiden", "Bela", "Clara", "Doran", "Eliza", "Finn", "Greta", "Hilda", "Ivan", "Julia", "Kai",
    "Lily", "Milo", "Nina", "Otto", "Petra", "Quinn", "Rosa", "Sven", "Tilly", "Ulric", "Vera",
    "Wren", "Xander", "Yara", "Zeke",
];

static LAST_NAMES: &[&str] = &[
    "Smith", "Miller", "Fisher", "Baker", "Cooper", "Fletcher", "Thatcher", "Wood", "Stone",
    "Field", "Hill", "Brook", "River", "Dale", "Ford", "Green", "White", "Black", "Brown", "Gray",
    "Reed", "Swift", "Strong",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_name_has_two_parts() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let name = generate_name(&mut rng);
        let parts: Vec<&str> = name.split(' ').collect();
        assert_eq!(parts.len(), 2);
        assert!(FIRST_NAMES.contains(&parts[0]));
        assert!(LAST_NAMES.contains(&parts[1]));
    }

    #[test]
    fn test_unique_names_across_large_roster() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut taken = HashSet::new();
        // more than the 598 plain combinations
        for _ in 0..700 {
            let name = generate_unique_name(&taken, &mut rng);
            assert!(taken.insert(name));
        }
    }
}
