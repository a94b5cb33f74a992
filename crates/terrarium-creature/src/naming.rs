//! Deterministic names for species and creatures
//!
//! Names are derived from hashes so they never consume simulation RNG.

use terrarium_simulation::hash::mix32;

static ONSETS: &[&str] = &[
    "k", "t", "z", "v", "m", "r", "l", "s", "dr", "th", "gr", "n", "b", "qu", "sh", "f",
];

static VOWELS: &[&str] = &["a", "e", "i", "o", "u", "ae", "io", "y"];

static CODAS: &[&str] = &["", "", "n", "r", "s", "th", "x", "l"];

static GENUS_SUFFIXES: &[&str] = &[
    "ids", "ora", "ax", "ium", "ynx", "odon", "ella", "aris", "opod", "erix",
];

fn pick<'a>(list: &'a [&'a str], h: u32) -> &'a str {
    list[(h as usize) % list.len()]
}

/// One pronounceable syllable from a hash
pub fn syllable(h: u32) -> String {
    let a = mix32(h);
    let b = mix32(a ^ 0x68e3_1da4);
    let c = mix32(b ^ 0xb529_7a4d);
    format!("{}{}{}", pick(ONSETS, a), pick(VOWELS, b), pick(CODAS, c))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Species name such as "Zathora" from a registry seed and species id
pub fn species_name(seed: u32, species: u32) -> String {
    let h = mix32(seed ^ species.wrapping_mul(0x9e37_79b9));
    let first = syllable(h);
    let second = syllable(mix32(h ^ 0x1b87_3593));
    let suffix = pick(GENUS_SUFFIXES, mix32(h ^ 0xcc9e_2d51));
    capitalize(&format!("{first}{second}{suffix}"))
}

/// Creature name: two syllables plus its id, e.g. "Kelo-42"
pub fn creature_name(id: u64) -> String {
    let h = mix32((id as u32) ^ mix32((id >> 32) as u32 ^ 0x2545_f491));
    let a = syllable(h);
    let b = syllable(mix32(h.wrapping_add(0x6a09_e667)));
    format!("{}-{}", capitalize(&format!("{a}{b}")), id)
}

/// A short proto-linguistic utterance of `count` syllables
pub fn utterance(h: u32, count: usize) -> String {
    let mut words = Vec::with_capacity(count);
    let mut state = h;
    for _ in 0..count.max(1) {
        state = mix32(state.wrapping_add(0x9e37_79b9));
        words.push(syllable(state));
    }
    words.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_name_is_stable() {
        assert_eq!(species_name(1, 5), species_name(1, 5));
        assert_ne!(species_name(1, 5), species_name(1, 6));
        let name = species_name(42, 1);
        assert!(name.chars().next().is_some_and(|c| c.is_uppercase()));
    }

    #[test]
    fn test_creature_name_contains_id() {
        let name = creature_name(42);
        assert!(name.ends_with("-42"));
        assert_eq!(name, creature_name(42));
    }

    #[test]
    fn test_utterance_syllable_count() {
        let u = utterance(99, 3);
        assert_eq!(u.split('-').count(), 3);
        assert_eq!(utterance(7, 0).split('-').count(), 1);
    }
}
