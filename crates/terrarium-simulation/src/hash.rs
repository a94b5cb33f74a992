//! Deterministic hashing helpers
//!
//! Hash-derived values never consume simulation RNG draws, so anything
//! seeded from them (per-cell jitter, event seeds, telemetry selection)
//! can be recomputed at will without perturbing a run.

/// Small non-cryptographic 32-bit mixer
#[inline]
pub fn mix32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Fold a u64 into 32 bits before mixing
#[inline]
pub fn fold64(value: u64) -> u32 {
    mix32((value as u32) ^ mix32((value >> 32) as u32).wrapping_add(0x9e37_79b9))
}

/// Seed for a spawned event from (system seed, tick, spawn counter)
pub fn event_seed(system_seed: u32, tick: u64, counter: u32) -> u32 {
    let h = mix32(system_seed ^ 0x5bd1_e995);
    let h = mix32(h ^ fold64(tick));
    mix32(h ^ counter.wrapping_mul(0x85eb_ca6b))
}

/// Hash of a grid coordinate under a seed
#[inline]
pub fn cell_hash(seed: u32, x: i32, y: i32) -> u32 {
    let h = seed ^ (x as u32).wrapping_mul(0x27d4_eb2d);
    mix32(mix32(h) ^ (y as u32).wrapping_mul(0x1656_67b1))
}

/// Map a hash to [0, 1)
#[inline]
pub fn hash_unit(h: u32) -> f32 {
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Per-cell value in [0, 1)
#[inline]
pub fn hash01(seed: u32, x: i32, y: i32) -> f32 {
    hash_unit(cell_hash(seed, x, y))
}

/// FNV-1a over a string
pub fn str_hash(s: &str) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for b in s.bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}
