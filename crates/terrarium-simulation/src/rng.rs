//! RNG trait abstraction for the simulation
//!
//! Every stochastic decision in the simulation goes through [`SimRng`], so a
//! run is reproducible from its seed and the exact sequence of calls. Works
//! with any `rand::Rng` (seeded `Xoshiro256StarStar` in sessions, scripted
//! generators in tests).

/// Random number generator trait for the simulation
pub trait SimRng {
    /// Generate random f32 in [0.0, 1.0)
    fn next_float(&mut self) -> f32;

    /// Generate random integer in [0, n). Returns 0 when `n == 0`.
    fn next_int(&mut self, n: u32) -> u32;

    /// Generate random integer in [min, max] (inclusive). Returns `min` when `max <= min`.
    fn range_int(&mut self, min: i32, max: i32) -> i32;

    /// Check if random value is less than probability threshold
    fn chance(&mut self, probability: f32) -> bool {
        self.next_float() < probability
    }
}

// Blanket implementation for any type implementing rand::Rng
impl<T: ?Sized + rand::Rng> SimRng for T {
    fn next_float(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }

    fn next_int(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        rand::Rng::gen_range(self, 0..n)
    }

    fn range_int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        rand::Rng::gen_range(self, min..=max)
    }
}
