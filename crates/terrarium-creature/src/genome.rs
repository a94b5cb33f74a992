//! Creature genome: the numeric traits that drive metabolism, movement,
//! reproduction and environmental preference.

use serde::{Deserialize, Serialize};
use terrarium_simulation::SimRng;

/// What a creature eats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietType {
    #[default]
    Herbivore,
    Omnivore,
    Predator,
}

impl DietType {
    pub const ALL: [DietType; 3] = [DietType::Herbivore, DietType::Omnivore, DietType::Predator];

    /// Whether this diet draws energy from plant biomass
    pub fn grazes(self) -> bool {
        matches!(self, DietType::Herbivore | DietType::Omnivore)
    }
}

/// Inclusive valid range of a numeric gene
#[derive(Debug, Clone, Copy)]
pub struct GeneRange {
    pub min: f32,
    pub max: f32,
}

impl GeneRange {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    pub fn clamp(&self, v: f32) -> f32 {
        if v.is_finite() {
            v.clamp(self.min, self.max)
        } else {
            (self.min + self.max) * 0.5
        }
    }
}

pub mod ranges {
    use super::GeneRange;

    pub const METABOLISM: GeneRange = GeneRange::new(0.5, 1.6);
    pub const MOVE_COST: GeneRange = GeneRange::new(0.1, 1.0);
    pub const EFFICIENCY: GeneRange = GeneRange::new(0.5, 1.5);
    pub const MAX_ENERGY: GeneRange = GeneRange::new(100.0, 240.0);
    pub const MAX_AGE: GeneRange = GeneRange::new(500.0, 1600.0);
    pub const REPRODUCTION_THRESHOLD: GeneRange = GeneRange::new(40.0, 160.0);
    pub const REPRODUCTION_COST: GeneRange = GeneRange::new(20.0, 60.0);
    pub const PERCEPTION: GeneRange = GeneRange::new(1.0, 8.0);
    pub const PREFERENCE: GeneRange = GeneRange::new(0.0, 1.0);
    pub const TOLERANCE: GeneRange = GeneRange::new(0.04, 0.4);
}

/// Heritable creature traits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub metabolism_rate: f32,
    pub move_cost: f32,
    pub efficiency: f32,
    pub max_energy: f32,
    pub max_age: u32,
    pub reproduction_threshold: f32,
    pub reproduction_cost: f32,
    pub perception_radius: u8,
    pub diet: DietType,
    /// Preferred normalized temperature (0.0-1.0)
    pub preferred_temperature: f32,
    /// Preferred normalized humidity (0.0-1.0)
    pub preferred_humidity: f32,
    pub temperature_tolerance: f32,
    pub humidity_tolerance: f32,
}

impl Default for Genome {
    fn default() -> Self {
        Self {
            metabolism_rate: 1.0,
            move_cost: 0.4,
            efficiency: 1.0,
            max_energy: 170.0,
            max_age: 1000,
            reproduction_threshold: 100.0,
            reproduction_cost: 40.0,
            perception_radius: 3,
            diet: DietType::Herbivore,
            preferred_temperature: 0.5,
            preferred_humidity: 0.5,
            temperature_tolerance: 0.18,
            humidity_tolerance: 0.18,
        }
    }
}

fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

impl Genome {
    /// Random founder genome. Draw order is fixed.
    pub fn random(rng: &mut dyn SimRng) -> Self {
        let metabolism_rate = lerp(0.6, 1.4, rng.next_float());
        let move_cost = lerp(0.2, 0.8, rng.next_float());
        let efficiency = lerp(0.6, 1.4, rng.next_float());
        let max_energy = lerp(120.0, 220.0, rng.next_float());
        let max_age = lerp(600.0, 1400.0, rng.next_float()).round() as u32;
        let reproduction_threshold = lerp(60.0, 140.0, rng.next_float());
        let reproduction_cost = lerp(25.0, 55.0, rng.next_float());
        let perception_radius = rng.range_int(2, 7) as u8;
        let diet = match rng.next_float() {
            r if r < 0.70 => DietType::Herbivore,
            r if r < 0.92 => DietType::Omnivore,
            _ => DietType::Predator,
        };
        let preferred_temperature = lerp(0.25, 0.75, rng.next_float());
        let preferred_humidity = lerp(0.25, 0.75, rng.next_float());
        let temperature_tolerance = lerp(0.08, 0.3, rng.next_float());
        let humidity_tolerance = lerp(0.08, 0.3, rng.next_float());

        Self {
            metabolism_rate,
            move_cost,
            efficiency,
            max_energy,
            max_age,
            reproduction_threshold,
            reproduction_cost,
            perception_radius,
            diet,
            preferred_temperature,
            preferred_humidity,
            temperature_tolerance,
            humidity_tolerance,
        }
    }

    /// Mutated copy. Each gene consumes exactly one draw, in declaration order.
    pub fn mutated(&self, rng: &mut dyn SimRng, rate: f32) -> Self {
        let rate = if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut nudge = |value: f32, range: GeneRange| -> f32 {
            let d = (rng.next_float() * 2.0 - 1.0) * rate * range.span();
            range.clamp(value + d)
        };

        let metabolism_rate = nudge(self.metabolism_rate, ranges::METABOLISM);
        let move_cost = nudge(self.move_cost, ranges::MOVE_COST);
        let efficiency = nudge(self.efficiency, ranges::EFFICIENCY);
        let max_energy = nudge(self.max_energy, ranges::MAX_ENERGY);
        let max_age = nudge(self.max_age as f32, ranges::MAX_AGE).round() as u32;
        let reproduction_threshold =
            nudge(self.reproduction_threshold, ranges::REPRODUCTION_THRESHOLD);
        let reproduction_cost = nudge(self.reproduction_cost, ranges::REPRODUCTION_COST);
        let preferred_temperature = nudge(self.preferred_temperature, ranges::PREFERENCE);
        let preferred_humidity = nudge(self.preferred_humidity, ranges::PREFERENCE);
        let temperature_tolerance = nudge(self.temperature_tolerance, ranges::TOLERANCE);
        let humidity_tolerance = nudge(self.humidity_tolerance, ranges::TOLERANCE);

        // Perception steps by one tile at the tails of a single draw
        let r = rng.next_float();
        let perception = self.perception_radius as i32
            + if r < rate * 0.5 {
                -1
            } else if r > 1.0 - rate * 0.5 {
                1
            } else {
                0
            };
        let perception_radius = ranges::PERCEPTION.clamp(perception as f32) as u8;

        // Diet switches rarely; the same draw picks the new diet
        let r = rng.next_float();
        let switch_p = rate * 0.1;
        let diet = if switch_p > 0.0 && r < switch_p {
            DietType::ALL[((r / switch_p) * 3.0) as usize % 3]
        } else {
            self.diet
        };

        Self {
            metabolism_rate,
            move_cost,
            efficiency,
            max_energy,
            max_age,
            reproduction_threshold,
            reproduction_cost,
            perception_radius,
            diet,
            preferred_temperature,
            preferred_humidity,
            temperature_tolerance,
            humidity_tolerance,
        }
    }

    /// Normalized genetic distance: mean per-gene difference over the gene
    /// span, plus 0.5 when diets differ.
    pub fn distance(&self, other: &Genome) -> f32 {
        let pairs = [
            (self.metabolism_rate, other.metabolism_rate, ranges::METABOLISM),
            (self.move_cost, other.move_cost, ranges::MOVE_COST),
            (self.efficiency, other.efficiency, ranges::EFFICIENCY),
            (self.max_energy, other.max_energy, ranges::MAX_ENERGY),
            (self.max_age as f32, other.max_age as f32, ranges::MAX_AGE),
            (
                self.reproduction_threshold,
                other.reproduction_threshold,
                ranges::REPRODUCTION_THRESHOLD,
            ),
            (
                self.reproduction_cost,
                other.reproduction_cost,
                ranges::REPRODUCTION_COST,
            ),
            (
                self.perception_radius as f32,
                other.perception_radius as f32,
                ranges::PERCEPTION,
            ),
            (
                self.preferred_temperature,
                other.preferred_temperature,
                ranges::PREFERENCE,
            ),
            (
                self.preferred_humidity,
                other.preferred_humidity,
                ranges::PREFERENCE,
            ),
            (
                self.temperature_tolerance,
                other.temperature_tolerance,
                ranges::TOLERANCE,
            ),
            (
                self.humidity_tolerance,
                other.humidity_tolerance,
                ranges::TOLERANCE,
            ),
        ];
        let sum: f32 = pairs
            .iter()
            .map(|(a, b, r)| ((a - b).abs() / r.span()).min(1.0))
            .sum();
        let diet = if self.diet == other.diet { 0.0 } else { 0.5 };
        sum / pairs.len() as f32 + diet
    }

    /// Clamp every gene into its valid range (used on hydrate)
    pub fn sanitized(mut self) -> Self {
        self.metabolism_rate = ranges::METABOLISM.clamp(self.metabolism_rate);
        self.move_cost = ranges::MOVE_COST.clamp(self.move_cost);
        self.efficiency = ranges::EFFICIENCY.clamp(self.efficiency);
        self.max_energy = ranges::MAX_ENERGY.clamp(self.max_energy);
        self.max_age = ranges::MAX_AGE.clamp(self.max_age as f32) as u32;
        self.reproduction_threshold =
            ranges::REPRODUCTION_THRESHOLD.clamp(self.reproduction_threshold);
        self.reproduction_cost = ranges::REPRODUCTION_COST.clamp(self.reproduction_cost);
        self.perception_radius = ranges::PERCEPTION.clamp(self.perception_radius as f32) as u8;
        self.preferred_temperature = ranges::PREFERENCE.clamp(self.preferred_temperature);
        self.preferred_humidity = ranges::PREFERENCE.clamp(self.preferred_humidity);
        self.temperature_tolerance = ranges::TOLERANCE.clamp(self.temperature_tolerance);
        self.humidity_tolerance = ranges::TOLERANCE.clamp(self.humidity_tolerance);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_random_genome_within_ranges() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        for _ in 0..200 {
            let g = Genome::random(&mut rng);
            assert_eq!(g.clone().sanitized(), g);
            assert!((2..=7).contains(&g.perception_radius));
        }
    }

    #[test]
    fn test_random_genome_diet_mix() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(99);
        let mut herbivores = 0;
        let mut others = 0;
        for _ in 0..500 {
            match Genome::random(&mut rng).diet {
                DietType::Herbivore => herbivores += 1,
                _ => others += 1,
            }
        }
        assert!(herbivores > others);
        assert!(others > 0);
    }

    #[test]
    fn test_mutation_zero_rate_is_identity() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let g = Genome::random(&mut rng);
        let m = g.mutated(&mut rng, 0.0);
        assert_eq!(g, m);
    }

    #[test]
    fn test_mutation_stays_close_and_clamped() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let g = Genome::random(&mut rng);
        for _ in 0..100 {
            let m = g.mutated(&mut rng, 0.08);
            assert_eq!(m.clone().sanitized(), m);
            // Diet switches add 0.5, so only check same-diet children.
            // Perception moves in whole tiles and can exceed the rate on its own.
            if m.diet == g.diet {
                assert!(g.distance(&m) <= 0.1);
            }
        }
    }

    #[test]
    fn test_distance_properties() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let a = Genome::random(&mut rng);
        let b = Genome::random(&mut rng);
        assert_eq!(a.distance(&a), 0.0);
        assert!((a.distance(&b) - b.distance(&a)).abs() < 1e-6);

        let mut c = a.clone();
        c.diet = match a.diet {
            DietType::Herbivore => DietType::Predator,
            _ => DietType::Herbivore,
        };
        assert!((a.distance(&c) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sanitize_fixes_non_finite() {
        let g = Genome {
            metabolism_rate: f32::NAN,
            max_energy: 10_000.0,
            perception_radius: 0,
            ..Genome::default()
        }
        .sanitized();
        assert!(g.metabolism_rate.is_finite());
        assert_eq!(g.max_energy, 240.0);
        assert_eq!(g.perception_radius, 1);
    }

    #[test]
    fn test_genome_serialization() {
        let genome = Genome::default();
        let serialized =
            bincode_next::serde::encode_to_vec(&genome, bincode_next::config::standard())
                .expect("Failed to serialize genome");
        let (deserialized, _): (Genome, _) =
            bincode_next::serde::decode_from_slice(&serialized, bincode_next::config::standard())
                .expect("Failed to deserialize genome");
        assert_eq!(deserialized, genome);
    }
}
