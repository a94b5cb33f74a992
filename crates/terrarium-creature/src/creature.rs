//! Main creature entity

use glam::IVec2;
use serde::{Deserialize, Serialize};
use terrarium_simulation::CellSample;

use crate::genome::Genome;
use crate::naming;
use crate::types::{CreatureId, SpeciesId};

/// Energy at or below which a creature dies
pub const DEATH_ENERGY: f32 = -2.0;

pub const MAX_HEALTH: f32 = 100.0;
pub const MAX_HYDRATION: f32 = 100.0;

/// Individual creature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: CreatureId,
    pub species: SpeciesId,
    pub name: String,
    pub energy: f32,
    /// 0-100
    pub health: f32,
    /// 0-100
    pub hydration: f32,
    /// Derived: 1 - hydration / 100
    pub water_need: f32,
    pub age: u32,
    /// Lifespan fixed at birth from the genome; re-derived on load
    #[serde(default)]
    pub max_age: u32,
    pub x: i32,
    pub y: i32,
    pub generation: u32,
    #[serde(default)]
    pub parents: [Option<CreatureId>; 2],
    pub genome: Genome,
    #[serde(default)]
    pub temp_stress: f32,
    #[serde(default)]
    pub humidity_stress: f32,
    /// Hazard of the tile at the end of the last update (0.0-1.0)
    #[serde(default)]
    pub hazard_exposure: f32,
}

impl Creature {
    /// Founder creature with a comfortable starting state
    pub fn founder(id: CreatureId, species: SpeciesId, genome: Genome, x: i32, y: i32) -> Self {
        let energy = genome.max_energy * 0.6;
        Self {
            id,
            species,
            name: naming::creature_name(id.0),
            energy,
            health: MAX_HEALTH,
            hydration: 80.0,
            water_need: 0.2,
            age: 0,
            max_age: genome.max_age,
            x,
            y,
            generation: 0,
            parents: [None, None],
            genome,
            temp_stress: 0.0,
            humidity_stress: 0.0,
            hazard_exposure: 0.0,
        }
    }

    pub fn position(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    pub fn is_dead(&self) -> bool {
        self.energy <= DEATH_ENERGY || self.health <= 0.0 || self.age > self.max_age
    }

    /// Recompute instantaneous climate stress for the tile the creature stands on
    pub fn update_stress(&mut self, cell: &CellSample) {
        self.temp_stress = climate_stress(
            cell.temperature,
            self.genome.preferred_temperature,
            self.genome.temperature_tolerance,
        );
        self.humidity_stress = climate_stress(
            cell.humidity,
            self.genome.preferred_humidity,
            self.genome.humidity_tolerance,
        );
    }

    /// Energy drained by climate stress per tick
    pub fn stress_load(&self) -> f32 {
        self.temp_stress * 7.5 + self.humidity_stress * 6.0
    }

    pub fn mean_stress(&self) -> f32 {
        (self.temp_stress + self.humidity_stress) * 0.5
    }

    pub fn set_hydration(&mut self, hydration: f32) {
        self.hydration = if hydration.is_finite() {
            hydration.clamp(0.0, MAX_HYDRATION)
        } else {
            0.0
        };
        self.water_need = (1.0 - self.hydration / MAX_HYDRATION).clamp(0.0, 1.0);
    }

    /// Clamp scalar fields after loading. Returns false if the creature is unrecoverable.
    pub fn sanitize(&mut self) -> bool {
        if !self.energy.is_finite() || !self.health.is_finite() {
            return false;
        }
        self.genome = std::mem::take(&mut self.genome).sanitized();
        self.max_age = self.genome.max_age;
        self.energy = self.energy.min(self.genome.max_energy);
        self.health = self.health.clamp(0.0, MAX_HEALTH);
        self.set_hydration(self.hydration);
        self.temp_stress = unit(self.temp_stress);
        self.humidity_stress = unit(self.humidity_stress);
        self.hazard_exposure = unit(self.hazard_exposure);
        true
    }
}

/// Excess of preference mismatch over tolerance, clamped to 0.0-1.0
pub fn climate_stress(value: f32, preferred: f32, tolerance: f32) -> f32 {
    unit((value - preferred).abs() - tolerance)
}

fn unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrarium_simulation::TileType;

    fn cell(temperature: f32, humidity: f32) -> CellSample {
        CellSample {
            tile: TileType::Grassland,
            humidity,
            temperature,
            fertility: 0.5,
            hazard: 0.0,
            biomass: 0.5,
        }
    }

    #[test]
    fn test_founder_defaults() {
        let c = Creature::founder(CreatureId(3), SpeciesId(1), Genome::default(), 4, 5);
        assert_eq!(c.position(), IVec2::new(4, 5));
        assert_eq!(c.health, MAX_HEALTH);
        assert_eq!(c.generation, 0);
        assert!(c.name.ends_with("-3"));
        assert!(!c.is_dead());
    }

    #[test]
    fn test_death_conditions() {
        let base = Creature::founder(CreatureId(1), SpeciesId(1), Genome::default(), 0, 0);

        let mut c = base.clone();
        c.energy = -2.0;
        assert!(c.is_dead());

        let mut c = base.clone();
        c.health = 0.0;
        assert!(c.is_dead());

        let mut c = base.clone();
        c.age = c.max_age + 1;
        assert!(c.is_dead());

        let mut c = base.clone();
        c.age = c.max_age;
        assert!(!c.is_dead());

        let mut c = base;
        c.energy = -1.9;
        assert!(!c.is_dead());
    }

    #[test]
    fn test_max_age_copied_from_genome() {
        let genome = Genome {
            max_age: 700,
            ..Genome::default()
        };
        let mut c = Creature::founder(CreatureId(4), SpeciesId(1), genome, 0, 0);
        assert_eq!(c.max_age, 700);

        // Older snapshots carry no lifespan; loading restores it from the genome
        c.max_age = 0;
        assert!(c.sanitize());
        assert_eq!(c.max_age, 700);
        c.age = 650;
        assert!(!c.is_dead());
    }

    #[test]
    fn test_stress_within_tolerance_is_zero() {
        let mut c = Creature::founder(CreatureId(1), SpeciesId(1), Genome::default(), 0, 0);
        c.update_stress(&cell(0.55, 0.45));
        assert_eq!(c.temp_stress, 0.0);
        assert_eq!(c.humidity_stress, 0.0);
        assert_eq!(c.stress_load(), 0.0);
    }

    #[test]
    fn test_stress_clamped_to_unit() {
        assert!((climate_stress(1.0, 0.0, 0.04) - 0.96).abs() < 1e-6);
        assert_eq!(climate_stress(5.0, 0.0, 0.0), 1.0);
        assert_eq!(climate_stress(f32::NAN, 0.5, 0.1), 0.0);
    }

    #[test]
    fn test_set_hydration_derives_water_need() {
        let mut c = Creature::founder(CreatureId(1), SpeciesId(1), Genome::default(), 0, 0);
        c.set_hydration(25.0);
        assert!((c.water_need - 0.75).abs() < 1e-6);
        c.set_hydration(300.0);
        assert_eq!(c.water_need, 0.0);
        c.set_hydration(-5.0);
        assert_eq!(c.water_need, 1.0);
    }

    #[test]
    fn test_sanitize_rejects_nan_energy() {
        let mut c = Creature::founder(CreatureId(1), SpeciesId(1), Genome::default(), 0, 0);
        c.energy = f32::NAN;
        assert!(!c.sanitize());

        let mut c = Creature::founder(CreatureId(1), SpeciesId(1), Genome::default(), 0, 0);
        c.energy = 10_000.0;
        c.temp_stress = 4.0;
        assert!(c.sanitize());
        assert_eq!(c.energy, c.genome.max_energy);
        assert_eq!(c.temp_stress, 1.0);
    }
}
