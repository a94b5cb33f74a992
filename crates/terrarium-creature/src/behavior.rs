//! Per-tick creature behavior: movement scoring, needs and grazing

use terrarium_simulation::{CellSample, SimRng, TileType, WorldGrid};

use crate::creature::{Creature, MAX_HEALTH};
use crate::genome::DietType;
use crate::spatial::SpatialIndex;

/// Score bias applied to the creature's current tile
pub const STAY_MALUS: f32 = 0.04;

/// Tuning knobs shared by every creature update
#[derive(Debug, Clone, Copy)]
pub struct NeedsTuning {
    /// Scales basal metabolism
    pub metabolism: f32,
    /// Scales all timed quantities (ticks per update)
    pub dt: f32,
}

/// Desirability of standing on `(x, y)`. `occupants` excludes the creature itself.
pub fn score_tile(
    creature: &Creature,
    grid: &WorldGrid,
    cell: &CellSample,
    x: i32,
    y: i32,
    occupants: usize,
) -> f32 {
    let g = &creature.genome;
    let water_adjacent = grid.is_water_adjacent(x, y);
    let humidity_seek =
        creature.water_need * (cell.humidity * 0.9 + if water_adjacent { 0.6 } else { 0.0 });
    let temp_mismatch = (cell.temperature - g.preferred_temperature).abs();
    let humidity_mismatch = (cell.humidity - g.preferred_humidity).abs();
    let occupancy_penalty = occupants as f32 * 0.35;
    let biome_penalty = (1.0 - cell.tile.habitability()) * 0.6;
    let water_penalty = match cell.tile {
        TileType::DeepWater => 4.0,
        t if t.is_water() => 2.5,
        _ => 0.0,
    };
    let lava_penalty = if cell.tile.is_lethal() { 10.0 } else { 0.0 };

    cell.fertility * 0.9 + cell.biomass * 1.7 + humidity_seek
        - cell.hazard * 2.2
        - temp_mismatch * 1.7
        - humidity_mismatch * 1.55
        - occupancy_penalty
        - biome_penalty
        - water_penalty
        - lava_penalty
}

/// Pick the tile to move to. Candidates are scanned row-major over a 3x3
/// window (5x5 with perception above 4), drawing one noise value per
/// in-bounds tile. A neighbor must score strictly higher to win.
pub fn choose_move(
    creature: &Creature,
    grid: &WorldGrid,
    index: &SpatialIndex,
    rng: &mut dyn SimRng,
) -> (i32, i32) {
    let radius = if creature.genome.perception_radius > 4 { 2 } else { 1 };
    let (cx, cy) = (creature.x, creature.y);

    let mut best = (cx, cy);
    let mut best_score = f32::NEG_INFINITY;
    let mut stay_score = f32::NEG_INFINITY;
    let mut candidates: smallvec::SmallVec<[(i32, i32, f32); 25]> = smallvec::SmallVec::new();

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (x, y) = (cx + dx, cy + dy);
            let Some(cell) = grid.sample(x, y) else {
                continue;
            };
            let here = dx == 0 && dy == 0;
            let mut occupants = index.occupancy(x, y);
            if here {
                occupants = occupants.saturating_sub(1);
            }
            let noise = (rng.next_float() - 0.5) * 0.08;
            let mut score = score_tile(creature, grid, &cell, x, y, occupants) + noise;
            if here {
                score -= STAY_MALUS;
                stay_score = score;
            } else {
                candidates.push((x, y, score));
            }
        }
    }

    if stay_score.is_finite() {
        best_score = stay_score;
    }
    for (x, y, score) in candidates {
        if score > best_score {
            best_score = score;
            best = (x, y);
        }
    }
    best
}

/// Apply hydration, stress, metabolism, grazing and health for one tick on
/// the creature's current tile. `distance` is how far it moved this tick.
/// Returns the biomass eaten.
pub fn update_needs(
    creature: &mut Creature,
    grid: &mut WorldGrid,
    distance: u32,
    tuning: NeedsTuning,
) -> f32 {
    let dt = tuning.dt;
    let Some(cell) = grid.sample(creature.x, creature.y) else {
        return 0.0;
    };
    let moved = distance > 0;
    let water_adjacent = grid.is_water_adjacent(creature.x, creature.y);

    creature.update_stress(&cell);
    creature.hazard_exposure = cell.hazard;

    // Hydration
    let mut gain = cell.humidity * 1.2;
    if water_adjacent {
        gain += 3.0;
    }
    if cell.tile.is_water() {
        gain += 6.0;
    }
    let loss = 0.5
        + (cell.temperature - 0.6).max(0.0) * 4.0
        + cell.hazard * 2.0
        + if moved { 0.5 } else { 0.0 };
    creature.set_hydration(creature.hydration + (gain - loss) * dt);

    // Energy drain
    let g = &creature.genome;
    let mut drain = g.metabolism_rate * tuning.metabolism
        + creature.stress_load()
        + cell.hazard * 3.0
        + creature.water_need * creature.water_need * 2.0;
    if cell.tile.is_lethal() {
        drain += 25.0;
    }
    if !cell.tile.is_on_biome() {
        drain += 0.8;
    }
    creature.energy -= drain * dt + g.move_cost * distance as f32;

    // Grazing
    let eaten = graze(creature, grid, dt);

    creature.energy = creature.energy.min(creature.genome.max_energy);

    // Health
    let mut health_delta = if creature.energy > creature.genome.max_energy * 0.25 {
        0.6
    } else {
        -1.2
    };
    if creature.hydration < 20.0 {
        health_delta -= (20.0 - creature.hydration) * 0.08;
    }
    if cell.hazard > 0.5 {
        health_delta -= (cell.hazard - 0.5) * 6.0;
    }
    if cell.tile.is_lethal() {
        health_delta -= 40.0;
    }
    creature.health = (creature.health + health_delta * dt).clamp(0.0, MAX_HEALTH);

    eaten
}

/// Bounded biomass intake. Predators gain nothing from plants.
fn graze(creature: &mut Creature, grid: &mut WorldGrid, dt: f32) -> f32 {
    let g = &creature.genome;
    if !g.diet.grazes() {
        return 0.0;
    }
    let Some(available) = grid.biomass(creature.x, creature.y) else {
        return 0.0;
    };
    let perception = (g.perception_radius as f32 / 10.0).min(1.0);
    let mut cap =
        6.0 * (0.6 + 0.4 * perception) * g.efficiency * (1.0 - 0.5 * creature.mean_stress());
    if g.diet == DietType::Omnivore {
        cap *= 0.7;
    }
    let room = ((g.max_energy - creature.energy) / g.efficiency).max(0.0);
    let intake = available.min(cap * dt).min(room).max(0.0);
    if intake <= 0.0 {
        return 0.0;
    }
    creature.energy += intake * g.efficiency;
    grid.set_biomass(creature.x, creature.y, available - intake);
    intake
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;
    use crate::types::{CreatureId, SpeciesId};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    const TUNING: NeedsTuning = NeedsTuning {
        metabolism: 0.55,
        dt: 1.0,
    };

    fn creature_at(x: i32, y: i32) -> Creature {
        Creature::founder(CreatureId(1), SpeciesId(1), Genome::default(), x, y)
    }

    fn flat_grid() -> WorldGrid {
        WorldGrid::new(16, 16)
    }

    #[test]
    fn test_moves_toward_biomass() {
        let mut grid = flat_grid();
        grid.set_biomass(6, 5, 255.0);
        let c = creature_at(5, 5);
        let mut index = SpatialIndex::new();
        index.rebuild(std::slice::from_ref(&c), grid.width());
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        assert_eq!(choose_move(&c, &grid, &index, &mut rng), (6, 5));
    }

    #[test]
    fn test_avoids_lava_and_water() {
        let mut grid = flat_grid();
        for (x, y) in [(4, 4), (5, 4), (6, 4), (4, 5), (6, 5), (4, 6), (5, 6)] {
            grid.set_tile(x, y, TileType::Lava);
            grid.set_biomass(x, y, 255.0);
        }
        grid.set_tile(6, 6, TileType::DeepWater);
        let c = creature_at(5, 5);
        let mut index = SpatialIndex::new();
        index.rebuild(std::slice::from_ref(&c), grid.width());
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);
        assert_eq!(choose_move(&c, &grid, &index, &mut rng), (5, 5));
    }

    #[test]
    fn test_crowding_pushes_creatures_apart() {
        let grid = flat_grid();
        let creatures: Vec<Creature> = (0..4).map(|_| creature_at(5, 5)).collect();
        let mut index = SpatialIndex::new();
        index.rebuild(&creatures, grid.width());
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        assert_ne!(choose_move(&creatures[0], &grid, &index, &mut rng), (5, 5));
    }

    #[test]
    fn test_grazing_consumes_biomass() {
        let mut grid = flat_grid();
        grid.set_biomass(2, 2, 100.0);
        let mut c = creature_at(2, 2);
        c.energy = 50.0;
        let eaten = update_needs(&mut c, &mut grid, 0, TUNING);
        assert!(eaten > 0.0);
        assert!((grid.biomass(2, 2).unwrap_or(0.0) - (100.0 - eaten)).abs() < 1e-4);
    }

    #[test]
    fn test_predator_gains_no_food() {
        let mut grid = flat_grid();
        grid.set_biomass(2, 2, 200.0);
        let mut c = creature_at(2, 2);
        c.genome.diet = DietType::Predator;
        c.energy = 50.0;
        let eaten = update_needs(&mut c, &mut grid, 0, TUNING);
        assert_eq!(eaten, 0.0);
        assert_eq!(grid.biomass(2, 2), Some(200.0));
        assert!(c.energy < 50.0);
    }

    #[test]
    fn test_lava_is_lethal() {
        let mut grid = flat_grid();
        grid.set_tile(3, 3, TileType::Lava);
        let mut c = creature_at(3, 3);
        for _ in 0..3 {
            update_needs(&mut c, &mut grid, 0, TUNING);
        }
        assert!(c.is_dead());
    }

    #[test]
    fn test_stress_and_water_need_clamped() {
        let mut grid = flat_grid();
        grid.set_value(terrarium_simulation::Layer::Temperature, 1, 1, 255);
        grid.set_value(terrarium_simulation::Layer::Humidity, 1, 1, 0);
        let mut c = creature_at(1, 1);
        for _ in 0..400 {
            update_needs(&mut c, &mut grid, 1, TUNING);
            assert!((0.0..=1.0).contains(&c.water_need));
            assert!((0.0..=1.0).contains(&c.temp_stress));
            assert!((0.0..=1.0).contains(&c.humidity_stress));
        }
    }

    #[test]
    fn test_water_adjacency_rehydrates() {
        let mut grid = flat_grid();
        grid.set_tile(8, 7, TileType::ShallowWater);
        let mut c = creature_at(8, 8);
        c.set_hydration(30.0);
        update_needs(&mut c, &mut grid, 0, TUNING);
        assert!(c.hydration > 30.0);
    }
}
