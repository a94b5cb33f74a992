//! Creature population engine
//!
//! Owns the creature arena, the corpse field, the disposable spatial index
//! and the cognition tracker. Genetics and lifecycle observers are passed in
//! per call through [`GeneticsProvider`] and [`PopulationHooks`].

use std::collections::BTreeMap;

use ahash::AHashMap;
use glam::IVec2;
use serde::{Deserialize, Serialize};
use terrarium_simulation::{RecentEvent, SimRng, WorldGrid};

use crate::behavior::{NeedsTuning, choose_move, update_needs};
use crate::cognition::{CognitionState, CognitionTracker, SpeciesAggregate};
use crate::corpse::{CORPSE_NUTRIENT, CORPSE_TICKS, CorpseField, CorpseState};
use crate::creature::{Creature, MAX_HEALTH};
use crate::spatial::SpatialIndex;
use crate::traits::{GeneticsProvider, PopulationHooks};
use crate::types::{CreatureId, SpeciesId};

/// Random position draws per founder before giving up
const SPAWN_ATTEMPTS: usize = 40;

/// 8-neighborhood, clockwise from the top-left
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Population tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Multiplier on every genome's metabolism rate
    pub metabolism_tuning: f32,
    pub max_population: usize,
    /// Newborns allowed per tick
    pub newborn_cap: usize,
    /// Corpse cells visited per tick
    pub decomposition_budget: usize,
    pub min_reproduction_age: u32,
    pub min_reproduction_hydration: f32,
    pub reproduction_chance: f32,
    pub mutation_rate: f32,
    /// A birth tile must hold fewer creatures than this
    pub max_birth_occupancy: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            metabolism_tuning: 0.55,
            max_population: 4000,
            newborn_cap: 64,
            decomposition_budget: 900,
            min_reproduction_age: 22,
            min_reproduction_hydration: 42.0,
            reproduction_chance: 0.12,
            mutation_rate: 0.08,
            max_birth_occupancy: 2,
        }
    }
}

impl PopulationConfig {
    /// Deterministic reproduction gates (no RNG)
    fn is_fertile(&self, c: &Creature) -> bool {
        c.energy >= c.genome.reproduction_threshold
            && c.energy > c.genome.reproduction_cost
            && c.age >= self.min_reproduction_age
            && c.hydration >= self.min_reproduction_hydration
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.metabolism_tuning.is_finite() || self.metabolism_tuning < 0.0 {
            self.metabolism_tuning = defaults.metabolism_tuning;
        }
        if !self.reproduction_chance.is_finite() {
            self.reproduction_chance = defaults.reproduction_chance;
        }
        self.reproduction_chance = self.reproduction_chance.clamp(0.0, 1.0);
        if !self.mutation_rate.is_finite() {
            self.mutation_rate = defaults.mutation_rate;
        }
        self.mutation_rate = self.mutation_rate.clamp(0.0, 1.0);
        if !self.min_reproduction_hydration.is_finite() {
            self.min_reproduction_hydration = defaults.min_reproduction_hydration;
        }
        self.max_birth_occupancy = self.max_birth_occupancy.max(1);
        self
    }
}

/// What happened during one population step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationStepResult {
    /// Any grid value or creature position changed
    pub changed: bool,
    pub births: usize,
    pub deaths: usize,
    pub speciations: usize,
    /// Species that crossed the intelligence threshold this tick
    pub newly_intelligent: Vec<SpeciesId>,
}

/// Read-only per-species summary for reports and UIs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesStats {
    pub id: SpeciesId,
    pub name: String,
    pub population: usize,
    pub peak_population: usize,
    pub mean_energy: f32,
    pub mean_generation: f32,
    pub intelligence: f32,
    pub language_level: f32,
    pub first_intelligent_tick: Option<u64>,
    pub extinct_tick: Option<u64>,
    pub latest_thought: Option<String>,
}

/// Plain snapshot of the population
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationState {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub creatures: Vec<Creature>,
    #[serde(default)]
    pub corpses: CorpseState,
    #[serde(default)]
    pub cognition: CognitionState,
}

pub struct PopulationEngine {
    config: PopulationConfig,
    creatures: Vec<Creature>,
    next_id: u64,
    corpses: CorpseField,
    index: SpatialIndex,
    cognition: CognitionTracker,
}

impl PopulationEngine {
    pub fn new(config: PopulationConfig) -> Self {
        Self {
            config: config.sanitized(),
            creatures: Vec::new(),
            next_id: 1,
            corpses: CorpseField::default(),
            index: SpatialIndex::new(),
            cognition: CognitionTracker::new(),
        }
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    /// Living creatures in arena order
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    pub fn population(&self) -> usize {
        self.creatures.len()
    }

    pub fn corpses(&self) -> &CorpseField {
        &self.corpses
    }

    pub fn cognition(&self) -> &CognitionTracker {
        &self.cognition
    }

    pub fn cognition_mut(&mut self) -> &mut CognitionTracker {
        &mut self.cognition
    }

    /// Insert a creature as-is and return its arena index. The id counter
    /// is advanced past its id.
    pub fn insert(&mut self, creature: Creature, grid_width: usize) -> usize {
        self.next_id = self.next_id.max(creature.id.0 + 1);
        self.creatures.push(creature);
        self.index.rebuild(&self.creatures, grid_width);
        self.creatures.len() - 1
    }

    /// Mutable access for tools and tests. The spatial index is refreshed on the next step.
    pub fn creature_mut(&mut self, arena_index: usize) -> Option<&mut Creature> {
        self.creatures.get_mut(arena_index)
    }

    /// Creatures inside the inclusive rectangle, in arena order
    pub fn query_creatures_in_rect(&self, min: IVec2, max: IVec2) -> Vec<&Creature> {
        self.index
            .query_rect(&self.creatures, min, max)
            .into_iter()
            .filter_map(|i| self.creatures.get(i))
            .collect()
    }

    /// Place up to `count` founders on random habitable tiles. Returns the
    /// number actually placed.
    pub fn spawn_initial(
        &mut self,
        grid: &WorldGrid,
        rng: &mut dyn SimRng,
        genetics: &mut dyn GeneticsProvider,
        count: usize,
        tick: u64,
    ) -> usize {
        let (w, h) = (grid.width() as u32, grid.height() as u32);
        let mut placed = 0;
        for _ in 0..count {
            if self.creatures.len() >= self.config.max_population {
                break;
            }
            let mut spot = None;
            for _ in 0..SPAWN_ATTEMPTS {
                let x = rng.next_int(w) as i32;
                let y = rng.next_int(h) as i32;
                if grid.tile(x, y).is_some_and(is_habitable) {
                    spot = Some((x, y));
                    break;
                }
            }
            let Some((x, y)) = spot else {
                continue;
            };

            let genome = genetics.create_random_genome(rng);
            let base = genetics.ensure_base_species(&genome, tick);
            let assignment = genetics.assign_species(&genome, Some(base), tick);
            let id = CreatureId(self.next_id);
            self.next_id += 1;
            self.creatures
                .push(Creature::founder(id, assignment.species_id, genome, x, y));
            placed += 1;
        }

        self.corpses.resize(grid.len());
        self.index.rebuild(&self.creatures, grid.width());
        log::info!(
            "Spawned {}/{} founders. Population: {}",
            placed,
            count,
            self.creatures.len()
        );
        placed
    }

    /// Advance every creature by one tick
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        grid: &mut WorldGrid,
        rng: &mut dyn SimRng,
        dt_ticks: u32,
        tick: u64,
        recent_events: &[RecentEvent],
        genetics: &mut dyn GeneticsProvider,
        hooks: &mut dyn PopulationHooks,
    ) -> PopulationStepResult {
        let mut result = PopulationStepResult::default();
        let dt = dt_ticks.max(1);
        let tuning = NeedsTuning {
            metabolism: self.config.metabolism_tuning,
            dt: dt as f32,
        };

        self.corpses.resize(grid.len());
        result.changed |= self
            .corpses
            .decompose(grid, self.config.decomposition_budget);

        self.index.rebuild(&self.creatures, grid.width());

        let count = self.creatures.len();
        let mut alive = vec![true; count];
        let mut newborns: Vec<Creature> = Vec::new();
        let mut newborn_tiles: AHashMap<(i32, i32), usize> = AHashMap::new();

        for i in 0..count {
            if self.creatures[i].is_dead() {
                self.bury(i, grid, tick, hooks);
                alive[i] = false;
                result.deaths += 1;
                continue;
            }

            // Movement
            let from = self.creatures[i].position();
            let (nx, ny) = choose_move(&self.creatures[i], grid, &self.index, rng);
            let distance = (nx - from.x).abs().max((ny - from.y).abs()) as u32;
            if distance > 0 {
                self.index.relocate(i as u32, from, IVec2::new(nx, ny));
                result.changed = true;
            }

            // Needs, feeding, health
            let creature = &mut self.creatures[i];
            creature.x = nx;
            creature.y = ny;
            creature.age = creature.age.saturating_add(dt);
            if update_needs(creature, grid, distance, tuning) > 0.0 {
                result.changed = true;
            }

            if creature.is_dead() {
                self.bury(i, grid, tick, hooks);
                alive[i] = false;
                result.deaths += 1;
                continue;
            }

            // Reproduction
            if newborns.len() >= self.config.newborn_cap
                || count - result.deaths + newborns.len() >= self.config.max_population
            {
                continue;
            }
            let parent = &self.creatures[i];
            if !self.config.is_fertile(parent) || !rng.chance(self.config.reproduction_chance) {
                continue;
            }
            let start = rng.next_int(NEIGHBORS.len() as u32) as usize;
            let Some((bx, by)) = find_birth_tile(
                grid,
                &self.index,
                &newborn_tiles,
                parent.position(),
                start,
                self.config.max_birth_occupancy,
            ) else {
                continue;
            };
            let mate = find_mate(&self.creatures, &alive, &self.index, i);

            let genome = genetics.mutate(&parent.genome, rng, self.config.mutation_rate);
            let assignment = genetics.assign_species(&genome, Some(parent.species), tick);
            let child_id = CreatureId(self.next_id);
            self.next_id += 1;

            let parent = &mut self.creatures[i];
            let cost = parent.genome.reproduction_cost;
            let child_hydration = parent.hydration * 0.5 + 20.0;
            parent.energy -= cost;
            parent.set_hydration(parent.hydration - 8.0);

            let mut child = Creature::founder(child_id, assignment.species_id, genome, bx, by);
            child.energy = cost * 0.9;
            child.health = MAX_HEALTH;
            child.set_hydration(child_hydration);
            child.generation = parent.generation + 1;
            child.parents = [Some(parent.id), mate];

            if assignment.created {
                result.speciations += 1;
                hooks.on_speciation(assignment.species_id, parent.species, tick);
            }
            hooks.on_birth(child_id, parent.id, assignment.species_id, tick);

            *newborn_tiles.entry((bx, by)).or_default() += 1;
            newborns.push(child);
        }

        // Merge survivors and newborns
        let mut k = 0;
        self.creatures.retain(|_| {
            let keep = alive[k];
            k += 1;
            keep
        });
        result.births = newborns.len();
        result.changed |= result.births > 0 || result.deaths > 0;
        self.creatures.extend(newborns);
        self.index.rebuild(&self.creatures, grid.width());

        // Species bookkeeping and cognition
        let mut counts: BTreeMap<SpeciesId, usize> = BTreeMap::new();
        let mut sums: BTreeMap<SpeciesId, SpeciesAggregate> = BTreeMap::new();
        for c in &self.creatures {
            *counts.entry(c.species).or_default() += 1;
            sums.entry(c.species).or_default().add(c);
        }
        genetics.set_population_counts(&counts, tick);

        let aggregates: BTreeMap<SpeciesId, SpeciesAggregate> =
            sums.into_iter().map(|(id, a)| (id, a.finish())).collect();
        self.cognition.observe_events(recent_events);
        result.newly_intelligent = self.cognition.update(&aggregates, tick);
        for &species in &result.newly_intelligent {
            hooks.on_intelligence(species, tick);
        }

        log::debug!(
            "Population tick {}: {} alive, {} births, {} deaths, {} speciations",
            tick,
            self.creatures.len(),
            result.births,
            result.deaths,
            result.speciations
        );
        result
    }

    /// Leave a corpse where creature `i` stands and drop it from the index
    fn bury(&mut self, i: usize, grid: &WorldGrid, tick: u64, hooks: &mut dyn PopulationHooks) {
        let c = &self.creatures[i];
        if let Some(idx) = grid.index(c.x, c.y) {
            self.corpses.deposit(idx, CORPSE_TICKS, CORPSE_NUTRIENT);
        }
        self.index.remove(i as u32, c.x, c.y);
        hooks.on_death(c.id, c.species, tick);
    }

    /// Per-species summary, ordered by species id
    pub fn species_stats(&self, genetics: &dyn GeneticsProvider) -> Vec<SpeciesStats> {
        let mut totals: BTreeMap<SpeciesId, (usize, f32, f32)> = BTreeMap::new();
        for c in &self.creatures {
            let t = totals.entry(c.species).or_default();
            t.0 += 1;
            t.1 += c.energy;
            t.2 += c.generation as f32;
        }

        genetics
            .all_species()
            .into_iter()
            .map(|s| {
                let (population, energy, generation) =
                    totals.get(&s.id).copied().unwrap_or_default();
                let n = population.max(1) as f32;
                let cog = self.cognition.get(s.id);
                SpeciesStats {
                    id: s.id,
                    name: s.name.clone(),
                    population,
                    peak_population: s.peak_population,
                    mean_energy: energy / n,
                    mean_generation: generation / n,
                    intelligence: cog.map_or(0.0, |c| c.intelligence),
                    language_level: cog.map_or(0.0, |c| c.language_level),
                    first_intelligent_tick: cog.and_then(|c| c.first_intelligent_tick),
                    extinct_tick: s.extinct_tick,
                    latest_thought: cog.and_then(|c| c.thoughts.back()).map(|l| l.text.clone()),
                }
            })
            .collect()
    }

    pub fn export_state(&self) -> PopulationState {
        PopulationState {
            next_id: self.next_id,
            creatures: self.creatures.clone(),
            corpses: self.corpses.export_state(),
            cognition: self.cognition.export_state(),
        }
    }

    /// Restore from a snapshot taken on a `width x height` grid. Creatures
    /// out of bounds or with non-finite vitals are dropped.
    pub fn hydrate_state(&mut self, state: PopulationState, width: usize, height: usize) {
        let mut max_id = 0;
        let mut dropped = 0;
        self.creatures.clear();
        for mut c in state.creatures {
            let in_bounds =
                c.x >= 0 && c.y >= 0 && (c.x as usize) < width && (c.y as usize) < height;
            if !in_bounds || !c.sanitize() {
                dropped += 1;
                continue;
            }
            max_id = max_id.max(c.id.0);
            self.creatures.push(c);
        }
        if dropped > 0 {
            log::warn!("Dropped {} malformed creatures from snapshot", dropped);
        }
        self.next_id = state.next_id.max(max_id + 1);
        self.corpses.hydrate_state(state.corpses, width * height);
        self.cognition.hydrate_state(state.cognition);
        self.index.rebuild(&self.creatures, width);
    }
}

fn is_habitable(tile: terrarium_simulation::TileType) -> bool {
    !tile.is_water() && !tile.is_lethal() && tile.is_on_biome()
}

fn find_birth_tile(
    grid: &WorldGrid,
    index: &SpatialIndex,
    newborn_tiles: &AHashMap<(i32, i32), usize>,
    at: IVec2,
    start: usize,
    max_occupancy: usize,
) -> Option<(i32, i32)> {
    (0..NEIGHBORS.len()).find_map(|k| {
        let (dx, dy) = NEIGHBORS[(start + k) % NEIGHBORS.len()];
        let (x, y) = (at.x + dx, at.y + dy);
        let tile = grid.tile(x, y)?;
        if !is_habitable(tile) {
            return None;
        }
        let occupancy = index.occupancy(x, y) + newborn_tiles.get(&(x, y)).copied().unwrap_or(0);
        (occupancy < max_occupancy).then_some((x, y))
    })
}

/// First living same-species creature on a tile adjacent to creature `i`
fn find_mate(
    creatures: &[Creature],
    alive: &[bool],
    index: &SpatialIndex,
    i: usize,
) -> Option<CreatureId> {
    let me = &creatures[i];
    NEIGHBORS.iter().find_map(|&(dx, dy)| {
        index
            .occupants(me.x + dx, me.y + dy)
            .iter()
            .map(|&j| j as usize)
            .find(|&j| {
                j != i
                    && alive.get(j).copied().unwrap_or(false)
                    && creatures.get(j).is_some_and(|o| o.species == me.species)
            })
            .and_then(|j| creatures.get(j).map(|o| o.id))
    })
}
