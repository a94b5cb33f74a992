//! Simulation session: owns the world and every subsystem, advances them in
//! a fixed order once per tick

use glam::IVec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};
use terrarium_creature::{
    Creature, PopulationConfig, PopulationEngine, PopulationHooks, PopulationState, SpeciesId,
    SpeciesRegistry, SpeciesRegistryState, SpeciesStats, species::DEFAULT_SPECIATION_THRESHOLD,
};
use terrarium_simulation::hash::fold64;
use terrarium_simulation::{ChunkCoord, EventKind, Overlay, WorldGrid};

use crate::events::{EventEngine, EventEngineConfig, EventEngineState, EventSpawnRequest};
use crate::volcano::{VolcanoConfig, VolcanoState, VolcanoSystem};
use crate::world::{ClimateConfig, ClimateState, ClimateSystem, WorldGenConfig, WorldGenerator};

/// Snapshot format version, bumped on incompatible layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub initial_creatures: usize,
    pub speciation_threshold: f32,
    pub worldgen: WorldGenConfig,
    pub climate: ClimateConfig,
    pub events: EventEngineConfig,
    pub volcano: VolcanoConfig,
    pub population: PopulationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 256,
            height: 192,
            initial_creatures: 180,
            speciation_threshold: DEFAULT_SPECIATION_THRESHOLD,
            worldgen: WorldGenConfig::default(),
            climate: ClimateConfig::default(),
            events: EventEngineConfig::default(),
            volcano: VolcanoConfig::default(),
            population: PopulationConfig::default(),
        }
    }
}

/// Everything that happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The tick that was simulated
    pub tick: u64,
    pub changed: bool,
    pub overlay: Overlay,
    pub spawned_event: Option<u64>,
    pub completed_events: Vec<u64>,
    /// Log id of a volcano eruption that began this tick
    pub eruption_started: Option<u64>,
    pub births: usize,
    pub deaths: usize,
    pub speciations: usize,
    pub newly_intelligent: Vec<SpeciesId>,
    pub population: usize,
}

/// Complete session snapshot, sufficient for a bit-exact resume
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub config: SimulationConfig,
    #[serde(default)]
    pub tick: u64,
    #[serde(default)]
    pub grid: WorldGrid,
    #[serde(default)]
    pub rng: Option<Xoshiro256StarStar>,
    #[serde(default)]
    pub climate: ClimateState,
    #[serde(default)]
    pub events: EventEngineState,
    #[serde(default)]
    pub volcano: VolcanoState,
    #[serde(default)]
    pub population: PopulationState,
    #[serde(default)]
    pub species: SpeciesRegistryState,
}

pub struct Simulation {
    config: SimulationConfig,
    tick: u64,
    grid: WorldGrid,
    rng: Xoshiro256StarStar,
    climate: ClimateSystem,
    events: EventEngine,
    volcano: VolcanoSystem,
    population: PopulationEngine,
    species: SpeciesRegistry,
    overlay: Overlay,
}

impl Simulation {
    /// Generate a world and place the founders
    pub fn new(config: SimulationConfig) -> Self {
        let seed32 = fold64(config.seed);
        let grid = WorldGenerator::from_config(config.seed, config.worldgen.clone())
            .generate(config.width, config.height);
        let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed);

        let climate = ClimateSystem::from_grid(config.climate.clone(), &grid);
        let events = EventEngine::new(seed32, config.events.clone());
        let volcano = VolcanoSystem::new(seed32, config.volcano.clone(), &grid, &mut rng, 0);
        let mut species = SpeciesRegistry::with_threshold(seed32, config.speciation_threshold);
        let mut population = PopulationEngine::new(config.population.clone());
        population.spawn_initial(
            &grid,
            &mut rng,
            &mut species,
            config.initial_creatures,
            0,
        );

        log::info!(
            "Simulation ready: {}x{} world, seed {}, {} founders in {} species",
            grid.width(),
            grid.height(),
            config.seed,
            population.population(),
            species.living_count()
        );

        Self {
            config,
            tick: 0,
            grid,
            rng,
            climate,
            events,
            volcano,
            population,
            species,
            overlay: Overlay::default(),
        }
    }

    /// Rebuild a session from a snapshot, repairing malformed parts
    pub fn from_state(state: SimulationState) -> Self {
        if state.version != SNAPSHOT_VERSION {
            log::warn!(
                "Restoring snapshot version {} with loader version {}",
                state.version,
                SNAPSHOT_VERSION
            );
        }
        let mut config = state.config;
        let mut grid = state.grid;
        let repaired = grid.sanitize();
        if repaired > 0 {
            log::warn!("Repaired {} grid values while restoring", repaired);
        }
        config.width = grid.width();
        config.height = grid.height();

        let rng = state.rng.unwrap_or_else(|| {
            log::warn!("Snapshot has no RNG state; reseeding from seed and tick");
            Xoshiro256StarStar::seed_from_u64(config.seed ^ state.tick)
        });

        let mut climate = ClimateSystem::from_grid(config.climate.clone(), &grid);
        climate.hydrate_state(state.climate, &grid);

        let mut events = EventEngine::new(state.events.seed, config.events.clone());
        events.hydrate_state(state.events, &grid);

        let volcano = VolcanoSystem::from_state(config.volcano.clone(), state.volcano, &grid);

        let mut species = SpeciesRegistry::with_threshold(0, config.speciation_threshold);
        species.hydrate_state(state.species);

        let mut population = PopulationEngine::new(config.population.clone());
        population.hydrate_state(state.population, grid.width(), grid.height());

        log::info!(
            "Restored session at tick {}: {} creatures, {} active events",
            state.tick,
            population.population(),
            events.active().len()
        );

        Self {
            config,
            tick: state.tick,
            grid,
            rng,
            climate,
            events,
            volcano,
            population,
            species,
            overlay: Overlay::default(),
        }
    }

    /// Advance one tick: climate, events, volcano, then creatures
    pub fn step(&mut self, hooks: &mut dyn PopulationHooks) -> TickReport {
        let tick = self.tick;
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        report.changed |= self.climate.step(&mut self.grid, tick);

        let events = self.events.step(&mut self.grid, &mut self.rng, tick);
        report.changed |= events.changed;
        report.spawned_event = events.spawned;
        report.completed_events = events.completed;

        let volcano = self.volcano.step(&mut self.grid, &mut self.rng, tick);
        report.changed |= volcano.changed;
        if let Some(start) = volcano.started {
            report.eruption_started = Some(self.events.record_external(
                EventKind::VolcanoEruption,
                tick,
                start.x,
                start.y,
                start.summary,
            ));
        }
        self.overlay = events.overlay.max(volcano.overlay);
        report.overlay = self.overlay;

        let population = self.population.step(
            &mut self.grid,
            &mut self.rng,
            1,
            tick,
            self.events.recent(),
            &mut self.species,
            hooks,
        );
        report.changed |= population.changed;
        report.births = population.births;
        report.deaths = population.deaths;
        report.speciations = population.speciations;
        report.newly_intelligent = population.newly_intelligent;
        report.population = self.population.population();

        log::trace!(
            "Tick {}: pop {} (+{} -{}), {} active events",
            tick,
            report.population,
            report.births,
            report.deaths,
            self.events.active().len()
        );

        self.tick += 1;
        report
    }

    /// Spawn an event by hand at the current tick
    pub fn spawn_event(&mut self, request: EventSpawnRequest) -> Option<u64> {
        self.events.spawn(request, &self.grid, self.tick)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Next tick to be simulated
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn climate(&self) -> &ClimateSystem {
        &self.climate
    }

    pub fn events(&self) -> &EventEngine {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventEngine {
        &mut self.events
    }

    pub fn volcano(&self) -> &VolcanoSystem {
        &self.volcano
    }

    pub fn population(&self) -> &PopulationEngine {
        &self.population
    }

    pub fn creatures(&self) -> &[Creature] {
        self.population.creatures()
    }

    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    pub fn species_stats(&self) -> Vec<SpeciesStats> {
        self.population.species_stats(&self.species)
    }

    pub fn query_creatures_in_rect(&self, min: IVec2, max: IVec2) -> Vec<&Creature> {
        self.population.query_creatures_in_rect(min, max)
    }

    /// Overlay reported by the last step
    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    /// Overlay of every active event and eruption at one tile
    pub fn overlay_at(&self, x: i32, y: i32) -> Overlay {
        let volcano = self
            .volcano
            .active()
            .map(|e| e.overlay_at(x, y))
            .unwrap_or_default();
        self.events.overlay_at(x, y).max(volcano)
    }

    pub fn drain_dirty_chunks(&mut self) -> Vec<ChunkCoord> {
        self.grid.drain_dirty_chunks()
    }

    pub fn export_state(&self) -> SimulationState {
        SimulationState {
            version: SNAPSHOT_VERSION,
            config: self.config.clone(),
            tick: self.tick,
            grid: self.grid.clone(),
            rng: Some(self.rng.clone()),
            climate: self.climate.export_state(),
            events: self.events.export_state(),
            volcano: self.volcano.export_state(),
            population: self.population.export_state(),
            species: self.species.export_state(),
        }
    }

    pub fn hydrate_state(&mut self, state: SimulationState) {
        *self = Self::from_state(state);
    }
}
