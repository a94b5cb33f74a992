//! The standing volcano: one fixed anchor, long-period eruptions
//!
//! Unlike scheduled eruption events the volcano never moves. It keeps a
//! ring of background hazard around its vent at all times and erupts on
//! a slow timer, one eruption at a time.

use serde::{Deserialize, Serialize};
use terrarium_simulation::hash::{cell_hash, event_seed};
use terrarium_simulation::{EventKind, Layer, Overlay, SimRng, TileType, WorldGrid};

use crate::events::{EventHeader, VolcanoEruption};

const VOLCANO_SALT: u32 = 0x3c6e_f372;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolcanoConfig {
    pub enabled: bool,
    pub min_interval: u32,
    pub max_interval: u32,
    /// Radius of the standing hazard ring around the vent
    pub pressure_radius: i32,
    pub eruption_duration: u32,
    pub eruption_ticks: u32,
    pub max_lava_tiles: u32,
}

impl Default for VolcanoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval: 8000,
            max_interval: 16000,
            pressure_radius: 4,
            eruption_duration: 1400,
            eruption_ticks: 420,
            max_lava_tiles: 160,
        }
    }
}

/// Reported on the tick an eruption begins
#[derive(Debug, Clone, PartialEq)]
pub struct EruptionStart {
    pub x: i32,
    pub y: i32,
    pub number: u32,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolcanoStepResult {
    pub changed: bool,
    pub overlay: Overlay,
    pub started: Option<EruptionStart>,
    pub finished: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolcanoState {
    #[serde(default)]
    pub seed: u32,
    #[serde(default)]
    pub anchor: (i32, i32),
    #[serde(default)]
    pub next_eruption_tick: u64,
    #[serde(default)]
    pub eruption_counter: u32,
    #[serde(default)]
    pub active: Option<VolcanoEruption>,
}

pub struct VolcanoSystem {
    seed: u32,
    config: VolcanoConfig,
    anchor: (i32, i32),
    next_eruption_tick: u64,
    eruption_counter: u32,
    active: Option<VolcanoEruption>,
}

impl VolcanoSystem {
    /// Pick the vent and schedule the first eruption
    pub fn new(
        seed: u32,
        config: VolcanoConfig,
        grid: &WorldGrid,
        rng: &mut dyn SimRng,
        tick: u64,
    ) -> Self {
        let anchor = select_anchor(seed, grid);
        let mut system = Self {
            seed,
            config,
            anchor,
            next_eruption_tick: 0,
            eruption_counter: 0,
            active: None,
        };
        system.schedule(rng, tick);
        log::info!(
            "Volcano vent at ({}, {}), first eruption due at tick {}",
            anchor.0,
            anchor.1,
            system.next_eruption_tick
        );
        system
    }

    /// Rebuild from a snapshot without drawing from any RNG
    pub fn from_state(config: VolcanoConfig, state: VolcanoState, grid: &WorldGrid) -> Self {
        let mut system = Self {
            seed: state.seed,
            config,
            anchor: (0, 0),
            next_eruption_tick: 0,
            eruption_counter: 0,
            active: None,
        };
        system.hydrate_state(state, grid);
        system
    }

    pub fn config(&self) -> &VolcanoConfig {
        &self.config
    }

    pub fn anchor(&self) -> (i32, i32) {
        self.anchor
    }

    pub fn next_eruption_tick(&self) -> u64 {
        self.next_eruption_tick
    }

    pub fn eruption_count(&self) -> u32 {
        self.eruption_counter
    }

    pub fn active(&self) -> Option<&VolcanoEruption> {
        self.active.as_ref()
    }

    pub fn is_erupting(&self) -> bool {
        self.active.is_some()
    }

    fn schedule(&mut self, rng: &mut dyn SimRng, tick: u64) {
        let min = self.config.min_interval.min(i32::MAX as u32) as i32;
        let max = self.config.max_interval.min(i32::MAX as u32) as i32;
        self.next_eruption_tick = tick + rng.range_int(min, max).max(0) as u64;
    }

    pub fn step(&mut self, grid: &mut WorldGrid, rng: &mut dyn SimRng, tick: u64) -> VolcanoStepResult {
        let mut result = VolcanoStepResult::default();
        if !self.config.enabled || grid.is_empty() {
            return result;
        }
        result.changed |= self.apply_pressure(grid);

        if self.active.is_none() && tick >= self.next_eruption_tick {
            result.started = Some(self.begin_eruption(tick));
        }

        if let Some(eruption) = self.active.as_mut() {
            let outcome = eruption.step(grid);
            result.changed |= outcome.changed;
            result.overlay = outcome.overlay;
            if outcome.done {
                self.active = None;
                self.schedule(rng, tick);
                result.finished = true;
                log::info!(
                    "Volcano eruption {} subsided at tick {}, next due at tick {}",
                    self.eruption_counter,
                    tick,
                    self.next_eruption_tick
                );
            }
        }
        result
    }

    fn begin_eruption(&mut self, tick: u64) -> EruptionStart {
        let (x, y) = self.anchor;
        self.eruption_counter += 1;
        let duration = self.config.eruption_duration.max(1);
        let header = EventHeader {
            id: self.eruption_counter as u64,
            kind: EventKind::VolcanoEruption,
            start_tick: tick,
            duration,
            elapsed: 0,
            seed: event_seed(self.seed ^ VOLCANO_SALT, tick, self.eruption_counter),
            x,
            y,
        };
        self.active = Some(VolcanoEruption::new(
            header,
            self.config.eruption_ticks,
            self.config.max_lava_tiles,
        ));
        EruptionStart {
            x,
            y,
            number: self.eruption_counter,
            summary: format!(
                "the volcano erupts (eruption {}, up to {} lava tiles)",
                self.eruption_counter, self.config.max_lava_tiles
            ),
        }
    }

    /// Keep hazard near the vent at `30 + 50 * (1 - d / r)` or above
    fn apply_pressure(&self, grid: &mut WorldGrid) -> bool {
        let r = self.config.pressure_radius.max(1);
        let (ax, ay) = self.anchor;
        let mut changed = false;
        for dy in -r..=r {
            for dx in -r..=r {
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                if d > r as f32 {
                    continue;
                }
                let floor = (30.0 + 50.0 * (1.0 - d / r as f32)).round() as u8;
                changed |= grid.raise_value(Layer::Hazard, ax + dx, ay + dy, floor);
            }
        }
        changed
    }

    pub fn export_state(&self) -> VolcanoState {
        VolcanoState {
            seed: self.seed,
            anchor: self.anchor,
            next_eruption_tick: self.next_eruption_tick,
            eruption_counter: self.eruption_counter,
            active: self.active.clone(),
        }
    }

    pub fn hydrate_state(&mut self, state: VolcanoState, grid: &WorldGrid) {
        self.seed = state.seed;
        self.anchor = if grid.in_bounds(state.anchor.0, state.anchor.1) {
            state.anchor
        } else {
            log::warn!("Snapshot volcano anchor is off the grid; selecting a new one");
            select_anchor(self.seed, grid)
        };
        self.next_eruption_tick = state.next_eruption_tick;
        self.eruption_counter = state.eruption_counter;
        self.active = state.active.and_then(|mut e| {
            if e.header.duration > 0 && e.sanitize(grid) {
                Some(e)
            } else {
                log::warn!("Dropped malformed volcano eruption while restoring");
                None
            }
        });
    }
}

/// Vent selection: best-hashed Mountain, then Hills or Rock, then the first
/// land tile, then the center
pub fn select_anchor(seed: u32, grid: &WorldGrid) -> (i32, i32) {
    let best = |accept: &dyn Fn(TileType) -> bool| {
        let mut best: Option<(u32, i32, i32)> = None;
        for idx in 0..grid.len() {
            if !accept(grid.tile_at_index(idx)) {
                continue;
            }
            let (x, y) = grid.coords(idx);
            let h = cell_hash(seed, x, y);
            if best.is_none_or(|(bh, _, _)| h > bh) {
                best = Some((h, x, y));
            }
        }
        best.map(|(_, x, y)| (x, y))
    };

    best(&|t| t == TileType::Mountain)
        .or_else(|| best(&|t| matches!(t, TileType::Hills | TileType::Rock)))
        .or_else(|| {
            (0..grid.len())
                .find(|&i| !grid.tile_at_index(i).is_water())
                .map(|i| grid.coords(i))
        })
        .unwrap_or((grid.width() as i32 / 2, grid.height() as i32 / 2))
}
