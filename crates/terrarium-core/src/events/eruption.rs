//! Volcanic eruptions: lava spreads from a crater, then cools back to rock
//!
//! Spread and cooling are driven by a private hash-chained state seeded from
//! the event seed, so an eruption never draws from the simulation RNG after
//! it has been spawned.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use terrarium_simulation::hash::mix32;
use terrarium_simulation::{Layer, Overlay, TileType, WorldGrid};

use super::active::{EventHeader, StepOutcome};

const LAVA_SALT: u32 = 0xbb67_ae85;
/// Spread attempts per tick during the eruption phase
const SPREAD_ATTEMPTS: usize = 22;
/// Frontier entries visited per tick during cooling
const COOLING_BATCH: usize = 64;
const COOL_HAZARD_STEP: u8 = 6;
const COOL_TEMPERATURE_STEP: u8 = 4;
const COOL_TEMPERATURE_FLOOR: u8 = 110;
/// Lava reverts to rock once its hazard drops below this
const SOLIDIFY_HAZARD: u8 = 120;
/// A full cooling pass below this hazard ends the eruption early
const SETTLED_HAZARD: u8 = 60;
const ASH_RADIUS: i32 = 2;
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EruptionPhase {
    #[default]
    Eruption,
    Cooling,
}

/// One tile touched by the lava flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LavaTile {
    pub x: i32,
    pub y: i32,
    /// Solidified to rock (flows into deep water start solid)
    pub reverted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolcanoEruption {
    pub header: EventHeader,
    #[serde(default)]
    pub phase: EruptionPhase,
    pub eruption_ticks: u32,
    pub max_lava_tiles: u32,
    #[serde(default)]
    pub frontier: Vec<LavaTile>,
    /// Grid indices already claimed by the flow
    #[serde(default)]
    pub visited: BTreeSet<u32>,
    #[serde(default)]
    pub cooling_cursor: usize,
    #[serde(default)]
    pub pass_max_hazard: u8,
    #[serde(default)]
    pub rng_state: u32,
    #[serde(default)]
    pub seeded: bool,
}

impl VolcanoEruption {
    /// `header.duration` must already be set; `eruption_ticks` is capped to it
    pub fn new(header: EventHeader, eruption_ticks: u32, max_lava_tiles: u32) -> Self {
        let rng_state = mix32(header.seed ^ LAVA_SALT);
        Self {
            eruption_ticks: eruption_ticks.min(header.duration),
            max_lava_tiles: max_lava_tiles.max(1),
            header,
            phase: EruptionPhase::Eruption,
            frontier: Vec::new(),
            visited: BTreeSet::new(),
            cooling_cursor: 0,
            pass_max_hazard: 0,
            rng_state,
            seeded: false,
        }
    }

    pub fn phase(&self) -> EruptionPhase {
        self.phase
    }

    pub fn lava_tiles(&self) -> usize {
        self.frontier.len()
    }

    /// Inclusive bounding box of the flow
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        self.frontier.iter().fold(None, |acc, t| {
            Some(match acc {
                None => (t.x, t.y, t.x, t.y),
                Some((x0, y0, x1, y1)) => (x0.min(t.x), y0.min(t.y), x1.max(t.x), y1.max(t.y)),
            })
        })
    }

    pub fn overlay(&self) -> Overlay {
        let heat_alpha = match self.phase {
            EruptionPhase::Eruption => 0.9,
            EruptionPhase::Cooling => 0.4,
        };
        Overlay {
            heat_alpha,
            ..Overlay::default()
        }
    }

    pub fn overlay_at(&self, x: i32, y: i32) -> Overlay {
        match self.bounds() {
            Some((x0, y0, x1, y1)) if x >= x0 && x <= x1 && y >= y0 && y <= y1 => self.overlay(),
            _ => Overlay::default(),
        }
    }

    fn next(&mut self) -> u32 {
        self.rng_state = mix32(self.rng_state.wrapping_add(0x9e37_79b9));
        self.rng_state
    }

    pub fn step(&mut self, grid: &mut WorldGrid) -> StepOutcome {
        let mut changed = false;
        let mut settled = false;
        match self.phase {
            EruptionPhase::Eruption => {
                if !self.seeded {
                    self.seeded = true;
                    changed |= self.claim(grid, self.header.x, self.header.y);
                    log::debug!(
                        "Eruption {} opened crater at ({}, {})",
                        self.header.id,
                        self.header.x,
                        self.header.y
                    );
                }
                changed |= self.spread(grid);
                if self.header.elapsed + 1 >= self.eruption_ticks
                    || self.frontier.len() >= self.max_lava_tiles as usize
                {
                    self.phase = EruptionPhase::Cooling;
                    self.cooling_cursor = 0;
                    self.pass_max_hazard = 0;
                }
            }
            EruptionPhase::Cooling => {
                let (cooled, pass_settled) = self.cool(grid);
                changed |= cooled;
                settled = pass_settled;
            }
        }

        let overlay = self.overlay();
        self.header.elapsed += 1;
        let done = settled || self.header.elapsed >= self.header.duration;
        if done && let Some((x0, y0, x1, y1)) = self.bounds() {
            grid.mark_dirty_rect(x0 - 3, y0 - 3, x1 + 3, y1 + 3);
        }
        StepOutcome {
            done,
            changed,
            overlay,
        }
    }

    fn spread(&mut self, grid: &mut WorldGrid) -> bool {
        let mut changed = false;
        for _ in 0..SPREAD_ATTEMPTS {
            if self.frontier.is_empty() || self.frontier.len() >= self.max_lava_tiles as usize {
                break;
            }
            let pick = self.next() as usize % self.frontier.len();
            let from = self.frontier[pick];
            let (dx, dy) = DIRECTIONS[self.next() as usize % DIRECTIONS.len()];
            changed |= self.claim(grid, from.x + dx, from.y + dy);
        }
        changed
    }

    /// Pour lava onto one unclaimed tile
    fn claim(&mut self, grid: &mut WorldGrid, x: i32, y: i32) -> bool {
        let Some(idx) = grid.index(x, y) else {
            return false;
        };
        if !self.visited.insert(idx as u32) {
            return false;
        }
        let quenched = grid.tile_at_index(idx) == TileType::DeepWater;
        let tile = if quenched {
            TileType::Rock
        } else {
            TileType::Lava
        };
        let mut changed = grid.set_tile(x, y, tile);
        changed |= grid.set_value_at_index(Layer::Hazard, idx, 255);
        changed |= grid.set_value_at_index(Layer::Temperature, idx, 255);
        changed |= grid.add_value(Layer::Humidity, x, y, -60.0);
        changed |= grid.set_biomass_at_index(idx, 0.0);
        self.frontier.push(LavaTile {
            x,
            y,
            reverted: quenched,
        });
        changed
    }

    /// Returns (changed, settled) where settled means a full pass found
    /// everything solid and below the settle hazard
    fn cool(&mut self, grid: &mut WorldGrid) -> (bool, bool) {
        if self.frontier.is_empty() {
            return (false, true);
        }
        let mut changed = false;
        let mut settled = false;
        for _ in 0..COOLING_BATCH.min(self.frontier.len()) {
            let i = self.cooling_cursor % self.frontier.len();
            let LavaTile { x, y, reverted } = self.frontier[i];

            let hazard = grid
                .hazard(x, y)
                .unwrap_or(0)
                .saturating_sub(COOL_HAZARD_STEP);
            changed |= grid.set_value(Layer::Hazard, x, y, hazard);
            let temperature = grid.temperature(x, y).unwrap_or(0);
            if temperature > COOL_TEMPERATURE_FLOOR {
                let next = temperature
                    .saturating_sub(COOL_TEMPERATURE_STEP)
                    .max(COOL_TEMPERATURE_FLOOR);
                changed |= grid.set_value(Layer::Temperature, x, y, next);
            }
            self.pass_max_hazard = self.pass_max_hazard.max(hazard);

            if !reverted {
                if grid.tile(x, y) != Some(TileType::Lava) {
                    self.frontier[i].reverted = true;
                } else if hazard < SOLIDIFY_HAZARD {
                    changed |= grid.set_tile(x, y, TileType::Rock);
                    changed |= deposit_ash(grid, x, y);
                    self.frontier[i].reverted = true;
                }
            }

            self.cooling_cursor = i + 1;
            if self.cooling_cursor >= self.frontier.len() {
                self.cooling_cursor = 0;
                if self.pass_max_hazard < SETTLED_HAZARD && self.frontier.iter().all(|t| t.reverted)
                {
                    settled = true;
                    break;
                }
                self.pass_max_hazard = 0;
            }
        }
        (changed, settled)
    }

    pub(crate) fn sanitize(&mut self, grid: &WorldGrid) -> bool {
        if !grid.in_bounds(self.header.x, self.header.y) {
            return false;
        }
        self.frontier.retain(|t| grid.in_bounds(t.x, t.y));
        let len = grid.len() as u32;
        self.visited.retain(|&i| i < len);
        self.cooling_cursor = match self.frontier.len() {
            0 => 0,
            n => self.cooling_cursor % n,
        };
        self.max_lava_tiles = self.max_lava_tiles.max(1);
        self.eruption_ticks = self.eruption_ticks.min(self.header.duration);
        if self.rng_state == 0 {
            self.rng_state = mix32(self.header.seed ^ LAVA_SALT);
        }
        true
    }
}

/// Ash fertilizes a radius-2 disc around a solidified tile
fn deposit_ash(grid: &mut WorldGrid, x: i32, y: i32) -> bool {
    let mut changed = false;
    for dy in -ASH_RADIUS..=ASH_RADIUS {
        for dx in -ASH_RADIUS..=ASH_RADIUS {
            if dx * dx + dy * dy > ASH_RADIUS * ASH_RADIUS {
                continue;
            }
            let bonus = if dx == 0 && dy == 0 { 6.0 } else { 3.0 };
            changed |= grid.add_value(Layer::Fertility, x + dx, y + dy, bonus);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrarium_simulation::EventKind;

    fn eruption(x: i32, y: i32, duration: u32, eruption_ticks: u32, cap: u32) -> VolcanoEruption {
        VolcanoEruption::new(
            EventHeader {
                id: 7,
                kind: EventKind::VolcanoEruption,
                start_tick: 0,
                duration,
                elapsed: 0,
                seed: 4242,
                x,
                y,
            },
            eruption_ticks,
            cap,
        )
    }

    #[test]
    fn test_crater_seeded_on_first_tick() {
        let mut grid = WorldGrid::filled(32, 32, TileType::Mountain);
        let mut e = eruption(16, 16, 400, 100, 60);
        let outcome = e.step(&mut grid);
        assert!(outcome.changed);
        assert_eq!(grid.tile(16, 16), Some(TileType::Lava));
        assert_eq!(grid.hazard(16, 16), Some(255));
        assert_eq!(grid.biomass(16, 16), Some(0.0));
        assert!(outcome.overlay.heat_alpha > 0.85);
    }

    #[test]
    fn test_flow_respects_tile_cap() {
        let mut grid = WorldGrid::filled(64, 64, TileType::Hills);
        let mut e = eruption(32, 32, 600, 300, 40);
        for _ in 0..50 {
            e.step(&mut grid);
        }
        assert_eq!(e.lava_tiles(), 40);
        assert_eq!(e.phase(), EruptionPhase::Cooling);
        let lava = (0..grid.len())
            .filter(|&i| grid.tile_at_index(i) == TileType::Lava)
            .count();
        assert!(lava <= 40);
    }

    #[test]
    fn test_deep_water_quenches_to_rock() {
        let mut grid = WorldGrid::filled(16, 16, TileType::DeepWater);
        let mut e = eruption(8, 8, 200, 50, 30);
        for _ in 0..10 {
            e.step(&mut grid);
        }
        assert!(e.frontier.iter().all(|t| t.reverted));
        assert!((0..grid.len()).all(|i| grid.tile_at_index(i) != TileType::Lava));
        assert_eq!(grid.tile(8, 8), Some(TileType::Rock));
    }

    #[test]
    fn test_cooling_reverts_lava_and_settles() {
        let mut grid = WorldGrid::filled(48, 48, TileType::Rock);
        let mut e = eruption(24, 24, 5000, 10, 50);
        let mut ticks = 0;
        while !e.step(&mut grid).done {
            ticks += 1;
            assert!(ticks < 5000, "eruption never settled");
        }
        assert!(ticks < 4999, "finished by duration, not by settling");
        assert!((0..grid.len()).all(|i| grid.tile_at_index(i) != TileType::Lava));
        assert!(grid.fertility(24, 24).unwrap_or(0) > 128);
        assert!(grid.temperature(24, 24).unwrap_or(0) >= COOL_TEMPERATURE_FLOOR);
    }

    #[test]
    fn test_done_at_duration() {
        let mut grid = WorldGrid::filled(16, 16, TileType::Mountain);
        let mut e = eruption(8, 8, 5, 3, 100);
        let mut done_at = 0;
        for t in 1..=5 {
            if e.step(&mut grid).done {
                done_at = t;
                break;
            }
        }
        assert_eq!(done_at, 5);
    }

    #[test]
    fn test_overlay_confined_to_flow_bounds() {
        let mut grid = WorldGrid::filled(32, 32, TileType::Mountain);
        let mut e = eruption(16, 16, 400, 100, 60);
        e.step(&mut grid);
        assert!(e.overlay_at(16, 16).heat_alpha > 0.0);
        assert!(e.overlay_at(0, 0).is_clear());
    }

    #[test]
    fn test_same_seed_same_flow() {
        let mut a_grid = WorldGrid::filled(32, 32, TileType::Hills);
        let mut b_grid = a_grid.clone();
        let mut a = eruption(16, 16, 300, 80, 80);
        let mut b = eruption(16, 16, 300, 80, 80);
        for _ in 0..40 {
            a.step(&mut a_grid);
            b.step(&mut b_grid);
        }
        assert_eq!(a.frontier, b.frontier);
        assert_eq!(a_grid.fingerprint(), b_grid.fingerprint());
    }
}
