//! Corpse field: per-tile decomposition timers and nutrient potency

use serde::{Deserialize, Serialize};
use terrarium_simulation::{Layer, WorldGrid};

/// Decomposition timer a fresh corpse starts with
pub const CORPSE_TICKS: u16 = 35;
/// Nutrient power a single corpse deposits
pub const CORPSE_NUTRIENT: f32 = 8.0;
/// Upper bound when corpses pile up on one tile
pub const MAX_NUTRIENT: f32 = 64.0;
/// While the timer is above this, decomposition also feeds plant biomass
const BIOMASS_PULSE_TICKS: u16 = 28;

/// Plain snapshot of the corpse layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpseState {
    #[serde(default)]
    pub ticks_remaining: Vec<u16>,
    #[serde(default)]
    pub nutrient_power: Vec<f32>,
    #[serde(default)]
    pub cursor: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CorpseField {
    ticks_remaining: Vec<u16>,
    nutrient_power: Vec<f32>,
    cursor: usize,
}

impl CorpseField {
    pub fn new(len: usize) -> Self {
        Self {
            ticks_remaining: vec![0; len],
            nutrient_power: vec![0.0; len],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.ticks_remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks_remaining.is_empty()
    }

    /// Match the grid size, dropping corpses if the grid shrank
    pub fn resize(&mut self, len: usize) {
        if self.ticks_remaining.len() != len {
            self.ticks_remaining.resize(len, 0);
            self.nutrient_power.resize(len, 0.0);
        }
        if self.cursor >= len {
            self.cursor = 0;
        }
    }

    pub fn ticks_remaining(&self, idx: usize) -> u16 {
        self.ticks_remaining.get(idx).copied().unwrap_or(0)
    }

    pub fn nutrient_power(&self, idx: usize) -> f32 {
        self.nutrient_power.get(idx).copied().unwrap_or(0.0)
    }

    /// Number of tiles with an active corpse
    pub fn active_count(&self) -> usize {
        self.ticks_remaining.iter().filter(|&&t| t > 0).count()
    }

    /// Leave a corpse on a tile. Overlapping corpses keep the longer timer and sum nutrients.
    pub fn deposit(&mut self, idx: usize, ticks: u16, nutrient: f32) {
        let (Some(t), Some(n)) = (
            self.ticks_remaining.get_mut(idx),
            self.nutrient_power.get_mut(idx),
        ) else {
            return;
        };
        *t = (*t).max(ticks);
        *n = (*n + nutrient).min(MAX_NUTRIENT);
    }

    /// Visit up to `budget` tiles from the rotating cursor, releasing nutrients
    /// into the grid. Returns true if any grid value changed.
    pub fn decompose(&mut self, grid: &mut WorldGrid, budget: usize) -> bool {
        let len = self.ticks_remaining.len().min(grid.len());
        if len == 0 {
            return false;
        }
        let mut changed = false;
        for _ in 0..budget.min(len) {
            let idx = self.cursor;
            self.cursor = (self.cursor + 1) % len;

            let ticks = self.ticks_remaining[idx];
            if ticks == 0 {
                continue;
            }
            let nutrient = self.nutrient_power[idx];
            let fertility = grid.value_at_index(Layer::Fertility, idx) as f32;
            changed |= grid.set_value_at_index(
                Layer::Fertility,
                idx,
                terrarium_simulation::clamp_byte(fertility + nutrient * 0.5),
            );
            if ticks > BIOMASS_PULSE_TICKS {
                let biomass = grid.biomass_at_index(idx);
                changed |= grid.set_biomass_at_index(idx, biomass + nutrient * 1.5);
            }
            self.ticks_remaining[idx] = ticks - 1;
            if ticks == 1 {
                self.nutrient_power[idx] = 0.0;
            }
        }
        changed
    }

    pub fn export_state(&self) -> CorpseState {
        CorpseState {
            ticks_remaining: self.ticks_remaining.clone(),
            nutrient_power: self.nutrient_power.clone(),
            cursor: self.cursor,
        }
    }

    /// Restore from a snapshot, resized to `len` cells
    pub fn hydrate_state(&mut self, state: CorpseState, len: usize) {
        self.ticks_remaining = state.ticks_remaining;
        self.nutrient_power = state
            .nutrient_power
            .into_iter()
            .map(|n| if n.is_finite() { n.clamp(0.0, MAX_NUTRIENT) } else { 0.0 })
            .collect();
        self.cursor = state.cursor;
        self.resize(len);
        if self.nutrient_power.len() != self.ticks_remaining.len() {
            self.nutrient_power.resize(self.ticks_remaining.len(), 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_merges_corpses() {
        let mut field = CorpseField::new(16);
        field.deposit(3, 35, 8.0);
        field.deposit(3, 20, 8.0);
        assert_eq!(field.ticks_remaining(3), 35);
        assert_eq!(field.nutrient_power(3), 16.0);

        for _ in 0..20 {
            field.deposit(3, 35, 8.0);
        }
        assert_eq!(field.nutrient_power(3), MAX_NUTRIENT);

        // Out of range is ignored
        field.deposit(99, 35, 8.0);
        assert_eq!(field.active_count(), 1);
    }

    #[test]
    fn test_decompose_raises_fertility_and_expires() {
        let mut grid = WorldGrid::new(4, 4);
        let mut field = CorpseField::new(grid.len());
        field.deposit(5, 2, 8.0);

        let before = grid.value_at_index(Layer::Fertility, 5);
        assert!(field.decompose(&mut grid, 16));
        assert_eq!(grid.value_at_index(Layer::Fertility, 5), before + 4);
        assert_eq!(field.ticks_remaining(5), 1);

        field.decompose(&mut grid, 16);
        assert_eq!(field.ticks_remaining(5), 0);
        assert_eq!(field.nutrient_power(5), 0.0);
        assert!(!field.decompose(&mut grid, 16));
    }

    #[test]
    fn test_fresh_corpse_feeds_biomass() {
        let mut grid = WorldGrid::new(4, 4);
        let mut field = CorpseField::new(grid.len());
        field.deposit(0, CORPSE_TICKS, CORPSE_NUTRIENT);
        field.decompose(&mut grid, 1);
        assert_eq!(grid.biomass_at_index(0), 12.0);
    }

    #[test]
    fn test_budget_limits_cells_visited() {
        let mut grid = WorldGrid::new(8, 8);
        let mut field = CorpseField::new(grid.len());
        field.deposit(0, 10, 8.0);
        field.deposit(40, 10, 8.0);

        field.decompose(&mut grid, 32);
        assert_eq!(field.ticks_remaining(0), 9);
        assert_eq!(field.ticks_remaining(40), 10);

        field.decompose(&mut grid, 32);
        assert_eq!(field.ticks_remaining(40), 9);
    }

    #[test]
    fn test_hydrate_resizes_and_clamps() {
        let mut field = CorpseField::new(4);
        let state = CorpseState {
            ticks_remaining: vec![5, 0],
            nutrient_power: vec![f32::NAN, 900.0, 1.0],
            cursor: 99,
        };
        field.hydrate_state(state, 4);
        assert_eq!(field.len(), 4);
        assert_eq!(field.nutrient_power(0), 0.0);
        assert_eq!(field.nutrient_power(1), MAX_NUTRIENT);
        assert_eq!(field.export_state().cursor, 0);
    }
}
