//! Background climate: diffusion, hazard decay, plant regrowth and biome succession
//!
//! Works through the grid a few rows per tick from a wrapping row cursor so the
//! per-tick cost stays bounded regardless of world size.

use serde::{Deserialize, Serialize};
use terrarium_simulation::{Layer, TileType, WorldGrid, clamp_byte};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// Rows processed per tick
    pub rows_per_tick: usize,
    /// Pull toward the 4-neighbor mean humidity
    pub humidity_diffusion: f32,
    /// Pull toward the tile's base humidity
    pub humidity_restore: f32,
    /// Pull toward the 4-neighbor mean temperature
    pub temperature_diffusion: f32,
    /// Pull toward the temperature captured at generation time
    pub temperature_restore: f32,
    /// Hazard removed per visit
    pub hazard_decay: u8,
    /// Fraction of the gap to the biomass target regrown per visit
    pub regrowth_rate: f32,
    /// Succession only happens below this hazard
    pub succession_hazard_limit: u8,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            rows_per_tick: 4,
            humidity_diffusion: 0.10,
            humidity_restore: 0.03,
            temperature_diffusion: 0.10,
            temperature_restore: 0.02,
            hazard_decay: 1,
            regrowth_rate: 0.06,
            succession_hazard_limit: 40,
        }
    }
}

/// Plain snapshot of the climate system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateState {
    #[serde(default)]
    pub row_cursor: usize,
    #[serde(default)]
    pub baseline_temperature: Vec<u8>,
}

pub struct ClimateSystem {
    config: ClimateConfig,
    row_cursor: usize,
    baseline_temperature: Vec<u8>,
}

impl ClimateSystem {
    /// Capture the current temperature layer as the long-term baseline
    pub fn from_grid(config: ClimateConfig, grid: &WorldGrid) -> Self {
        Self {
            config,
            row_cursor: 0,
            baseline_temperature: grid.layer(Layer::Temperature).to_vec(),
        }
    }

    pub fn config(&self) -> &ClimateConfig {
        &self.config
    }

    pub fn row_cursor(&self) -> usize {
        self.row_cursor
    }

    /// Process the next batch of rows. Returns true if any cell changed.
    pub fn step(&mut self, grid: &mut WorldGrid, tick: u64) -> bool {
        let height = grid.height();
        if grid.is_empty() {
            return false;
        }
        if self.baseline_temperature.len() != grid.len() {
            log::warn!(
                "Climate baseline size {} does not match grid {}; recapturing",
                self.baseline_temperature.len(),
                grid.len()
            );
            self.baseline_temperature = grid.layer(Layer::Temperature).to_vec();
        }

        let mut changed = false;
        for _ in 0..self.config.rows_per_tick.clamp(1, height) {
            let y = (self.row_cursor % height) as i32;
            self.row_cursor = (self.row_cursor + 1) % height;
            for x in 0..grid.width() as i32 {
                changed |= self.update_cell(grid, x, y);
            }
        }
        if changed && self.row_cursor == 0 {
            log::trace!("Climate pass completed at tick {}", tick);
        }
        changed
    }

    fn update_cell(&self, grid: &mut WorldGrid, x: i32, y: i32) -> bool {
        let Some(idx) = grid.index(x, y) else {
            return false;
        };
        let cfg = &self.config;
        let tile = grid.tile_at_index(idx);
        let def = tile.def();
        let mut changed = false;

        // Diffusion
        let humidity = grid.value_at_index(Layer::Humidity, idx) as f32;
        let h_mean = neighbor_mean(grid, Layer::Humidity, x, y).unwrap_or(humidity);
        let humidity = humidity
            + (h_mean - humidity) * cfg.humidity_diffusion
            + (def.base_humidity as f32 - humidity) * cfg.humidity_restore;
        changed |= grid.set_value_at_index(Layer::Humidity, idx, clamp_byte(humidity));

        let temperature = grid.value_at_index(Layer::Temperature, idx) as f32;
        let t_mean = neighbor_mean(grid, Layer::Temperature, x, y).unwrap_or(temperature);
        let baseline = self.baseline_temperature[idx] as f32;
        let temperature = temperature
            + (t_mean - temperature) * cfg.temperature_diffusion
            + (baseline - temperature) * cfg.temperature_restore;
        changed |= grid.set_value_at_index(Layer::Temperature, idx, clamp_byte(temperature));

        // Hazard decay; lava cools only through its eruption
        let hazard = grid.value_at_index(Layer::Hazard, idx);
        if tile != TileType::Lava {
            changed |= grid.set_value_at_index(
                Layer::Hazard,
                idx,
                hazard.saturating_sub(cfg.hazard_decay),
            );
        }

        // Plant regrowth
        let humidity = grid.value_at_index(Layer::Humidity, idx);
        let fertility = grid.value_at_index(Layer::Fertility, idx);
        let target = def.biomass_capacity
            * (0.4 + 0.6 * fertility as f32 / 255.0)
            * (0.5 + 0.5 * humidity as f32 / 255.0);
        let biomass = grid.biomass_at_index(idx);
        changed |= grid.set_biomass_at_index(idx, biomass + (target - biomass) * cfg.regrowth_rate);

        // Succession
        if hazard < cfg.succession_hazard_limit {
            let temperature = grid.value_at_index(Layer::Temperature, idx);
            if let Some(next) = succession(grid, tile, x, y, humidity, temperature, fertility) {
                changed |= grid.set_tile(x, y, next);
            }
        }
        changed
    }

    pub fn export_state(&self) -> ClimateState {
        ClimateState {
            row_cursor: self.row_cursor,
            baseline_temperature: self.baseline_temperature.clone(),
        }
    }

    /// Restore from a snapshot; a baseline of the wrong size is recaptured from the grid
    pub fn hydrate_state(&mut self, state: ClimateState, grid: &WorldGrid) {
        self.row_cursor = if grid.height() > 0 {
            state.row_cursor % grid.height()
        } else {
            0
        };
        if state.baseline_temperature.len() == grid.len() {
            self.baseline_temperature = state.baseline_temperature;
        } else {
            log::warn!("Snapshot climate baseline has the wrong size; recapturing");
            self.baseline_temperature = grid.layer(Layer::Temperature).to_vec();
        }
    }
}

fn neighbor_mean(grid: &WorldGrid, layer: Layer, x: i32, y: i32) -> Option<f32> {
    let mut sum = 0.0;
    let mut n = 0;
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        if let Some(v) = grid.value(layer, x + dx, y + dy) {
            sum += v as f32;
            n += 1;
        }
    }
    (n > 0).then(|| sum / n as f32)
}

fn near_lava(grid: &WorldGrid, x: i32, y: i32) -> bool {
    [(1, 0), (-1, 0), (0, 1), (0, -1)]
        .iter()
        .any(|&(dx, dy)| grid.tile(x + dx, y + dy) == Some(TileType::Lava))
}

fn succession(
    grid: &WorldGrid,
    tile: TileType,
    x: i32,
    y: i32,
    humidity: u8,
    temperature: u8,
    fertility: u8,
) -> Option<TileType> {
    match tile {
        TileType::Grassland if humidity > 240 => Some(TileType::Swamp),
        TileType::Grassland if humidity > 190 && fertility > 150 => Some(TileType::Forest),
        TileType::Forest if humidity > 225 && temperature > 170 => Some(TileType::Jungle),
        TileType::Savanna if humidity > 120 => Some(TileType::Grassland),
        TileType::Desert if humidity > 110 && fertility > 60 => Some(TileType::Savanna),
        TileType::Rock if fertility > 120 && !near_lava(grid, x, y) => Some(TileType::Grassland),
        TileType::Snow if temperature > 140 => Some(TileType::Grassland),
        _ => None,
    }
}
