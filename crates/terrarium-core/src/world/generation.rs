use fastnoise_lite::FastNoiseLite;
use terrarium_simulation::{Layer, TileType, WorldGrid, clamp_byte};

use crate::world::worldgen_config::{TerrainThresholds, WorldGenConfig};

/// Climate fields sampled for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellClimate {
    /// -1.0 to 1.0
    pub elevation: f32,
    /// 0.0 to 1.0
    pub moisture: f32,
    /// 0.0 to 1.0 after latitude and lapse
    pub temperature: f32,
}

/// World generator using layered OpenSimplex noise for biome classification
///
/// Can be created with default parameters via `new(seed)` or with a full
/// configuration via `from_config(seed, config)`.
pub struct WorldGenerator {
    pub seed: u64,

    config: WorldGenConfig,

    elevation_noise: FastNoiseLite,
    moisture_noise: FastNoiseLite,
    temperature_noise: FastNoiseLite,
}

impl WorldGenerator {
    /// Create a new WorldGenerator with default configuration
    pub fn new(seed: u64) -> Self {
        Self::from_config(seed, WorldGenConfig::default())
    }

    /// Create a WorldGenerator from a configuration
    pub fn from_config(seed: u64, config: WorldGenConfig) -> Self {
        let elevation_noise = config.elevation_noise.to_fastnoise(seed);
        let moisture_noise = config.moisture_noise.to_fastnoise(seed);
        let temperature_noise = config.temperature_noise.to_fastnoise(seed);
        Self {
            seed,
            config,
            elevation_noise,
            moisture_noise,
            temperature_noise,
        }
    }

    pub fn config(&self) -> &WorldGenConfig {
        &self.config
    }

    /// Sample the climate fields at a cell of a `height`-row world
    pub fn climate_at(&self, x: i32, y: i32, height: usize) -> CellClimate {
        let (fx, fy) = (x as f32, y as f32);
        let elevation = self.elevation_noise.get_noise_2d(fx, fy).clamp(-1.0, 1.0);
        let moisture = to_unit(self.moisture_noise.get_noise_2d(fx, fy));
        let noise_temp = to_unit(self.temperature_noise.get_noise_2d(fx, fy));

        // 0 at the equator row, 1 at either pole
        let latitude = if height > 1 {
            ((y as f32 / (height - 1) as f32) - 0.5).abs() * 2.0
        } else {
            0.0
        };
        let strength = self.config.latitude_strength.clamp(0.0, 1.0);
        let temperature = (noise_temp * (1.0 - strength) + (1.0 - latitude) * strength
            - elevation.max(0.0) * self.config.lapse_rate)
            .clamp(0.0, 1.0);

        CellClimate {
            elevation,
            moisture,
            temperature,
        }
    }

    /// Generate a complete `width x height` grid
    pub fn generate(&self, width: usize, height: usize) -> WorldGrid {
        let mut grid = WorldGrid::new(width, height);
        let biomass_fraction = self.config.initial_biomass.clamp(0.0, 1.0);
        let mut counts = [0usize; TileType::ALL.len()];

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let climate = self.climate_at(x, y, height);
                let tile = classify(&self.config.thresholds, &climate);
                let def = tile.def();
                counts[tile.as_u8() as usize] += 1;

                grid.set_tile(x, y, tile);
                grid.set_value(
                    Layer::Humidity,
                    x,
                    y,
                    clamp_byte(def.base_humidity as f32 * 0.5 + climate.moisture * 127.5),
                );
                grid.set_value(
                    Layer::Temperature,
                    x,
                    y,
                    clamp_byte(climate.temperature * 255.0),
                );
                grid.set_value(
                    Layer::Fertility,
                    x,
                    y,
                    clamp_byte(def.habitability * 160.0 + climate.moisture * 60.0),
                );
                grid.set_value(Layer::Hazard, x, y, 0);
                grid.set_biomass(x, y, def.biomass_capacity * biomass_fraction);
            }
        }

        grid.mark_all_dirty();
        log::info!(
            "Generated {}x{} world '{}' (seed: {}): {}",
            width,
            height,
            self.config.name,
            self.seed,
            summarize(&counts)
        );
        grid
    }
}

/// Map a noise sample from -1.0..1.0 to 0.0..1.0
fn to_unit(v: f32) -> f32 {
    ((v + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Classify a cell by elevation band, then by temperature and moisture
pub fn classify(t: &TerrainThresholds, c: &CellClimate) -> TileType {
    let e = c.elevation;
    if e < t.deep_water {
        return TileType::DeepWater;
    }
    if e < t.shallow_water {
        return TileType::ShallowWater;
    }
    if e < t.beach {
        return TileType::Sand;
    }
    if e > t.mountain {
        return if c.temperature < t.snowline_temperature {
            TileType::Snow
        } else {
            TileType::Mountain
        };
    }
    if e > t.hills {
        return TileType::Hills;
    }

    let (m, temp) = (c.moisture, c.temperature);
    if temp < t.tundra_temperature {
        TileType::Snow
    } else if m > 0.72 && e < 0.05 {
        TileType::Swamp
    } else if m > 0.62 && temp > 0.6 {
        TileType::Jungle
    } else if m > 0.55 {
        TileType::Forest
    } else if m < 0.25 && temp > 0.55 {
        TileType::Desert
    } else if m < 0.38 {
        TileType::Savanna
    } else {
        TileType::Grassland
    }
}

fn summarize(counts: &[usize]) -> String {
    let mut parts: Vec<String> = TileType::ALL
        .iter()
        .filter_map(|&t| {
            let n = counts[t.as_u8() as usize];
            (n > 0).then(|| format!("{}={}", t.name(), n))
        })
        .collect();
    if parts.is_empty() {
        parts.push("empty".to_string());
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climate(elevation: f32, moisture: f32, temperature: f32) -> CellClimate {
        CellClimate {
            elevation,
            moisture,
            temperature,
        }
    }

    #[test]
    fn test_classify_elevation_bands() {
        let t = TerrainThresholds::default();
        assert_eq!(classify(&t, &climate(-0.5, 0.5, 0.5)), TileType::DeepWater);
        assert_eq!(classify(&t, &climate(-0.2, 0.5, 0.5)), TileType::ShallowWater);
        assert_eq!(classify(&t, &climate(-0.15, 0.5, 0.5)), TileType::Sand);
        assert_eq!(classify(&t, &climate(0.5, 0.5, 0.5)), TileType::Hills);
        assert_eq!(classify(&t, &climate(0.7, 0.5, 0.5)), TileType::Mountain);
        assert_eq!(classify(&t, &climate(0.7, 0.5, 0.1)), TileType::Snow);
    }

    #[test]
    fn test_classify_lowland_biomes() {
        let t = TerrainThresholds::default();
        assert_eq!(classify(&t, &climate(0.0, 0.5, 0.1)), TileType::Snow);
        assert_eq!(classify(&t, &climate(0.0, 0.8, 0.5)), TileType::Swamp);
        assert_eq!(classify(&t, &climate(0.2, 0.7, 0.7)), TileType::Jungle);
        assert_eq!(classify(&t, &climate(0.2, 0.6, 0.5)), TileType::Forest);
        assert_eq!(classify(&t, &climate(0.2, 0.1, 0.7)), TileType::Desert);
        assert_eq!(classify(&t, &climate(0.2, 0.3, 0.4)), TileType::Savanna);
        assert_eq!(classify(&t, &climate(0.2, 0.45, 0.5)), TileType::Grassland);
    }

    #[test]
    fn test_generation_deterministic() {
        let a = WorldGenerator::new(42).generate(48, 32);
        let b = WorldGenerator::new(42).generate(48, 32);
        let c = WorldGenerator::new(43).generate(48, 32);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_generated_layers_consistent() {
        let grid = WorldGenerator::new(7).generate(64, 48);
        assert_eq!(grid.len(), 64 * 48);
        assert!(grid.dirty_count() > 0);
        for idx in 0..grid.len() {
            let tile = grid.tile_at_index(idx);
            assert_ne!(tile, TileType::Lava);
            assert_eq!(grid.value_at_index(Layer::Hazard, idx), 0);
            let biomass = grid.biomass_at_index(idx);
            assert!(biomass <= tile.def().biomass_capacity);
        }
    }

    #[test]
    fn test_poles_are_colder_than_equator() {
        let generator = WorldGenerator::from_config(
            3,
            WorldGenConfig {
                latitude_strength: 1.0,
                lapse_rate: 0.0,
                ..WorldGenConfig::default()
            },
        );
        let pole = generator.climate_at(10, 0, 101);
        let equator = generator.climate_at(10, 50, 101);
        assert!(pole.temperature < 0.01);
        assert!(equator.temperature > 0.99);
    }
}
