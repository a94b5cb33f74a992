//! Noise and classification parameters for world generation
//!
//! The seed is NOT part of the config: same config + different seed = different world.
//! Configs round-trip through RON so presets can be kept next to the runner config.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use serde::{Deserialize, Serialize};

/// Everything the generator needs besides the seed and the grid size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    /// Preset label, shown in reports only
    pub name: String,

    /// Elevation field (-1.0 to 1.0); drives water, hills and mountains
    pub elevation_noise: NoiseLayerConfig,
    /// Moisture field, normalized to 0.0-1.0
    pub moisture_noise: NoiseLayerConfig,
    /// Temperature field, normalized to 0.0-1.0 before the latitude blend
    pub temperature_noise: NoiseLayerConfig,

    /// Elevation and climate cut-offs used to classify tiles
    pub thresholds: TerrainThresholds,

    /// Weight of the equator-to-pole gradient in the final temperature (0.0-1.0)
    pub latitude_strength: f32,
    /// Temperature lost per unit of positive elevation
    pub lapse_rate: f32,
    /// Starting plant biomass as a fraction of each tile's capacity
    pub initial_biomass: f32,
}

/// Tile classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainThresholds {
    pub deep_water: f32,
    pub shallow_water: f32,
    pub beach: f32,
    pub hills: f32,
    pub mountain: f32,
    /// Mountains colder than this are snow-capped
    pub snowline_temperature: f32,
    /// Lowland colder than this is snow
    pub tundra_temperature: f32,
}

/// Single noise layer (maps onto a FastNoiseLite instance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayerConfig {
    /// Added to the world seed so layers decorrelate
    pub seed_offset: i32,
    pub noise_type: NoiseTypeConfig,
    /// Lower means broader continents and climate bands
    pub frequency: f32,
    pub fractal_type: FractalTypeConfig,
    /// Clamped to 1-8
    pub octaves: u8,
    pub lacunarity: f32,
    pub gain: f32,
}

/// Serializable mirror of `fastnoise_lite::NoiseType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseTypeConfig {
    OpenSimplex2,
    OpenSimplex2S,
    Perlin,
    Value,
}

/// Serializable mirror of `fastnoise_lite::FractalType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FractalTypeConfig {
    None,
    FBm,
    Ridged,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            name: "Temperate".to_string(),
            elevation_noise: NoiseLayerConfig::fbm(0, 0.018, 5),
            moisture_noise: NoiseLayerConfig::fbm(101, 0.014, 3),
            temperature_noise: NoiseLayerConfig::fbm(202, 0.01, 2),
            thresholds: TerrainThresholds::default(),
            latitude_strength: 0.45,
            lapse_rate: 0.4,
            initial_biomass: 0.7,
        }
    }
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            deep_water: -0.35,
            shallow_water: -0.18,
            beach: -0.12,
            hills: 0.42,
            mountain: 0.62,
            snowline_temperature: 0.3,
            tundra_temperature: 0.22,
        }
    }
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self::fbm(0, 0.02, 4)
    }
}

impl NoiseLayerConfig {
    /// OpenSimplex2 FBm layer with the usual lacunarity and gain
    pub fn fbm(seed_offset: i32, frequency: f32, octaves: u8) -> Self {
        Self {
            seed_offset,
            noise_type: NoiseTypeConfig::OpenSimplex2,
            frequency,
            fractal_type: FractalTypeConfig::FBm,
            octaves,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }

    /// Noise source for this layer, seeded from the world seed
    pub fn to_fastnoise(&self, base_seed: u64) -> FastNoiseLite {
        let seed = (base_seed as i32).wrapping_add(self.seed_offset);
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(self.noise_type.to_fastnoise()));
        noise.set_fractal_type(Some(self.fractal_type.to_fastnoise()));
        noise.set_fractal_octaves(Some(self.octaves.clamp(1, 8) as i32));
        noise.set_frequency(Some(self.frequency));
        noise.set_fractal_gain(Some(self.gain));
        noise.set_fractal_lacunarity(Some(self.lacunarity));
        noise
    }
}

impl NoiseTypeConfig {
    pub fn to_fastnoise(self) -> NoiseType {
        match self {
            Self::OpenSimplex2 => NoiseType::OpenSimplex2,
            Self::OpenSimplex2S => NoiseType::OpenSimplex2S,
            Self::Perlin => NoiseType::Perlin,
            Self::Value => NoiseType::Value,
        }
    }
}

impl FractalTypeConfig {
    pub fn to_fastnoise(self) -> FractalType {
        match self {
            Self::None => FractalType::None,
            Self::FBm => FractalType::FBm,
            Self::Ridged => FractalType::Ridged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_ordered() {
        let config = WorldGenConfig::default();
        assert!(config.thresholds.deep_water < config.thresholds.shallow_water);
        assert!(config.thresholds.hills < config.thresholds.mountain);
        assert_ne!(
            config.elevation_noise.seed_offset,
            config.moisture_noise.seed_offset
        );
    }

    #[test]
    fn test_ron_roundtrip() {
        let mut config = WorldGenConfig::default();
        config.thresholds.mountain = 0.4;
        config.elevation_noise.fractal_type = FractalTypeConfig::Ridged;
        let text = ron::ser::to_string_pretty(&config, Default::default()).unwrap();
        let parsed: WorldGenConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let parsed: WorldGenConfig = ron::from_str("(name: \"Tiny\", lapse_rate: 0.1)").unwrap();
        assert_eq!(parsed.name, "Tiny");
        assert_eq!(parsed.lapse_rate, 0.1);
        assert_eq!(parsed.thresholds, TerrainThresholds::default());
    }

    #[test]
    fn test_noise_seed_offset_wraps() {
        let layer = NoiseLayerConfig::fbm(i32::MAX, 0.1, 2);
        let noise = layer.to_fastnoise(u64::MAX);
        let v = noise.get_noise_2d(1.0, 2.0);
        assert!((-1.0..=1.0).contains(&v));
    }
}
