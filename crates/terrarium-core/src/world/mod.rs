//! World generation and background climate

pub mod climate;
pub mod generation;
pub mod worldgen_config;

pub use climate::{ClimateConfig, ClimateState, ClimateSystem};
pub use generation::{CellClimate, WorldGenerator, classify};
pub use worldgen_config::{
    FractalTypeConfig, NoiseLayerConfig, NoiseTypeConfig, TerrainThresholds, WorldGenConfig,
};
