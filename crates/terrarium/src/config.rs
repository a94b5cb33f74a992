//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `terrarium.ron` file (if exists), or the file passed with `--config`
//! 3. Environment variables prefixed with `TERRARIUM_`
//!
//! CLI flags are applied on top by `main`.
//!
//! Example environment variable: `TERRARIUM_SIMULATION__EVENTS__EVENT_RATE=2.5`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use terrarium_core::SimulationConfig;

/// Default config file name, without extension
pub const DEFAULT_CONFIG_NAME: &str = "terrarium";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// How long and how fast to run, and how often to report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ticks: u64,
    /// Summary line every N ticks (0 disables)
    pub report_every: u64,
    /// Pace used by `--realtime-secs`
    pub ticks_per_second: f64,
    /// Upper bound on ticks caught up in one driver update
    pub max_catch_up: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 2000,
            report_every: 250,
            ticks_per_second: 30.0,
            max_catch_up: 8,
        }
    }
}

impl RunnerConfig {
    /// Load configuration with layered priority. `file` replaces the default
    /// `terrarium.ron` lookup and must exist when given.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = RunConfig::default();
        let sim = SimulationConfig::default();
        let mut builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("run.ticks", defaults.ticks as i64)?
            .set_default("run.report_every", defaults.report_every as i64)?
            .set_default("run.ticks_per_second", defaults.ticks_per_second)?
            .set_default("run.max_catch_up", defaults.max_catch_up as i64)?
            .set_default("simulation.seed", sim.seed as i64)?
            .set_default("simulation.width", sim.width as i64)?
            .set_default("simulation.height", sim.height as i64)?
            .set_default("simulation.initial_creatures", sim.initial_creatures as i64)?;

        // Layer 2: Config file
        builder = match file {
            Some(path) => builder.add_source(File::from(path).format(config::FileFormat::Ron)),
            None => builder.add_source(
                File::with_name(DEFAULT_CONFIG_NAME)
                    .format(config::FileFormat::Ron)
                    .required(false),
            ),
        };

        // Layer 3: Environment variables (TERRARIUM_RUN__TICKS, etc.)
        let builder = builder.add_source(
            Environment::with_prefix("TERRARIUM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
