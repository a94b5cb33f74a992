mod config;
mod driver;
mod report;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use terrarium_core::{
    Simulation, SimulationState, SnapshotMetadata, load_snapshot, save_metadata, save_snapshot,
};

use crate::config::RunnerConfig;
use crate::driver::FixedStepDriver;
use crate::report::{LoggingHooks, species_table, summary_line};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON config file (default: terrarium.ron if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// World seed
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// World width in tiles
    #[arg(long)]
    width: Option<usize>,

    /// World height in tiles
    #[arg(long)]
    height: Option<usize>,

    /// Founders placed at startup
    #[arg(long)]
    creatures: Option<usize>,

    /// Event spawn probability multiplier (0-5)
    #[arg(long)]
    event_rate: Option<f32>,

    /// Log a summary every N ticks (0 disables)
    #[arg(long)]
    report_every: Option<u64>,

    /// Write a snapshot here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume from a snapshot instead of generating a new world
    #[arg(long)]
    load: Option<PathBuf>,

    /// Run paced in real time for this many seconds instead of a tick count
    #[arg(long)]
    realtime_secs: Option<f64>,
}

impl Args {
    fn apply(&self, config: &mut RunnerConfig) {
        let sim = &mut config.simulation;
        if let Some(seed) = self.seed {
            sim.seed = seed;
        }
        if let Some(width) = self.width {
            sim.width = width;
        }
        if let Some(height) = self.height {
            sim.height = height;
        }
        if let Some(creatures) = self.creatures {
            sim.initial_creatures = creatures;
        }
        if let Some(rate) = self.event_rate {
            sim.events.event_rate = rate;
        }
        if let Some(ticks) = self.ticks {
            config.run.ticks = ticks;
        }
        if let Some(every) = self.report_every {
            config.run.report_every = every;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = RunnerConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    let mut sim = match &args.load {
        Some(path) => {
            let mut state = load_snapshot(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            if let Some(rate) = args.event_rate {
                state.config.events.event_rate = rate;
                state.events.config.event_rate = rate;
            }
            Simulation::from_state(state)
        }
        None => Simulation::new(config.simulation.clone()),
    };

    let mut hooks = LoggingHooks::default();
    match args.realtime_secs {
        Some(secs) => run_realtime(&mut sim, &mut hooks, &config, secs),
        None => run_ticks(&mut sim, &mut hooks, &config),
    }

    log::info!(
        "Finished at tick {}: {} creatures, {} births, {} deaths, {} speciations",
        sim.tick(),
        sim.creatures().len(),
        hooks.births,
        hooks.deaths,
        hooks.speciations
    );
    for row in species_table(&sim.species_stats()) {
        log::info!("  {}", row);
    }

    if let Some(path) = &args.save {
        save(path, &sim.export_state())?;
    }
    Ok(())
}

fn step_and_report(sim: &mut Simulation, hooks: &mut LoggingHooks, report_every: u64) {
    let report = sim.step(hooks);
    if let Some(id) = report.eruption_started {
        log::info!("Tick {}: volcano eruption logged as event #{}", report.tick, id);
    }
    if report_every > 0 && (report.tick + 1) % report_every == 0 {
        log::info!("{}", summary_line(sim, &report, hooks));
    }
    // Headless: nobody consumes the dirty chunks
    sim.drain_dirty_chunks();
}

fn run_ticks(sim: &mut Simulation, hooks: &mut LoggingHooks, config: &RunnerConfig) {
    log::info!("Running {} ticks", config.run.ticks);
    for _ in 0..config.run.ticks {
        step_and_report(sim, hooks, config.run.report_every);
    }
}

fn run_realtime(sim: &mut Simulation, hooks: &mut LoggingHooks, config: &RunnerConfig, secs: f64) {
    let total = if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    };
    let mut driver = FixedStepDriver::new(config.run.ticks_per_second, config.run.max_catch_up);
    log::info!(
        "Running for {:?} at {:?} per tick",
        total,
        driver.step_duration()
    );
    let start = web_time::Instant::now();
    driver.update();
    while start.elapsed() < total {
        for _ in 0..driver.update() {
            step_and_report(sim, hooks, config.run.report_every);
        }
        std::thread::sleep(driver.until_next());
    }
}

fn save(path: &Path, state: &SimulationState) -> Result<()> {
    save_snapshot(path, state)
        .with_context(|| format!("Failed to save snapshot {}", path.display()))?;
    let meta_path = path.with_extension("ron");
    let mut meta = SnapshotMetadata::from_state(state);
    meta.note = format!("saved by terrarium {}", env!("CARGO_PKG_VERSION"));
    save_metadata(&meta_path, &meta)
        .with_context(|| format!("Failed to write metadata {}", meta_path.display()))?;
    Ok(())
}
