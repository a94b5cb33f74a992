//! Terrarium simulation core
//!
//! Ties the grid and creature crates together into a runnable session:
//! - World generation from layered noise (WorldGenerator)
//! - Background climate: diffusion, regrowth and succession (ClimateSystem)
//! - Hazard events and their scheduler (EventEngine)
//! - The standing volcano (VolcanoSystem)
//! - The tick-driven session and its snapshots (Simulation, persistence)

pub mod events;
pub mod persistence;
pub mod simulation;
pub mod volcano;
pub mod world;

pub use events::{
    ActiveEvent, EventEngine, EventEngineConfig, EventEngineState, EventSpawnRequest,
    EventStepResult,
};
pub use persistence::{
    SnapshotError, SnapshotMetadata, load_metadata, load_snapshot, save_metadata, save_snapshot,
};
pub use simulation::{SNAPSHOT_VERSION, Simulation, SimulationConfig, SimulationState, TickReport};
pub use volcano::{VolcanoConfig, VolcanoState, VolcanoSystem};
pub use world::{ClimateConfig, ClimateSystem, WorldGenConfig, WorldGenerator};

// Re-export the lower crates so the binary needs a single dependency
pub use terrarium_creature as creature;
pub use terrarium_simulation as grid;
