//! Creature population for Terrarium
//!
//! This crate implements:
//! - Numeric genomes with bounded mutation and distance-based speciation
//! - Per-tick creature behavior: movement scoring, needs, grazing, health
//! - Reproduction, death and corpse decomposition into soil fertility
//! - Per-species cognition emergence driven by sociality and world events
//! - Collaborator traits for genetics and lifecycle observers

pub mod behavior;
pub mod cognition;
pub mod corpse;
pub mod creature;
pub mod genome;
pub mod naming;
pub mod population;
pub mod spatial;
pub mod species;
pub mod traits;
pub mod types;

// Re-export main types for convenience
pub use cognition::{CognitionState, CognitionTracker, SpeciesCognition};
pub use corpse::{CorpseField, CorpseState};
pub use creature::Creature;
pub use genome::{DietType, Genome};
pub use population::{
    PopulationConfig, PopulationEngine, PopulationState, PopulationStepResult, SpeciesStats,
};
pub use species::{Species, SpeciesRegistry, SpeciesRegistryState};
pub use traits::{GeneticsProvider, NoopHooks, PopulationHooks, SpeciesAssignment};
pub use types::{CreatureId, SpeciesId};
