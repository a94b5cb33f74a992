//! Collaborator traits for the population engine
//!
//! These traits define the seams between the creature engine and the
//! outside world, so the engine does not depend on a particular genetics
//! implementation or on whoever wants to observe lifecycle events.

use std::collections::BTreeMap;

use terrarium_simulation::SimRng;

use crate::genome::Genome;
use crate::species::Species;
use crate::types::{CreatureId, SpeciesId};

/// Result of clustering a genome into a species
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesAssignment {
    pub species_id: SpeciesId,
    /// A new species was created for this genome
    pub created: bool,
    /// Distance to the chosen species' representative genome
    pub distance: f32,
}

/// Genetics and speciation contract consumed by the population engine
pub trait GeneticsProvider {
    /// Random founder genome
    fn create_random_genome(&mut self, rng: &mut dyn SimRng) -> Genome;

    /// Mutated copy of a parent genome
    fn mutate(&mut self, genome: &Genome, rng: &mut dyn SimRng, rate: f32) -> Genome;

    /// Place a genome into an existing species or create a new one
    fn assign_species(
        &mut self,
        genome: &Genome,
        parent_species: Option<SpeciesId>,
        tick: u64,
    ) -> SpeciesAssignment;

    /// Make sure a founder species exists and return it
    fn ensure_base_species(&mut self, genome: &Genome, tick: u64) -> SpeciesId;

    /// Get species by id
    fn species(&self, id: SpeciesId) -> Option<&Species>;

    /// All known species (living and extinct), ordered by id
    fn all_species(&self) -> Vec<&Species>;

    /// Publish this tick's per-species live counts
    fn set_population_counts(&mut self, counts: &BTreeMap<SpeciesId, usize>, tick: u64);

    /// Display name of a species
    fn species_name(&self, id: SpeciesId) -> String {
        self.species(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// Observer for population lifecycle events
///
/// All methods default to no-ops so implementors only override what they need.
pub trait PopulationHooks {
    /// A creature was born this tick
    fn on_birth(&mut self, _child: CreatureId, _parent: CreatureId, _species: SpeciesId, _tick: u64) {}

    /// A creature died this tick
    fn on_death(&mut self, _creature: CreatureId, _species: SpeciesId, _tick: u64) {}

    /// Reproduction produced a genome far enough away to found a species
    fn on_speciation(&mut self, _species: SpeciesId, _parent_species: SpeciesId, _tick: u64) {}

    /// A species crossed the intelligence threshold (fires once per species)
    fn on_intelligence(&mut self, _species: SpeciesId, _tick: u64) {}
}

/// A no-op implementation for when lifecycle events are not needed
#[derive(Default)]
pub struct NoopHooks;

impl PopulationHooks for NoopHooks {}
