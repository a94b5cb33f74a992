//! Reference genetics collaborator: distance-threshold species clustering

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use terrarium_simulation::SimRng;

use crate::genome::Genome;
use crate::naming;
use crate::traits::{GeneticsProvider, SpeciesAssignment};
use crate::types::SpeciesId;

/// Genomes further than this from every living representative found a new species
pub const DEFAULT_SPECIATION_THRESHOLD: f32 = 0.32;

/// A cluster of genetically similar creatures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    /// Genome of the founding member
    pub representative: Genome,
    #[serde(default)]
    pub parent: Option<SpeciesId>,
    #[serde(default)]
    pub created_tick: u64,
    #[serde(default)]
    pub population: usize,
    #[serde(default)]
    pub peak_population: usize,
    #[serde(default)]
    pub extinct_tick: Option<u64>,
}

impl Species {
    pub fn is_extinct(&self) -> bool {
        self.extinct_tick.is_some()
    }
}

/// Plain snapshot of the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRegistryState {
    #[serde(default)]
    pub seed: u32,
    #[serde(default)]
    pub threshold: f32,
    #[serde(default)]
    pub next_id: u32,
    #[serde(default)]
    pub species: Vec<Species>,
}

/// Clusters genomes into species by distance to each species' representative
#[derive(Debug, Clone)]
pub struct SpeciesRegistry {
    seed: u32,
    threshold: f32,
    next_id: u32,
    species: BTreeMap<SpeciesId, Species>,
}

impl SpeciesRegistry {
    pub fn new(seed: u32) -> Self {
        Self::with_threshold(seed, DEFAULT_SPECIATION_THRESHOLD)
    }

    pub fn with_threshold(seed: u32, threshold: f32) -> Self {
        Self {
            seed,
            threshold: sanitize_threshold(threshold),
            next_id: 1,
            species: BTreeMap::new(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Species with at least one living member
    pub fn living_count(&self) -> usize {
        self.species.values().filter(|s| s.population > 0).count()
    }

    fn create(&mut self, genome: &Genome, parent: Option<SpeciesId>, tick: u64) -> SpeciesId {
        let id = SpeciesId(self.next_id);
        self.next_id += 1;
        let name = naming::species_name(self.seed, id.0);
        log::info!(
            "New species {} '{}' at tick {} (parent: {:?})",
            id,
            name,
            tick,
            parent
        );
        self.species.insert(
            id,
            Species {
                id,
                name,
                representative: genome.clone(),
                parent,
                created_tick: tick,
                population: 0,
                peak_population: 0,
                extinct_tick: None,
            },
        );
        id
    }

    /// Closest living species within the threshold. Ties keep the lowest id.
    fn closest(&self, genome: &Genome) -> Option<(SpeciesId, f32)> {
        let mut best: Option<(SpeciesId, f32)> = None;
        for s in self.species.values().filter(|s| !s.is_extinct()) {
            let d = genome.distance(&s.representative);
            if d <= self.threshold && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((s.id, d));
            }
        }
        best
    }

    pub fn export_state(&self) -> SpeciesRegistryState {
        SpeciesRegistryState {
            seed: self.seed,
            threshold: self.threshold,
            next_id: self.next_id,
            species: self.species.values().cloned().collect(),
        }
    }

    /// Restore from a snapshot. Malformed entries are repaired or dropped.
    pub fn hydrate_state(&mut self, state: SpeciesRegistryState) {
        self.seed = state.seed;
        self.threshold = sanitize_threshold(state.threshold);
        self.species.clear();
        let mut max_id = 0;
        for mut s in state.species {
            if s.id.0 == 0 {
                log::warn!("Dropping species with reserved id 0 from snapshot");
                continue;
            }
            s.representative = s.representative.sanitized();
            s.peak_population = s.peak_population.max(s.population);
            max_id = max_id.max(s.id.0);
            self.species.insert(s.id, s);
        }
        self.next_id = state.next_id.max(max_id + 1).max(1);
    }
}

fn sanitize_threshold(threshold: f32) -> f32 {
    if threshold.is_finite() && threshold > 0.0 {
        threshold.min(2.0)
    } else {
        DEFAULT_SPECIATION_THRESHOLD
    }
}

impl GeneticsProvider for SpeciesRegistry {
    fn create_random_genome(&mut self, rng: &mut dyn SimRng) -> Genome {
        Genome::random(rng)
    }

    fn mutate(&mut self, genome: &Genome, rng: &mut dyn SimRng, rate: f32) -> Genome {
        genome.mutated(rng, rate)
    }

    fn assign_species(
        &mut self,
        genome: &Genome,
        parent_species: Option<SpeciesId>,
        tick: u64,
    ) -> SpeciesAssignment {
        if let Some(parent) = parent_species
            .and_then(|id| self.species.get(&id))
            .filter(|s| !s.is_extinct())
        {
            let d = genome.distance(&parent.representative);
            if d <= self.threshold {
                return SpeciesAssignment {
                    species_id: parent.id,
                    created: false,
                    distance: d,
                };
            }
        }

        if let Some((species_id, distance)) = self.closest(genome) {
            return SpeciesAssignment {
                species_id,
                created: false,
                distance,
            };
        }

        let species_id = self.create(genome, parent_species, tick);
        SpeciesAssignment {
            species_id,
            created: true,
            distance: 0.0,
        }
    }

    fn ensure_base_species(&mut self, genome: &Genome, tick: u64) -> SpeciesId {
        match self.species.values().find(|s| !s.is_extinct()) {
            Some(s) => s.id,
            None => self.create(genome, None, tick),
        }
    }

    fn species(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(&id)
    }

    fn all_species(&self) -> Vec<&Species> {
        self.species.values().collect()
    }

    fn set_population_counts(&mut self, counts: &BTreeMap<SpeciesId, usize>, tick: u64) {
        for s in self.species.values_mut() {
            let pop = counts.get(&s.id).copied().unwrap_or(0);
            s.population = pop;
            s.peak_population = s.peak_population.max(pop);
            if pop > 0 {
                s.extinct_tick = None;
            } else if s.peak_population > 0 && s.extinct_tick.is_none() {
                log::info!("Species {} '{}' went extinct at tick {}", s.id, s.name, tick);
                s.extinct_tick = Some(tick);
            }
        }
    }
}
