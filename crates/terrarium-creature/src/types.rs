//! Identifier types for creatures and species
//!
//! Ids are handed out by explicit counters on the owning engine/registry so
//! several simulations can live in one process and round-trip through
//! snapshots.

use serde::{Deserialize, Serialize};

/// Unique identifier of a creature within one simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(pub u64);

impl CreatureId {
    /// Get the raw u64 value (useful for debugging/serialization)
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Creature({})", self.0)
    }
}

/// Unique identifier of a species within one registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(pub u32);

impl SpeciesId {
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Species({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creature_id_display() {
        assert_eq!(CreatureId(7).to_string(), "Creature(7)");
        assert_eq!(CreatureId(7).raw(), 7);
    }

    #[test]
    fn test_species_id_ordering() {
        let mut ids = vec![SpeciesId(3), SpeciesId(1), SpeciesId(2)];
        ids.sort();
        assert_eq!(ids, vec![SpeciesId(1), SpeciesId(2), SpeciesId(3)]);
        assert_eq!(SpeciesId(2).to_string(), "Species(2)");
    }
}
