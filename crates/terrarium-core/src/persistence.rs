//! Snapshot files: bincode + lz4 session state and a RON metadata sidecar

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulation::{SNAPSHOT_VERSION, SimulationState};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("failed to decode snapshot: {0}")]
    Decode(String),
    #[error("failed to decompress snapshot: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Human-readable description of a snapshot, stored next to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: u32,
    pub seed: u64,
    pub tick: u64,
    pub width: usize,
    pub height: usize,
    pub population: usize,
    pub living_species: usize,
    #[serde(default)]
    pub note: String,
}

impl SnapshotMetadata {
    pub fn from_state(state: &SimulationState) -> Self {
        let mut species: Vec<_> = state
            .population
            .creatures
            .iter()
            .map(|c| c.species)
            .collect();
        species.sort_unstable();
        species.dedup();
        Self {
            version: state.version,
            seed: state.config.seed,
            tick: state.tick,
            width: state.grid.width(),
            height: state.grid.height(),
            population: state.population.creatures.len(),
            living_species: species.len(),
            note: String::new(),
        }
    }
}

/// Write a compressed snapshot atomically (temp file, then rename)
pub fn save_snapshot(path: &Path, state: &SimulationState) -> Result<(), SnapshotError> {
    let serialized = bincode_next::serde::encode_to_vec(state, bincode_next::config::standard())
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let compressed = lz4_flex::compress_prepend_size(&serialized);

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, &compressed)?;
    std::fs::rename(&temp_path, path)?;

    log::info!(
        "Saved snapshot at tick {} to {:?} ({} bytes, {} compressed)",
        state.tick,
        path,
        serialized.len(),
        compressed.len()
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<SimulationState, SnapshotError> {
    let compressed = std::fs::read(path)?;
    log::debug!("Read {} bytes from {:?}", compressed.len(), path);

    let serialized = lz4_flex::decompress_size_prepended(&compressed)?;
    let (state, _): (SimulationState, _) =
        bincode_next::serde::decode_from_slice(&serialized, bincode_next::config::standard())
            .map_err(|e| SnapshotError::Decode(e.to_string()))?;

    if state.version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: state.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    log::info!("Loaded snapshot at tick {} from {:?}", state.tick, path);
    Ok(state)
}

pub fn save_metadata(path: &Path, meta: &SnapshotMetadata) -> Result<(), SnapshotError> {
    let serialized = ron::ser::to_string_pretty(meta, Default::default())
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;
    std::fs::write(path, serialized)?;
    Ok(())
}

pub fn load_metadata(path: &Path) -> Result<SnapshotMetadata, SnapshotError> {
    let contents = std::fs::read_to_string(path)?;
    ron::from_str(&contents).map_err(|e| SnapshotError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Simulation, SimulationConfig};
    use tempfile::tempdir;
    use terrarium_creature::NoopHooks;

    fn session() -> Simulation {
        let mut sim = Simulation::new(SimulationConfig {
            seed: 31,
            width: 48,
            height: 32,
            initial_creatures: 20,
            ..SimulationConfig::default()
        });
        for _ in 0..25 {
            sim.step(&mut NoopHooks);
        }
        sim
    }

    #[test]
    fn test_snapshot_file_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("world.snap");
        let sim = session();
        let state = sim.export_state();

        save_snapshot(&path, &state).expect("save");
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let loaded = load_snapshot(&path).expect("load");
        assert_eq!(loaded.tick, state.tick);
        assert_eq!(loaded.grid.fingerprint(), state.grid.fingerprint());
        assert_eq!(loaded.population, state.population);
        assert_eq!(loaded.events, state.events);
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("future.snap");
        let mut state = session().export_state();
        state.version = SNAPSHOT_VERSION + 1;
        save_snapshot(&path, &state).expect("save");
        assert!(matches!(
            load_snapshot(&path),
            Err(SnapshotError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("garbage.snap");
        std::fs::write(&path, [8u8, 0, 0, 0, 0xf0, 1, 2]).expect("write");
        assert!(load_snapshot(&path).is_err());
        assert!(matches!(
            load_snapshot(&dir.path().join("missing.snap")),
            Err(SnapshotError::Io(_))
        ));
    }

    #[test]
    fn test_metadata_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("world.ron");
        let state = session().export_state();
        let mut meta = SnapshotMetadata::from_state(&state);
        meta.note = "after 25 ticks".to_string();
        assert_eq!(meta.tick, 25);
        assert_eq!(meta.width, 48);

        save_metadata(&path, &meta).expect("save");
        assert_eq!(load_metadata(&path).expect("load"), meta);
    }
}
