//! Grid and primitive data for Terrarium
//!
//! This crate provides the foundational data types shared by every subsystem:
//! - Tile definitions (TileType, TileDef, Tiles)
//! - The world grid with its byte layers and dirty-chunk bitmap (WorldGrid, CHUNK_SIZE)
//! - The simulation RNG abstraction (SimRng)
//! - Deterministic hash helpers (mix32, cell_hash, hash01)
//! - Event vocabulary shared between the event engine and creatures (EventKind, RecentEvent, Overlay)

mod events;
mod grid;
pub mod hash;
mod rng;
mod tiles;

pub use events::{EventKind, Overlay, RecentEvent};
pub use grid::{CHUNK_AREA, CHUNK_SIZE, CellSample, ChunkCoord, Layer, WorldGrid, clamp_byte};
pub use rng::SimRng;
pub use tiles::{ON_BIOME_HABITABILITY, TileDef, TileType, Tiles};
