//! World grid: parallel per-cell layers plus a chunk-level dirty bitmap
//!
//! Every writer goes through a setter that compares the old value and marks
//! the containing chunk dirty only on an actual change. Consumers drain the
//! bitmap with [`WorldGrid::drain_dirty_chunks`]; producers never clear it.

use serde::{Deserialize, Serialize};

use crate::tiles::TileType;

/// Size of a dirty-tracking chunk in tiles (16x16)
pub const CHUNK_SIZE: usize = 16;

/// Total tiles in a chunk
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Byte layers stored per cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Humidity,
    Temperature,
    Fertility,
    Hazard,
}

/// Normalized view of a single cell (byte layers mapped to 0.0-1.0)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSample {
    pub tile: TileType,
    pub humidity: f32,
    pub temperature: f32,
    pub fertility: f32,
    pub hazard: f32,
    pub biomass: f32,
}

/// Chunk coordinate returned by the dirty drain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: usize,
    pub cy: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorldGrid {
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default)]
    tiles: Vec<u8>,
    #[serde(default)]
    humidity: Vec<u8>,
    #[serde(default)]
    temperature: Vec<u8>,
    #[serde(default)]
    fertility: Vec<u8>,
    #[serde(default)]
    hazard: Vec<u8>,
    /// Plant biomass, 0.0-255.0
    #[serde(default)]
    biomass: Vec<f32>,
    #[serde(skip)]
    dirty: Vec<bool>,
}

impl WorldGrid {
    /// Create a grid of Grassland with neutral layers and no biomass
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, TileType::Grassland)
    }

    /// Create a grid uniformly filled with `tile`
    pub fn filled(width: usize, height: usize, tile: TileType) -> Self {
        let len = width * height;
        let mut grid = Self {
            width,
            height,
            tiles: vec![tile.as_u8(); len],
            humidity: vec![tile.def().base_humidity; len],
            temperature: vec![128; len],
            fertility: vec![128; len],
            hazard: vec![0; len],
            biomass: vec![0.0; len],
            dirty: Vec::new(),
        };
        grid.dirty = vec![false; grid.chunk_count()];
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chunks_x(&self) -> usize {
        self.width.div_ceil(CHUNK_SIZE)
    }

    pub fn chunks_y(&self) -> usize {
        self.height.div_ceil(CHUNK_SIZE)
    }

    fn chunk_count(&self) -> usize {
        self.chunks_x() * self.chunks_y()
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Coordinates of a cell index
    #[inline]
    pub fn coords(&self, idx: usize) -> (i32, i32) {
        ((idx % self.width.max(1)) as i32, (idx / self.width.max(1)) as i32)
    }

    #[inline]
    fn mark_index_dirty(&mut self, idx: usize) {
        let x = idx % self.width;
        let y = idx / self.width;
        let chunk = (y / CHUNK_SIZE) * self.chunks_x() + x / CHUNK_SIZE;
        if let Some(flag) = self.dirty.get_mut(chunk) {
            *flag = true;
        }
    }

    fn layer_vec(&self, layer: Layer) -> &Vec<u8> {
        match layer {
            Layer::Humidity => &self.humidity,
            Layer::Temperature => &self.temperature,
            Layer::Fertility => &self.fertility,
            Layer::Hazard => &self.hazard,
        }
    }

    fn layer_vec_mut(&mut self, layer: Layer) -> &mut Vec<u8> {
        match layer {
            Layer::Humidity => &mut self.humidity,
            Layer::Temperature => &mut self.temperature,
            Layer::Fertility => &mut self.fertility,
            Layer::Hazard => &mut self.hazard,
        }
    }

    // ---- getters ----

    pub fn tile(&self, x: i32, y: i32) -> Option<TileType> {
        self.index(x, y).map(|i| TileType::from_u8_or_rock(self.tiles[i]))
    }

    pub fn tile_at_index(&self, idx: usize) -> TileType {
        self.tiles
            .get(idx)
            .map_or(TileType::Rock, |&t| TileType::from_u8_or_rock(t))
    }

    pub fn value(&self, layer: Layer, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.layer_vec(layer)[i])
    }

    pub fn value_at_index(&self, layer: Layer, idx: usize) -> u8 {
        self.layer_vec(layer).get(idx).copied().unwrap_or(0)
    }

    pub fn biomass(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.biomass[i])
    }

    pub fn biomass_at_index(&self, idx: usize) -> f32 {
        self.biomass.get(idx).copied().unwrap_or(0.0)
    }

    pub fn humidity(&self, x: i32, y: i32) -> Option<u8> {
        self.value(Layer::Humidity, x, y)
    }

    pub fn temperature(&self, x: i32, y: i32) -> Option<u8> {
        self.value(Layer::Temperature, x, y)
    }

    pub fn fertility(&self, x: i32, y: i32) -> Option<u8> {
        self.value(Layer::Fertility, x, y)
    }

    pub fn hazard(&self, x: i32, y: i32) -> Option<u8> {
        self.value(Layer::Hazard, x, y)
    }

    /// All layers of a cell normalized to 0.0-1.0
    pub fn sample(&self, x: i32, y: i32) -> Option<CellSample> {
        let i = self.index(x, y)?;
        Some(CellSample {
            tile: TileType::from_u8_or_rock(self.tiles[i]),
            humidity: self.humidity[i] as f32 / 255.0,
            temperature: self.temperature[i] as f32 / 255.0,
            fertility: self.fertility[i] as f32 / 255.0,
            hazard: self.hazard[i] as f32 / 255.0,
            biomass: self.biomass[i] / 255.0,
        })
    }

    /// Raw byte layer (row-major)
    pub fn layer(&self, layer: Layer) -> &[u8] {
        self.layer_vec(layer)
    }

    /// Raw tile bytes (row-major)
    pub fn tiles_raw(&self) -> &[u8] {
        &self.tiles
    }

    pub fn biomass_raw(&self) -> &[f32] {
        &self.biomass
    }

    /// True if any 4-neighbor of (x, y) is a water tile
    pub fn is_water_adjacent(&self, x: i32, y: i32) -> bool {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .any(|&(dx, dy)| self.tile(x + dx, y + dy).is_some_and(|t| t.is_water()))
    }

    // ---- setters ----

    /// Returns true if the tile changed
    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileType) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.tiles[i] == tile.as_u8() {
            return false;
        }
        self.tiles[i] = tile.as_u8();
        self.mark_index_dirty(i);
        true
    }

    /// Returns true if the value changed
    pub fn set_value(&mut self, layer: Layer, x: i32, y: i32, value: u8) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.set_value_at_index(layer, i, value)
    }

    pub fn set_value_at_index(&mut self, layer: Layer, idx: usize, value: u8) -> bool {
        let Some(slot) = self.layer_vec_mut(layer).get_mut(idx) else {
            return false;
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        self.mark_index_dirty(idx);
        true
    }

    /// Add a fractional delta, rounding to the nearest integer and clamping to 0-255
    pub fn add_value(&mut self, layer: Layer, x: i32, y: i32, delta: f32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        let current = self.layer_vec(layer)[i] as f32;
        self.set_value_at_index(layer, i, clamp_byte(current + delta))
    }

    /// Raise a layer to at least `floor`
    pub fn raise_value(&mut self, layer: Layer, x: i32, y: i32, floor: u8) -> bool {
        match self.value(layer, x, y) {
            Some(v) if v < floor => self.set_value(layer, x, y, floor),
            _ => false,
        }
    }

    /// Set biomass, clamped to 0.0-255.0
    pub fn set_biomass(&mut self, x: i32, y: i32, value: f32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.set_biomass_at_index(i, value)
    }

    pub fn set_biomass_at_index(&mut self, idx: usize, value: f32) -> bool {
        let value = if value.is_finite() {
            value.clamp(0.0, 255.0)
        } else {
            0.0
        };
        let Some(slot) = self.biomass.get_mut(idx) else {
            return false;
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        self.mark_index_dirty(idx);
        true
    }

    // ---- dirty tracking ----

    /// Mark every chunk overlapping the inclusive rectangle dirty (clamped to the grid)
    pub fn mark_dirty_rect(&mut self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) {
        if self.is_empty() || max_x < 0 || max_y < 0 {
            return;
        }
        let x0 = min_x.max(0) as usize;
        let y0 = min_y.max(0) as usize;
        let x1 = (max_x as usize).min(self.width - 1);
        let y1 = (max_y as usize).min(self.height - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }
        let cx_count = self.chunks_x();
        for cy in y0 / CHUNK_SIZE..=y1 / CHUNK_SIZE {
            for cx in x0 / CHUNK_SIZE..=x1 / CHUNK_SIZE {
                if let Some(flag) = self.dirty.get_mut(cy * cx_count + cx) {
                    *flag = true;
                }
            }
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.iter_mut().for_each(|d| *d = true);
    }

    pub fn is_chunk_dirty(&self, cx: usize, cy: usize) -> bool {
        cx < self.chunks_x() && self.dirty.get(cy * self.chunks_x() + cx).copied().unwrap_or(false)
    }

    /// Number of chunks currently flagged
    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().filter(|&&d| d).count()
    }

    /// Read-and-clear the dirty bitmap. Chunks are returned in row-major order.
    pub fn drain_dirty_chunks(&mut self) -> Vec<ChunkCoord> {
        let cx_count = self.chunks_x().max(1);
        let mut out = Vec::new();
        for (i, flag) in self.dirty.iter_mut().enumerate() {
            if *flag {
                *flag = false;
                out.push(ChunkCoord {
                    cx: i % cx_count,
                    cy: i / cx_count,
                });
            }
        }
        out
    }

    // ---- persistence helpers ----

    /// Repair a grid loaded from an untrusted snapshot: fix layer lengths,
    /// map unknown tile bytes to Rock, clamp biomass. Marks everything dirty.
    /// Returns the number of repaired values.
    pub fn sanitize(&mut self) -> usize {
        let len = self.width * self.height;
        let mut repaired = 0;
        for layer in [
            &mut self.tiles,
            &mut self.humidity,
            &mut self.temperature,
            &mut self.fertility,
            &mut self.hazard,
        ] {
            if layer.len() != len {
                repaired += layer.len().abs_diff(len);
                layer.resize(len, 0);
            }
        }
        for t in self.tiles.iter_mut() {
            if TileType::from_u8(*t).is_none() {
                *t = TileType::Rock.as_u8();
                repaired += 1;
            }
        }
        if self.biomass.len() != len {
            repaired += self.biomass.len().abs_diff(len);
            self.biomass.resize(len, 0.0);
        }
        for b in self.biomass.iter_mut() {
            if !b.is_finite() || !(0.0..=255.0).contains(b) {
                *b = if b.is_finite() { b.clamp(0.0, 255.0) } else { 0.0 };
                repaired += 1;
            }
        }
        self.dirty = vec![true; self.chunk_count()];
        repaired
    }

    /// FNV-1a digest over every layer, for determinism checks
    pub fn fingerprint(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut fold = |b: u8| {
            h ^= b as u64;
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        };
        for layer in [
            &self.tiles,
            &self.humidity,
            &self.temperature,
            &self.fertility,
            &self.hazard,
        ] {
            layer.iter().for_each(|&b| fold(b));
        }
        for b in &self.biomass {
            b.to_bits().to_le_bytes().iter().for_each(|&v| fold(v));
        }
        h
    }
}

/// Round and clamp a layer value into the byte range
#[inline]
pub fn clamp_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_dimensions() {
        let grid = WorldGrid::new(40, 20);
        assert_eq!(grid.width(), 40);
        assert_eq!(grid.height(), 20);
        assert_eq!(grid.len(), 800);
        assert_eq!(grid.chunks_x(), 3);
        assert_eq!(grid.chunks_y(), 2);
        assert_eq!(grid.dirty_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_access_is_ignored() {
        let mut grid = WorldGrid::new(8, 8);
        assert_eq!(grid.tile(-1, 0), None);
        assert_eq!(grid.humidity(8, 0), None);
        assert!(!grid.set_tile(8, 8, TileType::Lava));
        assert!(!grid.add_value(Layer::Hazard, -3, 2, 10.0));
        assert_eq!(grid.dirty_count(), 0);
    }

    #[test]
    fn test_unchanged_write_does_not_mark_dirty() {
        let mut grid = WorldGrid::new(32, 32);
        assert!(!grid.set_tile(3, 3, TileType::Grassland));
        assert!(!grid.set_value(Layer::Fertility, 3, 3, 128));
        assert_eq!(grid.dirty_count(), 0);

        assert!(grid.set_value(Layer::Fertility, 3, 3, 129));
        assert!(grid.is_chunk_dirty(0, 0));
        assert_eq!(grid.dirty_count(), 1);
    }

    #[test]
    fn test_add_value_rounds_and_clamps() {
        let mut grid = WorldGrid::new(4, 4);
        grid.add_value(Layer::Humidity, 0, 0, 1000.0);
        assert_eq!(grid.humidity(0, 0), Some(255));
        grid.add_value(Layer::Humidity, 0, 0, -1000.0);
        assert_eq!(grid.humidity(0, 0), Some(0));
        grid.add_value(Layer::Humidity, 0, 0, 2.6);
        assert_eq!(grid.humidity(0, 0), Some(3));
    }

    #[test]
    fn test_drain_dirty_is_idempotent() {
        let mut grid = WorldGrid::new(48, 48);
        grid.set_tile(1, 1, TileType::Sand);
        grid.set_tile(40, 40, TileType::Sand);

        let first = grid.drain_dirty_chunks();
        assert_eq!(
            first,
            vec![ChunkCoord { cx: 0, cy: 0 }, ChunkCoord { cx: 2, cy: 2 }]
        );
        assert!(grid.drain_dirty_chunks().is_empty());
    }

    #[test]
    fn test_mark_dirty_rect_clamps() {
        let mut grid = WorldGrid::new(40, 40);
        grid.mark_dirty_rect(-10, -10, 20, 5);
        let drained = grid.drain_dirty_chunks();
        assert_eq!(
            drained,
            vec![ChunkCoord { cx: 0, cy: 0 }, ChunkCoord { cx: 1, cy: 0 }]
        );

        grid.mark_dirty_rect(100, 100, 120, 120);
        assert_eq!(grid.dirty_count(), 0);
    }

    #[test]
    fn test_biomass_clamped() {
        let mut grid = WorldGrid::new(4, 4);
        grid.set_biomass(1, 1, 400.0);
        assert_eq!(grid.biomass(1, 1), Some(255.0));
        grid.set_biomass(1, 1, f32::NAN);
        assert_eq!(grid.biomass(1, 1), Some(0.0));
    }

    #[test]
    fn test_water_adjacency() {
        let mut grid = WorldGrid::new(5, 5);
        grid.set_tile(2, 1, TileType::ShallowWater);
        assert!(grid.is_water_adjacent(2, 2));
        assert!(!grid.is_water_adjacent(4, 4));
    }

    #[test]
    fn test_sanitize_repairs_layers() {
        let mut grid = WorldGrid::new(4, 4);
        grid.tiles[0] = 99;
        grid.humidity.truncate(3);
        grid.biomass[2] = f32::INFINITY;

        let repaired = grid.sanitize();
        assert!(repaired > 0);
        assert_eq!(grid.tile(0, 0), Some(TileType::Rock));
        assert_eq!(grid.layer(Layer::Humidity).len(), 16);
        assert_eq!(grid.biomass_at_index(2), 0.0);
        assert_eq!(grid.dirty_count(), 1);
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let mut a = WorldGrid::new(16, 16);
        let b = WorldGrid::new(16, 16);
        assert_eq!(a.fingerprint(), b.fingerprint());
        a.set_biomass(0, 0, 1.0);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
