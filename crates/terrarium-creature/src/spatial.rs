//! Disposable spatial indices over the creature arena
//!
//! Both maps are rebuilt wholesale from the arena every tick and hold arena
//! indices, never creature references. Lookups only; results that feed the
//! simulation are sorted before use so map iteration order never matters.

use ahash::AHashMap;
use glam::IVec2;
use smallvec::SmallVec;

use crate::creature::Creature;

/// Edge length of a range-query bucket in tiles
pub const BUCKET_SIZE: i32 = 16;

type TileSlot = SmallVec<[u32; 4]>;

#[derive(Debug, Default, Clone)]
pub struct SpatialIndex {
    width: i32,
    /// Tile key -> arena indices standing on that tile
    tiles: AHashMap<u32, TileSlot>,
    /// Bucket key -> arena indices inside that 16x16 bucket
    buckets: AHashMap<u32, Vec<u32>>,
    /// Largest tile coordinate inserted since the last rebuild
    extent: Option<IVec2>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn tile_key(&self, x: i32, y: i32) -> u32 {
        (y * self.width + x) as u32
    }

    #[inline]
    fn bucket_key(x: i32, y: i32) -> u32 {
        let bx = (x / BUCKET_SIZE) as u32;
        let by = (y / BUCKET_SIZE) as u32;
        (by << 16) | (bx & 0xffff)
    }

    /// Rebuild both maps from scratch
    pub fn rebuild(&mut self, creatures: &[Creature], width: usize) {
        self.width = width as i32;
        self.tiles.clear();
        self.buckets.clear();
        self.extent = None;
        for (i, c) in creatures.iter().enumerate() {
            self.insert(i as u32, c.x, c.y);
        }
    }

    fn insert(&mut self, idx: u32, x: i32, y: i32) {
        if x < 0 || y < 0 || x >= self.width {
            return;
        }
        let pos = IVec2::new(x, y);
        self.extent = Some(self.extent.map_or(pos, |e| e.max(pos)));
        let key = self.tile_key(x, y);
        self.tiles.entry(key).or_default().push(idx);
        self.buckets.entry(Self::bucket_key(x, y)).or_default().push(idx);
    }

    /// Drop an arena index from both maps (death during a tick)
    pub fn remove(&mut self, idx: u32, x: i32, y: i32) {
        if x < 0 || y < 0 || x >= self.width {
            return;
        }
        let key = self.tile_key(x, y);
        if let Some(slot) = self.tiles.get_mut(&key) {
            slot.retain(|&mut i| i != idx);
            if slot.is_empty() {
                self.tiles.remove(&key);
            }
        }
        if let Some(bucket) = self.buckets.get_mut(&Self::bucket_key(x, y)) {
            bucket.retain(|&i| i != idx);
        }
    }

    /// Move an arena index between tiles (movement during a tick)
    pub fn relocate(&mut self, idx: u32, from: IVec2, to: IVec2) {
        self.remove(idx, from.x, from.y);
        self.insert(idx, to.x, to.y);
    }

    /// Number of creatures standing on a tile
    pub fn occupancy(&self, x: i32, y: i32) -> usize {
        if x < 0 || y < 0 || x >= self.width {
            return 0;
        }
        self.tiles.get(&self.tile_key(x, y)).map_or(0, |s| s.len())
    }

    /// Arena indices on a tile, in insertion order
    pub fn occupants(&self, x: i32, y: i32) -> &[u32] {
        if x < 0 || y < 0 || x >= self.width {
            return &[];
        }
        self.tiles
            .get(&self.tile_key(x, y))
            .map_or(&[][..], |s| s.as_slice())
    }

    /// Arena indices inside the inclusive rectangle, sorted ascending
    pub fn query_rect(&self, creatures: &[Creature], min: IVec2, max: IVec2) -> Vec<usize> {
        let Some(extent) = self.extent else {
            return Vec::new();
        };
        let lo = min.min(max).max(IVec2::ZERO);
        let hi = min.max(max).min(extent);
        if lo.x > hi.x || lo.y > hi.y {
            return Vec::new();
        }
        let mut out = Vec::new();
        for by in lo.y / BUCKET_SIZE..=hi.y / BUCKET_SIZE {
            for bx in lo.x / BUCKET_SIZE..=hi.x / BUCKET_SIZE {
                let key = Self::bucket_key(bx * BUCKET_SIZE, by * BUCKET_SIZE);
                let Some(bucket) = self.buckets.get(&key) else {
                    continue;
                };
                for &i in bucket {
                    if let Some(c) = creatures.get(i as usize)
                        && c.x >= lo.x
                        && c.x <= hi.x
                        && c.y >= lo.y
                        && c.y <= hi.y
                    {
                        out.push(i as usize);
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
