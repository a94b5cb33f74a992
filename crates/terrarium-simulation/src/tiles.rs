//! Tile definitions and registry

use serde::{Deserialize, Serialize};

/// Habitability at or above which a tile counts as on-biome for creatures
pub const ON_BIOME_HABITABILITY: f32 = 0.3;

/// Terrain type of a single grid cell
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileType {
    DeepWater = 0,
    ShallowWater = 1,
    Sand = 2,
    #[default]
    Grassland = 3,
    Forest = 4,
    Jungle = 5,
    Swamp = 6,
    Savanna = 7,
    Desert = 8,
    Hills = 9,
    Mountain = 10,
    Rock = 11,
    Snow = 12,
    Lava = 13,
}

impl TileType {
    pub const ALL: [TileType; 14] = [
        TileType::DeepWater,
        TileType::ShallowWater,
        TileType::Sand,
        TileType::Grassland,
        TileType::Forest,
        TileType::Jungle,
        TileType::Swamp,
        TileType::Savanna,
        TileType::Desert,
        TileType::Hills,
        TileType::Mountain,
        TileType::Rock,
        TileType::Snow,
        TileType::Lava,
    ];

    /// Decode a raw layer byte. Unknown values yield `None`.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Decode a raw layer byte, treating unknown values as Rock
    pub fn from_u8_or_rock(value: u8) -> Self {
        Self::from_u8(value).unwrap_or(TileType::Rock)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn def(self) -> &'static TileDef {
        &TILE_DEFS[self as usize]
    }

    pub fn is_water(self) -> bool {
        self.def().is_water
    }

    pub fn is_lethal(self) -> bool {
        self.def().is_lethal
    }

    pub fn habitability(self) -> f32 {
        self.def().habitability
    }

    /// True for tiles creatures can live on long-term
    pub fn is_on_biome(self) -> bool {
        self.def().habitability >= ON_BIOME_HABITABILITY
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }
}

/// Static properties of a tile type
#[derive(Clone, Debug, Serialize)]
pub struct TileDef {
    pub tile: TileType,
    pub name: &'static str,
    pub is_water: bool,
    /// Standing on this tile is rapidly fatal
    pub is_lethal: bool,
    /// 0.0 (uninhabitable) to 1.0 (ideal)
    pub habitability: f32,
    /// Maximum plant biomass the tile supports (0-255)
    pub biomass_capacity: f32,
    /// Humidity the climate relaxes toward (0-255)
    pub base_humidity: u8,
    /// Base color (RGBA) for renderers
    pub color: [u8; 4],
}

#[allow(clippy::too_many_arguments)]
const fn def(
    tile: TileType,
    name: &'static str,
    is_water: bool,
    is_lethal: bool,
    habitability: f32,
    biomass_capacity: f32,
    base_humidity: u8,
    color: [u8; 4],
) -> TileDef {
    TileDef {
        tile,
        name,
        is_water,
        is_lethal,
        habitability,
        biomass_capacity,
        base_humidity,
        color,
    }
}

static TILE_DEFS: [TileDef; 14] = [
    def(TileType::DeepWater, "deep water", true, false, 0.0, 0.0, 240, [24, 52, 120, 255]),
    def(TileType::ShallowWater, "shallow water", true, false, 0.0, 20.0, 220, [48, 96, 170, 255]),
    def(TileType::Sand, "sand", false, false, 0.45, 40.0, 90, [214, 196, 140, 255]),
    def(TileType::Grassland, "grassland", false, false, 1.0, 180.0, 130, [96, 160, 70, 255]),
    def(TileType::Forest, "forest", false, false, 0.95, 230.0, 170, [40, 110, 50, 255]),
    def(TileType::Jungle, "jungle", false, false, 0.85, 255.0, 210, [24, 90, 40, 255]),
    def(TileType::Swamp, "swamp", false, false, 0.7, 200.0, 225, [70, 96, 70, 255]),
    def(TileType::Savanna, "savanna", false, false, 0.85, 140.0, 85, [170, 160, 80, 255]),
    def(TileType::Desert, "desert", false, false, 0.35, 30.0, 40, [226, 200, 130, 255]),
    def(TileType::Hills, "hills", false, false, 0.75, 110.0, 110, [120, 130, 80, 255]),
    def(TileType::Mountain, "mountain", false, false, 0.25, 40.0, 100, [120, 112, 104, 255]),
    def(TileType::Rock, "rock", false, false, 0.2, 10.0, 70, [100, 96, 92, 255]),
    def(TileType::Snow, "snow", false, false, 0.25, 15.0, 150, [236, 240, 245, 255]),
    def(TileType::Lava, "lava", false, true, 0.0, 0.0, 0, [255, 80, 20, 255]),
];

/// Registry view over all tile definitions
pub struct Tiles;

impl Tiles {
    pub fn get(tile: TileType) -> &'static TileDef {
        tile.def()
    }

    pub fn all() -> &'static [TileDef] {
        &TILE_DEFS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_discriminants() {
        for (i, def) in Tiles::all().iter().enumerate() {
            assert_eq!(def.tile as usize, i, "{} out of order", def.name);
        }
    }

    #[test]
    fn test_from_u8_roundtrip() {
        for tile in TileType::ALL {
            assert_eq!(TileType::from_u8(tile.as_u8()), Some(tile));
        }
        assert_eq!(TileType::from_u8(14), None);
        assert_eq!(TileType::from_u8_or_rock(200), TileType::Rock);
    }

    #[test]
    fn test_water_and_lava_flags() {
        assert!(TileType::DeepWater.is_water());
        assert!(TileType::ShallowWater.is_water());
        assert!(!TileType::Swamp.is_water());
        assert!(TileType::Lava.is_lethal());
        assert!(!TileType::Lava.is_on_biome());
    }

    #[test]
    fn test_on_biome_threshold() {
        assert!(TileType::Grassland.is_on_biome());
        assert!(TileType::Desert.is_on_biome());
        assert!(!TileType::Rock.is_on_biome());
        assert!(!TileType::Snow.is_on_biome());
    }

    #[test]
    fn test_habitability_in_unit_range() {
        for def in Tiles::all() {
            assert!((0.0..=1.0).contains(&def.habitability));
            assert!((0.0..=255.0).contains(&def.biomass_capacity));
        }
    }
}
