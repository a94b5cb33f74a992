//! Earthquakes: a fault line stamped a few points per tick

use bresenham::Bresenham;
use serde::{Deserialize, Serialize};
use terrarium_simulation::hash::hash01;
use terrarium_simulation::{Layer, TileType, WorldGrid};

use super::active::{EventHeader, StepOutcome, finite_or};

/// Salt for the per-cell crack pattern, so it differs from area jitter
pub const CRACK_SALT: u32 = 0x6a09_e667;
/// Fault points stamped per tick
const POINTS_PER_TICK: usize = 2;
/// Crack strength must be this far from neutral to reshape terrain
const TRANSFORM_THRESHOLD: f32 = 0.28;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeEvent {
    pub header: EventHeader,
    /// Precomputed fault line, clamped to the grid
    pub points: Vec<(i32, i32)>,
    pub half_width: i32,
    #[serde(default)]
    pub cursor: usize,
    pub intensity: f32,
}

impl EarthquakeEvent {
    /// Build the fault line from the anchor along `angle` (radians) for
    /// `length` tiles. Returns None when no point lands on the grid.
    pub fn new(
        mut header: EventHeader,
        grid: &WorldGrid,
        length: i32,
        angle: f32,
        half_width: i32,
        intensity: f32,
    ) -> Option<Self> {
        if grid.is_empty() {
            return None;
        }
        let points = fault_line(grid, header.x, header.y, length, angle);
        if points.is_empty() {
            return None;
        }
        header.duration = points.len().div_ceil(POINTS_PER_TICK) as u32 + 1;
        Some(Self {
            header,
            points,
            half_width: half_width.clamp(0, 3),
            cursor: 0,
            intensity: finite_or(intensity, 0.0).clamp(0.0, 1.0),
        })
    }

    pub fn step(&mut self, grid: &mut WorldGrid) -> StepOutcome {
        let mut changed = false;
        for _ in 0..POINTS_PER_TICK {
            let Some(&(px, py)) = self.points.get(self.cursor) else {
                break;
            };
            self.cursor += 1;
            changed |= self.stamp(grid, px, py);
        }
        self.header.elapsed += 1;
        StepOutcome {
            done: self.cursor >= self.points.len() || self.header.elapsed >= self.header.duration,
            changed,
            overlay: Default::default(),
        }
    }

    fn stamp(&self, grid: &mut WorldGrid, px: i32, py: i32) -> bool {
        let hw = self.half_width;
        let crack_seed = self.header.seed ^ CRACK_SALT;
        let mut changed = false;
        for dy in -hw..=hw {
            for dx in -hw..=hw {
                let (x, y) = (px + dx, py + dy);
                let Some(tile) = grid.tile(x, y) else {
                    continue;
                };
                if tile.is_water() {
                    continue;
                }
                let cheb = dx.abs().max(dy.abs()) as f32;
                let s = self.intensity * (1.0 - 0.5 * cheb / (hw + 1) as f32);
                changed |= grid.add_value(Layer::Hazard, x, y, 40.0 * s);
                changed |= grid.add_value(Layer::Humidity, x, y, -12.0 * s);
                changed |= grid.add_value(Layer::Fertility, x, y, -10.0 * s);

                let c = hash01(crack_seed, x, y);
                if (c - 0.5).abs() > TRANSFORM_THRESHOLD
                    && let Some(next) = reshape(tile, c >= 0.5)
                {
                    changed |= grid.set_tile(x, y, next);
                }
            }
        }
        changed
    }

    pub(crate) fn sanitize(&mut self, grid: &WorldGrid) -> bool {
        self.points.retain(|&(x, y)| grid.in_bounds(x, y));
        if self.points.is_empty() {
            return false;
        }
        self.cursor = self.cursor.min(self.points.len());
        self.half_width = self.half_width.clamp(0, 3);
        self.intensity = finite_or(self.intensity, 0.0).clamp(0.0, 1.0);
        true
    }
}

/// Uplift raises terrain one step, subsidence lowers it
fn reshape(tile: TileType, uplift: bool) -> Option<TileType> {
    if uplift {
        match tile {
            TileType::Grassland | TileType::Savanna | TileType::Forest | TileType::Jungle => {
                Some(TileType::Hills)
            }
            TileType::Swamp => Some(TileType::Rock),
            TileType::Hills => Some(TileType::Mountain),
            _ => None,
        }
    } else {
        match tile {
            TileType::Mountain => Some(TileType::Hills),
            TileType::Hills => Some(TileType::Grassland),
            TileType::Rock => Some(TileType::Swamp),
            _ => None,
        }
    }
}

/// Bresenham points from the anchor toward the clamped end point, inclusive
fn fault_line(grid: &WorldGrid, x: i32, y: i32, length: i32, angle: f32) -> Vec<(i32, i32)> {
    let max_x = grid.width() as i32 - 1;
    let max_y = grid.height() as i32 - 1;
    let angle = finite_or(angle, 0.0);
    let length = length.max(1) as f32;
    let start = (x.clamp(0, max_x), y.clamp(0, max_y));
    let end = (
        ((x as f32 + angle.cos() * length).round() as i32).clamp(0, max_x),
        ((y as f32 + angle.sin() * length).round() as i32).clamp(0, max_y),
    );

    let mut points: Vec<(i32, i32)> = Bresenham::new(
        (start.0 as isize, start.1 as isize),
        (end.0 as isize, end.1 as isize),
    )
    .map(|(px, py)| (px as i32, py as i32))
    .collect();
    if points.last() != Some(&end) {
        points.push(end);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(x: i32, y: i32) -> EventHeader {
        EventHeader {
            id: 1,
            kind: terrarium_simulation::EventKind::Earthquake,
            start_tick: 0,
            duration: 0,
            elapsed: 0,
            seed: 1234,
            x,
            y,
        }
    }

    #[test]
    fn test_fault_line_inclusive_and_clamped() {
        let grid = WorldGrid::new(32, 32);
        let pts = fault_line(&grid, 2, 5, 10, 0.0);
        assert_eq!(pts.first(), Some(&(2, 5)));
        assert_eq!(pts.last(), Some(&(12, 5)));
        assert_eq!(pts.len(), 11);

        let pts = fault_line(&grid, 28, 5, 40, 0.0);
        assert_eq!(pts.last(), Some(&(31, 5)));
        assert!(pts.iter().all(|&(x, y)| grid.in_bounds(x, y)));
    }

    #[test]
    fn test_duration_from_point_count() {
        let grid = WorldGrid::new(32, 32);
        let quake = EarthquakeEvent::new(header(2, 5), &grid, 10, 0.0, 1, 1.0)
            .expect("quake on grid");
        assert_eq!(quake.points.len(), 11);
        assert_eq!(quake.header.duration, 7);
    }

    #[test]
    fn test_done_after_path_exhausted() {
        let mut grid = WorldGrid::new(32, 32);
        let mut quake = EarthquakeEvent::new(header(2, 5), &grid, 5, 0.0, 1, 1.0)
            .expect("quake on grid");
        let mut ticks = 0;
        loop {
            ticks += 1;
            if quake.step(&mut grid).done {
                break;
            }
        }
        assert_eq!(ticks, 3);
        assert!(grid.hazard(4, 5).unwrap_or(0) >= 40);
    }

    #[test]
    fn test_water_is_immune() {
        let mut grid = WorldGrid::filled(16, 16, TileType::DeepWater);
        let mut quake = EarthquakeEvent::new(header(2, 8), &grid, 8, 0.0, 2, 1.0)
            .expect("quake on grid");
        grid.drain_dirty_chunks();
        while !quake.step(&mut grid).done {}
        assert_eq!(grid.dirty_count(), 0);
    }

    #[test]
    fn test_reshape_rules() {
        assert_eq!(reshape(TileType::Forest, true), Some(TileType::Hills));
        assert_eq!(reshape(TileType::Hills, true), Some(TileType::Mountain));
        assert_eq!(reshape(TileType::Swamp, true), Some(TileType::Rock));
        assert_eq!(reshape(TileType::Mountain, false), Some(TileType::Hills));
        assert_eq!(reshape(TileType::Rock, false), Some(TileType::Swamp));
        assert_eq!(reshape(TileType::Lava, true), None);
    }

    #[test]
    fn test_off_grid_anchor_rejected() {
        let grid = WorldGrid::new(0, 0);
        assert!(EarthquakeEvent::new(header(0, 0), &grid, 10, 1.0, 1, 1.0).is_none());
    }
}
