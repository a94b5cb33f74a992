//! Elliptical area events: rain storms, droughts, heat waves and cold snaps
//!
//! All four kinds share one batch walker over the ellipse's bounding box; only
//! the per-cell mutator differs.

use serde::{Deserialize, Serialize};
use terrarium_simulation::hash::hash01;
use terrarium_simulation::{EventKind, Layer, Overlay, TileType, WorldGrid};

use super::active::{EventHeader, StepOutcome};

/// Per-cell jitter amplitude applied on top of the radial falloff
const JITTER: f32 = 0.24;
const MIN_WEIGHT: f32 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEvent {
    pub header: EventHeader,
    pub radius_x: i32,
    pub radius_y: i32,
    /// Position in the bounding box, row-major
    #[serde(default)]
    pub cursor: u32,
    /// Bounding-box positions visited per tick
    pub batch_cells: u32,
    pub intensity: f32,
}

impl AreaEvent {
    pub fn box_width(&self) -> u32 {
        box_span(self.radius_x)
    }

    pub fn box_height(&self) -> u32 {
        box_span(self.radius_y)
    }

    /// Bounding-box area in positions
    pub fn box_area(&self) -> u32 {
        self.box_width().saturating_mul(self.box_height())
    }

    /// Limit the radii to the grid size and keep at least one position per batch
    pub fn fit_to_grid(&mut self, grid: &WorldGrid) {
        let max_x = i32::try_from(grid.width()).unwrap_or(i32::MAX).max(1);
        let max_y = i32::try_from(grid.height()).unwrap_or(i32::MAX).max(1);
        self.radius_x = self.radius_x.clamp(1, max_x);
        self.radius_y = self.radius_y.clamp(1, max_y);
        self.batch_cells = self.batch_cells.max(1);
        self.cursor %= self.box_area().max(1);
    }

    /// Normalized squared ellipse distance of (x, y); inside when <= 1
    pub fn ellipse_distance(&self, x: i32, y: i32) -> f32 {
        let dx = (x - self.header.x) as f32 / self.radius_x.max(1) as f32;
        let dy = (y - self.header.y) as f32 / self.radius_y.max(1) as f32;
        dx * dx + dy * dy
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.ellipse_distance(x, y) <= 1.0
    }

    /// Overlay at full ellipse weight
    pub fn overlay(&self) -> Overlay {
        let alpha = self.intensity * self.header.life();
        match self.header.kind {
            EventKind::RainStorm => Overlay {
                storm_alpha: 0.7 * alpha,
                ..Overlay::default()
            },
            EventKind::Drought => Overlay {
                heat_alpha: 0.35 * alpha,
                ..Overlay::default()
            },
            EventKind::HeatWave => Overlay {
                heat_alpha: 0.6 * alpha,
                ..Overlay::default()
            },
            EventKind::ColdSnap => Overlay {
                cold_alpha: 0.6 * alpha,
                ..Overlay::default()
            },
            _ => Overlay::default(),
        }
    }

    /// Overlay at one tile, fading toward the ellipse rim
    pub fn overlay_at(&self, x: i32, y: i32) -> Overlay {
        let d = self.ellipse_distance(x, y);
        if d > 1.0 {
            return Overlay::default();
        }
        self.overlay().scaled(1.0 - d.sqrt())
    }

    /// Visit the next batch of positions, then age the event by one tick
    pub fn step(&mut self, grid: &mut WorldGrid) -> StepOutcome {
        let area = self.box_area().max(1);
        let life = self.header.life();
        let amount_scale = self.intensity * life;
        let mut changed = false;

        for _ in 0..self.batch_cells.min(area) {
            let pos = self.cursor;
            self.cursor = (self.cursor + 1) % area;

            let x = self.header.x - self.radius_x + (pos % self.box_width()) as i32;
            let y = self.header.y - self.radius_y + (pos / self.box_width()) as i32;
            if !grid.in_bounds(x, y) {
                continue;
            }
            let d = self.ellipse_distance(x, y);
            if d > 1.0 {
                continue;
            }
            let jitter = (hash01(self.header.seed, x, y) - 0.5) * JITTER;
            let weight = (1.0 - d.sqrt() + jitter).clamp(MIN_WEIGHT, 1.0);
            changed |= apply(self.header.kind, grid, x, y, weight * amount_scale);
        }

        let overlay = self.overlay();
        self.header.elapsed += 1;
        StepOutcome {
            done: self.header.elapsed >= self.header.duration,
            changed,
            overlay,
        }
    }
}

fn box_span(radius: i32) -> u32 {
    let span = 2 * i64::from(radius.max(0)) + 1;
    u32::try_from(span).unwrap_or(u32::MAX)
}

/// Apply one kind's mutation with effective amount `a` at (x, y)
fn apply(kind: EventKind, grid: &mut WorldGrid, x: i32, y: i32, a: f32) -> bool {
    let mut changed = false;
    match kind {
        EventKind::RainStorm => {
            changed |= grid.add_value(Layer::Humidity, x, y, 6.0 * a);
            changed |= grid.add_value(Layer::Fertility, x, y, 2.0 * a);
            changed |= grid.add_value(Layer::Temperature, x, y, -2.0 * a);
            changed |= grid.add_value(Layer::Hazard, x, y, -a);
        }
        EventKind::Drought => {
            changed |= grid.add_value(Layer::Humidity, x, y, -6.0 * a);
            changed |= grid.add_value(Layer::Fertility, x, y, -3.0 * a);
            changed |= grid.add_value(Layer::Temperature, x, y, 3.0 * a);
            if let Some(b) = grid.biomass(x, y) {
                changed |= grid.set_biomass(x, y, b * (1.0 - 0.05 * a));
            }
            let humidity = grid.humidity(x, y).unwrap_or(0);
            let next = match grid.tile(x, y) {
                Some(TileType::Forest | TileType::Jungle) if humidity < 45 => Some(TileType::Savanna),
                Some(TileType::Savanna) if humidity < 28 => Some(TileType::Desert),
                Some(TileType::Swamp) if humidity < 45 => Some(TileType::Grassland),
                _ => None,
            };
            if let Some(tile) = next {
                changed |= grid.set_tile(x, y, tile);
            }
        }
        EventKind::HeatWave => {
            changed |= grid.add_value(Layer::Temperature, x, y, 5.0 * a);
            changed |= grid.add_value(Layer::Humidity, x, y, -2.0 * a);
            let temperature = grid.temperature(x, y).unwrap_or(0);
            if temperature > 200 {
                changed |= grid.add_value(Layer::Hazard, x, y, a);
            }
            if temperature > 150 && grid.tile(x, y) == Some(TileType::Snow) {
                let tile = if grid.fertility(x, y).unwrap_or(0) >= 60 {
                    TileType::Grassland
                } else {
                    TileType::Rock
                };
                changed |= grid.set_tile(x, y, tile);
            }
        }
        EventKind::ColdSnap => {
            changed |= grid.add_value(Layer::Temperature, x, y, -5.0 * a);
            let temperature = grid.temperature(x, y).unwrap_or(255);
            if temperature < 30 {
                changed |= grid.add_value(Layer::Hazard, x, y, a);
            }
            if temperature < 40
                && matches!(grid.tile(x, y), Some(TileType::Grassland | TileType::Rock))
            {
                changed |= grid.set_tile(x, y, TileType::Snow);
            }
        }
        EventKind::Earthquake | EventKind::VolcanoEruption => {}
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, x: i32, y: i32, rx: i32, ry: i32, batch: u32) -> AreaEvent {
        AreaEvent {
            header: EventHeader {
                id: 1,
                kind,
                start_tick: 0,
                duration: 100,
                elapsed: 0,
                seed: 99,
                x,
                y,
            },
            radius_x: rx,
            radius_y: ry,
            cursor: 0,
            batch_cells: batch,
            intensity: 1.0,
        }
    }

    #[test]
    fn test_full_batch_covers_ellipse_in_one_tick() {
        let mut grid = WorldGrid::new(64, 64);
        grid.drain_dirty_chunks();
        let mut ev = event(EventKind::RainStorm, 30, 30, 6, 4, 10_000);
        // Strong enough that even rim cells round to a visible change
        ev.intensity = 10.0;
        ev.step(&mut grid);
        for y in 0..64 {
            for x in 0..64 {
                let humidity = grid.humidity(x, y).unwrap_or(0);
                if ev.contains(x, y) {
                    assert!(humidity > 130, "({x},{y}) not covered");
                } else {
                    assert_eq!(humidity, 130, "({x},{y}) outside touched");
                }
            }
        }
    }

    #[test]
    fn test_batch_walks_cursor_and_wraps() {
        let mut grid = WorldGrid::new(32, 32);
        let mut ev = event(EventKind::Drought, 10, 10, 2, 2, 10);
        assert_eq!(ev.box_area(), 25);
        ev.step(&mut grid);
        assert_eq!(ev.cursor, 10);
        ev.step(&mut grid);
        ev.step(&mut grid);
        assert_eq!(ev.cursor, 5);
    }

    #[test]
    fn test_out_of_bounds_positions_skipped() {
        let mut grid = WorldGrid::new(8, 8);
        let mut ev = event(EventKind::HeatWave, 0, 0, 5, 5, 1000);
        let outcome = ev.step(&mut grid);
        assert!(outcome.changed);
        assert!(grid.temperature(0, 0).unwrap_or(0) > 128);
    }

    #[test]
    fn test_intensity_decays_linearly() {
        let mut ev = event(EventKind::RainStorm, 5, 5, 3, 3, 10);
        assert!((ev.overlay().storm_alpha - 0.7).abs() < 1e-6);
        ev.header.elapsed = 50;
        assert!((ev.overlay().storm_alpha - 0.35).abs() < 1e-6);
        assert!(ev.overlay_at(5, 5).storm_alpha > ev.overlay_at(7, 5).storm_alpha);
        assert!(ev.overlay_at(20, 20).is_clear());
    }

    #[test]
    fn test_drought_dries_forest_to_savanna() {
        let mut grid = WorldGrid::filled(16, 16, TileType::Forest);
        let mut ev = event(EventKind::Drought, 8, 8, 4, 4, 1000);
        for _ in 0..60 {
            ev.step(&mut grid);
            if grid.tile(8, 8) != Some(TileType::Forest) {
                break;
            }
        }
        assert_eq!(grid.tile(8, 8), Some(TileType::Savanna));
        assert_eq!(grid.tile(0, 0), Some(TileType::Forest));
    }

    #[test]
    fn test_cold_snap_freezes_grassland() {
        let mut grid = WorldGrid::new(16, 16);
        let mut ev = event(EventKind::ColdSnap, 8, 8, 4, 4, 1000);
        for _ in 0..40 {
            ev.step(&mut grid);
        }
        assert_eq!(grid.tile(8, 8), Some(TileType::Snow));
        assert!(grid.hazard(8, 8).unwrap_or(0) > 0);
    }

    #[test]
    fn test_fit_to_grid_bounds_huge_radius() {
        let grid = WorldGrid::new(64, 48);
        let mut ev = event(EventKind::RainStorm, 10, 10, 40_000, i32::MAX, 0);
        ev.cursor = u32::MAX;
        ev.fit_to_grid(&grid);
        assert_eq!((ev.radius_x, ev.radius_y), (64, 48));
        assert_eq!(ev.box_area(), 129 * 97);
        assert_eq!(ev.batch_cells, 1);
        assert!(ev.cursor < ev.box_area());
    }

    #[test]
    fn test_box_area_saturates() {
        let ev = event(EventKind::Drought, 0, 0, i32::MAX, i32::MAX, 1);
        assert_eq!(ev.box_width(), u32::MAX);
        assert_eq!(ev.box_area(), u32::MAX);
    }

    #[test]
    fn test_done_after_duration() {
        let mut grid = WorldGrid::new(16, 16);
        let mut ev = event(EventKind::HeatWave, 8, 8, 3, 3, 20);
        ev.header.duration = 3;
        assert!(!ev.step(&mut grid).done);
        assert!(!ev.step(&mut grid).done);
        assert!(ev.step(&mut grid).done);
    }
}
