//! Active event state machines and their dispatch

use serde::{Deserialize, Serialize};
use terrarium_simulation::{EventKind, Overlay, WorldGrid};

use super::area::AreaEvent;
use super::earthquake::EarthquakeEvent;
use super::eruption::VolcanoEruption;

/// Fields shared by every active event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    pub id: u64,
    pub kind: EventKind,
    pub start_tick: u64,
    pub duration: u32,
    #[serde(default)]
    pub elapsed: u32,
    /// Per-event hash seed (jitter, crack pattern, lava spread)
    pub seed: u32,
    pub x: i32,
    pub y: i32,
}

impl EventHeader {
    /// Remaining life fraction, 1.0 at spawn down to 0.0 at expiry
    pub fn life(&self) -> f32 {
        if self.duration == 0 {
            return 0.0;
        }
        (1.0 - self.elapsed as f32 / self.duration as f32).clamp(0.0, 1.0)
    }
}

/// Result of stepping one event for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    pub done: bool,
    pub changed: bool,
    pub overlay: Overlay,
}

/// Closed set of event state machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActiveEvent {
    Area(AreaEvent),
    Earthquake(EarthquakeEvent),
    Eruption(VolcanoEruption),
}

impl ActiveEvent {
    pub fn header(&self) -> &EventHeader {
        match self {
            ActiveEvent::Area(e) => &e.header,
            ActiveEvent::Earthquake(e) => &e.header,
            ActiveEvent::Eruption(e) => &e.header,
        }
    }

    pub fn id(&self) -> u64 {
        self.header().id
    }

    pub fn kind(&self) -> EventKind {
        self.header().kind
    }

    pub fn step(&mut self, grid: &mut WorldGrid) -> StepOutcome {
        match self {
            ActiveEvent::Area(e) => e.step(grid),
            ActiveEvent::Earthquake(e) => e.step(grid),
            ActiveEvent::Eruption(e) => e.step(grid),
        }
    }

    /// Event-wide overlay contribution
    pub fn overlay(&self) -> Overlay {
        match self {
            ActiveEvent::Area(e) => e.overlay(),
            ActiveEvent::Earthquake(_) => Overlay::default(),
            ActiveEvent::Eruption(e) => e.overlay(),
        }
    }

    /// Overlay contribution at one tile
    pub fn overlay_at(&self, x: i32, y: i32) -> Overlay {
        match self {
            ActiveEvent::Area(e) => e.overlay_at(x, y),
            ActiveEvent::Earthquake(_) => Overlay::default(),
            ActiveEvent::Eruption(e) => e.overlay_at(x, y),
        }
    }

    /// Repair a hydrated event. Returns false if it cannot run.
    pub fn sanitize(&mut self, grid: &WorldGrid) -> bool {
        if self.header().duration == 0 {
            return false;
        }
        match self {
            ActiveEvent::Area(e) => {
                if e.radius_x <= 0 || e.radius_y <= 0 || !e.header.kind.is_area() {
                    return false;
                }
                e.fit_to_grid(grid);
                e.intensity = finite_or(e.intensity, 0.0).clamp(0.0, 4.0);
                true
            }
            ActiveEvent::Earthquake(e) => e.sanitize(grid),
            ActiveEvent::Eruption(e) => e.sanitize(grid),
        }
    }
}

pub(crate) fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_decays_linearly() {
        let mut h = EventHeader {
            duration: 200,
            ..EventHeader::default()
        };
        assert_eq!(h.life(), 1.0);
        h.elapsed = 50;
        assert_eq!(h.life(), 0.75);
        h.elapsed = 400;
        assert_eq!(h.life(), 0.0);
        h.duration = 0;
        assert_eq!(h.life(), 0.0);
    }

    #[test]
    fn test_sanitize_rejects_zero_radius() {
        let grid = WorldGrid::new(8, 8);
        let mut ev = ActiveEvent::Area(AreaEvent {
            header: EventHeader {
                duration: 10,
                ..EventHeader::default()
            },
            radius_x: 0,
            radius_y: 3,
            cursor: 0,
            batch_cells: 10,
            intensity: 1.0,
        });
        assert!(!ev.sanitize(&grid));
    }

    #[test]
    fn test_sanitize_wraps_cursor() {
        let grid = WorldGrid::new(8, 8);
        let mut ev = ActiveEvent::Area(AreaEvent {
            header: EventHeader {
                duration: 10,
                ..EventHeader::default()
            },
            radius_x: 1,
            radius_y: 1,
            cursor: 11,
            batch_cells: 10,
            intensity: f32::NAN,
        });
        assert!(ev.sanitize(&grid));
        let ActiveEvent::Area(area) = ev else {
            unreachable!()
        };
        assert_eq!(area.cursor, 2);
        assert_eq!(area.intensity, 0.0);
    }

    #[test]
    fn test_sanitize_clamps_restored_radius_and_batch() {
        let grid = WorldGrid::new(16, 16);
        let mut ev = ActiveEvent::Area(AreaEvent {
            header: EventHeader {
                kind: EventKind::HeatWave,
                duration: 10,
                ..EventHeader::default()
            },
            radius_x: 1 << 30,
            radius_y: 5,
            cursor: 7,
            batch_cells: 0,
            intensity: 1.0,
        });
        assert!(ev.sanitize(&grid));
        let ActiveEvent::Area(area) = ev else {
            unreachable!()
        };
        assert_eq!(area.radius_x, 16);
        assert_eq!(area.radius_y, 5);
        assert_eq!(area.batch_cells, 1);
        assert_eq!(area.cursor, 7);
    }
}
