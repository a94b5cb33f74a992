//! Environmental event engine
//!
//! Spawns hazard events on a seasonal schedule, steps every active event once
//! per tick and keeps a capped log of recent events for other subsystems.
//!
//! RNG draws only happen once the capacity and cooldown gates pass, and event
//! state machines never draw from the session RNG after spawning, so the
//! event stream is a pure function of (seed, call sequence).

mod active;
mod area;
mod earthquake;
mod eruption;

pub use active::{ActiveEvent, EventHeader, StepOutcome};
pub use area::AreaEvent;
pub use earthquake::{CRACK_SALT, EarthquakeEvent};
pub use eruption::{EruptionPhase, LavaTile, VolcanoEruption};

use serde::{Deserialize, Serialize};
use terrarium_simulation::hash::event_seed;
use terrarium_simulation::{EventKind, Overlay, RecentEvent, SimRng, TileType, WorldGrid};

/// Draws spent looking for volcanic terrain before keeping the last anchor
const ERUPTION_ANCHOR_ATTEMPTS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventEngineConfig {
    pub max_active_events: usize,
    /// Minimum ticks between scheduled spawns
    pub cooldown_ticks: u64,
    /// Spawn probability multiplier, clamped to 0-5
    pub event_rate: f32,
    /// Bounding-box positions an area event visits per tick
    pub batch_cells: u32,
    pub recent_capacity: usize,
    /// Period of the wet/dry oscillator in ticks
    pub season_length: u64,
}

impl Default for EventEngineConfig {
    fn default() -> Self {
        Self {
            max_active_events: 4,
            cooldown_ticks: 180,
            event_rate: 1.0,
            batch_cells: 220,
            recent_capacity: 48,
            season_length: 2400,
        }
    }
}

impl EventEngineConfig {
    /// Clamp tuning into usable ranges
    pub fn sanitized(mut self) -> Self {
        self.event_rate = if self.event_rate.is_finite() {
            self.event_rate.clamp(0.0, 5.0)
        } else {
            1.0
        };
        self.batch_cells = self.batch_cells.max(1);
        self.recent_capacity = self.recent_capacity.max(1);
        self.season_length = self.season_length.max(1);
        self
    }
}

/// Fully specified event for manual spawning
#[derive(Debug, Clone, PartialEq)]
pub enum EventSpawnRequest {
    Area {
        kind: EventKind,
        x: i32,
        y: i32,
        radius_x: i32,
        radius_y: i32,
        intensity: f32,
        duration: u32,
    },
    Earthquake {
        x: i32,
        y: i32,
        length: i32,
        /// Radians
        angle: f32,
        half_width: i32,
        intensity: f32,
    },
    Eruption {
        x: i32,
        y: i32,
        duration: u32,
        eruption_ticks: u32,
        max_lava_tiles: u32,
    },
}

impl EventSpawnRequest {
    fn kind(&self) -> EventKind {
        match self {
            EventSpawnRequest::Area { kind, .. } => *kind,
            EventSpawnRequest::Earthquake { .. } => EventKind::Earthquake,
            EventSpawnRequest::Eruption { .. } => EventKind::VolcanoEruption,
        }
    }

    fn anchor(&self) -> (i32, i32) {
        match *self {
            EventSpawnRequest::Area { x, y, .. }
            | EventSpawnRequest::Earthquake { x, y, .. }
            | EventSpawnRequest::Eruption { x, y, .. } => (x, y),
        }
    }

    fn summary(&self) -> String {
        match self {
            EventSpawnRequest::Area {
                kind,
                radius_x,
                radius_y,
                intensity,
                duration,
                ..
            } => format!(
                "{} {}x{} at intensity {:.2} for {} ticks",
                kind, radius_x, radius_y, intensity, duration
            ),
            EventSpawnRequest::Earthquake {
                length, intensity, ..
            } => format!("earthquake along a {}-tile fault at intensity {:.2}", length, intensity),
            EventSpawnRequest::Eruption {
                duration,
                max_lava_tiles,
                ..
            } => format!(
                "volcanic eruption of up to {} lava tiles over {} ticks",
                max_lava_tiles, duration
            ),
        }
    }
}

/// Result of one engine tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStepResult {
    pub changed: bool,
    /// Channel-wise max over the events stepped this tick
    pub overlay: Overlay,
    pub spawned: Option<u64>,
    pub completed: Vec<u64>,
}

/// Plain snapshot of the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventEngineState {
    #[serde(default)]
    pub seed: u32,
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub spawn_counter: u32,
    #[serde(default)]
    pub last_spawn_tick: Option<u64>,
    #[serde(default)]
    pub config: EventEngineConfig,
    #[serde(default)]
    pub active: Vec<ActiveEvent>,
    #[serde(default)]
    pub recent: Vec<RecentEvent>,
}

pub struct EventEngine {
    seed: u32,
    config: EventEngineConfig,
    next_id: u64,
    spawn_counter: u32,
    last_spawn_tick: Option<u64>,
    active: Vec<ActiveEvent>,
    recent: Vec<RecentEvent>,
}

impl EventEngine {
    pub fn new(seed: u32, config: EventEngineConfig) -> Self {
        Self {
            seed,
            config: config.sanitized(),
            next_id: 1,
            spawn_counter: 0,
            last_spawn_tick: None,
            active: Vec::new(),
            recent: Vec::new(),
        }
    }

    pub fn config(&self) -> &EventEngineConfig {
        &self.config
    }

    pub fn set_event_rate(&mut self, rate: f32) {
        self.config.event_rate = rate;
        self.config = self.config.clone().sanitized();
    }

    pub fn active(&self) -> &[ActiveEvent] {
        &self.active
    }

    /// Oldest first
    pub fn recent(&self) -> &[RecentEvent] {
        &self.recent
    }

    /// Seasonal wet bias in [0, 1]
    pub fn wet_bias(&self, tick: u64) -> f32 {
        let season = self.config.season_length.max(1);
        let phase = (tick % season) as f32 / season as f32;
        0.5 + 0.5 * (std::f32::consts::TAU * phase).sin()
    }

    pub fn step(&mut self, grid: &mut WorldGrid, rng: &mut dyn SimRng, tick: u64) -> EventStepResult {
        let mut result = EventStepResult {
            spawned: self.try_spawn(grid, rng, tick),
            ..EventStepResult::default()
        };

        let mut i = 0;
        while i < self.active.len() {
            let outcome = self.active[i].step(grid);
            result.changed |= outcome.changed;
            result.overlay = result.overlay.max(outcome.overlay);
            if outcome.done {
                let event = self.active.remove(i);
                log::debug!(
                    "{} #{} finished at tick {} after {} ticks",
                    event.kind(),
                    event.id(),
                    tick,
                    event.header().elapsed
                );
                result.completed.push(event.id());
            } else {
                i += 1;
            }
        }
        result
    }

    fn try_spawn(&mut self, grid: &WorldGrid, rng: &mut dyn SimRng, tick: u64) -> Option<u64> {
        if self.active.len() >= self.config.max_active_events {
            return None;
        }
        if self
            .last_spawn_tick
            .is_some_and(|last| tick.saturating_sub(last) < self.config.cooldown_ticks)
        {
            return None;
        }
        if grid.is_empty() {
            return None;
        }

        let wet = self.wet_bias(tick);
        let probability = (0.028 + wet * 0.012) * self.config.event_rate;
        if !rng.chance(probability) {
            return None;
        }

        let kind = pick_kind(rng.next_float(), wet);
        let request = draw_request(kind, grid, rng);
        let id = self.spawn(request, grid, tick)?;
        self.last_spawn_tick = Some(tick);
        Some(id)
    }

    /// Spawn a fully specified event. Returns None when the request cannot
    /// produce an event on this grid.
    pub fn spawn(&mut self, request: EventSpawnRequest, grid: &WorldGrid, tick: u64) -> Option<u64> {
        let (x, y) = request.anchor();
        if !grid.in_bounds(x, y) {
            log::debug!("Dropped {} spawn outside the grid at ({}, {})", request.kind(), x, y);
            return None;
        }
        let header = EventHeader {
            id: self.next_id,
            kind: request.kind(),
            start_tick: tick,
            duration: 0,
            elapsed: 0,
            seed: event_seed(self.seed, tick, self.spawn_counter),
            x,
            y,
        };

        let event = match request {
            EventSpawnRequest::Area {
                kind,
                radius_x,
                radius_y,
                intensity,
                duration,
                ..
            } => {
                if !kind.is_area() || radius_x <= 0 || radius_y <= 0 || duration == 0 {
                    return None;
                }
                let mut area = AreaEvent {
                    header: EventHeader { duration, ..header },
                    radius_x,
                    radius_y,
                    cursor: 0,
                    batch_cells: self.config.batch_cells,
                    intensity: if intensity.is_finite() {
                        intensity.clamp(0.0, 4.0)
                    } else {
                        0.0
                    },
                };
                area.fit_to_grid(grid);
                ActiveEvent::Area(area)
            }
            EventSpawnRequest::Earthquake {
                length,
                angle,
                half_width,
                intensity,
                ..
            } => ActiveEvent::Earthquake(EarthquakeEvent::new(
                header, grid, length, angle, half_width, intensity,
            )?),
            EventSpawnRequest::Eruption {
                duration,
                eruption_ticks,
                max_lava_tiles,
                ..
            } => {
                if duration == 0 {
                    return None;
                }
                ActiveEvent::Eruption(VolcanoEruption::new(
                    EventHeader { duration, ..header },
                    eruption_ticks,
                    max_lava_tiles,
                ))
            }
        };

        let summary = request.summary();
        self.next_id += 1;
        self.spawn_counter = self.spawn_counter.wrapping_add(1);
        let id = event.id();
        log::info!(
            "Spawned {} #{} at ({}, {}) on tick {}: {}",
            event.kind(),
            id,
            x,
            y,
            tick,
            summary
        );
        self.push_recent(RecentEvent {
            id,
            kind: event.kind(),
            tick,
            x,
            y,
            summary,
        });
        self.active.push(event);
        Some(id)
    }

    /// Log an event that is simulated elsewhere (the standing volcano).
    /// Returns the id assigned to the log entry.
    pub fn record_external(&mut self, kind: EventKind, tick: u64, x: i32, y: i32, summary: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        log::info!("{} #{} at ({}, {}) on tick {}: {}", kind, id, x, y, tick, summary);
        self.push_recent(RecentEvent {
            id,
            kind,
            tick,
            x,
            y,
            summary,
        });
        id
    }

    fn push_recent(&mut self, entry: RecentEvent) {
        self.recent.push(entry);
        let cap = self.config.recent_capacity;
        if self.recent.len() > cap {
            let excess = self.recent.len() - cap;
            self.recent.drain(..excess);
        }
    }

    /// Max overlay of all active events at one tile
    pub fn overlay_at(&self, x: i32, y: i32) -> Overlay {
        self.active
            .iter()
            .fold(Overlay::default(), |acc, e| acc.max(e.overlay_at(x, y)))
    }

    /// Max event-wide overlay of all active events
    pub fn overlay(&self) -> Overlay {
        self.active
            .iter()
            .fold(Overlay::default(), |acc, e| acc.max(e.overlay()))
    }

    pub fn export_state(&self) -> EventEngineState {
        EventEngineState {
            seed: self.seed,
            next_id: self.next_id,
            spawn_counter: self.spawn_counter,
            last_spawn_tick: self.last_spawn_tick,
            config: self.config.clone(),
            active: self.active.clone(),
            recent: self.recent.clone(),
        }
    }

    /// Restore from a snapshot, dropping events that cannot run on `grid`
    pub fn hydrate_state(&mut self, state: EventEngineState, grid: &WorldGrid) {
        self.seed = state.seed;
        self.config = state.config.sanitized();
        self.spawn_counter = state.spawn_counter;
        self.last_spawn_tick = state.last_spawn_tick;

        let before = state.active.len();
        self.active = state
            .active
            .into_iter()
            .filter_map(|mut e| e.sanitize(grid).then_some(e))
            .collect();
        if self.active.len() != before {
            log::warn!(
                "Dropped {} malformed events while restoring",
                before - self.active.len()
            );
        }

        self.recent = state.recent;
        let cap = self.config.recent_capacity;
        if self.recent.len() > cap {
            let excess = self.recent.len() - cap;
            self.recent.drain(..excess);
        }

        // Never hand out an id already in use
        let max_seen = self
            .active
            .iter()
            .map(|e| e.id())
            .chain(self.recent.iter().map(|r| r.id))
            .max()
            .unwrap_or(0);
        self.next_id = state.next_id.max(max_seen + 1).max(1);
    }
}

/// Weighted kind choice for `r` in [0, 1)
fn pick_kind(r: f32, wet: f32) -> EventKind {
    let weights = [
        (EventKind::RainStorm, 0.18 + 0.16 * wet),
        (EventKind::Drought, 0.14 + 0.16 * (1.0 - wet)),
        (EventKind::HeatWave, 0.14),
        (EventKind::ColdSnap, 0.12),
        (EventKind::VolcanoEruption, 0.04),
    ];
    let mut cumulative = 0.0;
    for (kind, weight) in weights {
        cumulative += weight;
        if r < cumulative {
            return kind;
        }
    }
    EventKind::Earthquake
}

/// Draw anchor and parameters for a scheduled spawn, in a fixed order
fn draw_request(kind: EventKind, grid: &WorldGrid, rng: &mut dyn SimRng) -> EventSpawnRequest {
    let (width, height) = (grid.width() as u32, grid.height() as u32);
    let mut x = rng.next_int(width) as i32;
    let mut y = rng.next_int(height) as i32;
    if kind == EventKind::VolcanoEruption {
        for attempt in 0..ERUPTION_ANCHOR_ATTEMPTS {
            if matches!(
                grid.tile(x, y),
                Some(TileType::Mountain | TileType::Hills | TileType::Rock)
            ) {
                break;
            }
            if attempt + 1 < ERUPTION_ANCHOR_ATTEMPTS {
                x = rng.next_int(width) as i32;
                y = rng.next_int(height) as i32;
            }
        }
    }

    match kind {
        EventKind::Earthquake => {
            let length = rng.range_int(18, 48);
            let angle = rng.next_float() * std::f32::consts::TAU;
            let half_width = rng.range_int(1, 3);
            let intensity = 0.7 + 0.3 * rng.next_float();
            EventSpawnRequest::Earthquake {
                x,
                y,
                length,
                angle,
                half_width,
                intensity,
            }
        }
        EventKind::VolcanoEruption => {
            let duration = rng.range_int(900, 1600) as u32;
            let max_lava_tiles = rng.range_int(60, 180) as u32;
            EventSpawnRequest::Eruption {
                x,
                y,
                duration,
                eruption_ticks: (duration as f32 * 0.3) as u32,
                max_lava_tiles,
            }
        }
        area => {
            let radius_x = rng.range_int(8, 22);
            let radius_y = rng.range_int(6, 18);
            let intensity = 0.6 + 0.4 * rng.next_float();
            let (min, max) = match area {
                EventKind::RainStorm => (160, 360),
                EventKind::Drought => (260, 520),
                _ => (200, 420),
            };
            let duration = rng.range_int(min, max) as u32;
            EventSpawnRequest::Area {
                kind: area,
                x,
                y,
                radius_x,
                radius_y,
                intensity,
                duration,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;

    /// Counts the raw words drawn from the wrapped generator
    struct CountingRng {
        inner: Xoshiro256StarStar,
        draws: usize,
    }

    impl CountingRng {
        fn new(seed: u64) -> Self {
            Self {
                inner: Xoshiro256StarStar::seed_from_u64(seed),
                draws: 0,
            }
        }
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }
        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dest)
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.draws += 1;
            self.inner.try_fill_bytes(dest)
        }
    }

    fn rain(x: i32, y: i32) -> EventSpawnRequest {
        EventSpawnRequest::Area {
            kind: EventKind::RainStorm,
            x,
            y,
            radius_x: 10,
            radius_y: 8,
            intensity: 1.0,
            duration: 100,
        }
    }

    #[test]
    fn test_pick_kind_cumulative_weights() {
        assert_eq!(pick_kind(0.0, 0.5), EventKind::RainStorm);
        assert_eq!(pick_kind(0.25, 0.5), EventKind::RainStorm);
        assert_eq!(pick_kind(0.27, 0.5), EventKind::Drought);
        assert_eq!(pick_kind(0.5, 0.5), EventKind::HeatWave);
        assert_eq!(pick_kind(0.7, 0.5), EventKind::ColdSnap);
        assert_eq!(pick_kind(0.76, 0.5), EventKind::VolcanoEruption);
        assert_eq!(pick_kind(0.9, 0.5), EventKind::Earthquake);
        // Wet season widens the rain band
        assert_eq!(pick_kind(0.33, 1.0), EventKind::RainStorm);
        assert_eq!(pick_kind(0.33, 0.0), EventKind::Drought);
    }

    #[test]
    fn test_wet_bias_oscillates() {
        let engine = EventEngine::new(1, EventEngineConfig::default());
        assert!((engine.wet_bias(0) - 0.5).abs() < 1e-6);
        assert!((engine.wet_bias(600) - 1.0).abs() < 1e-4);
        assert!(engine.wet_bias(1800) < 1e-4);
        assert!((engine.wet_bias(2400) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_no_draws_when_at_capacity() {
        let mut grid = WorldGrid::new(64, 64);
        let mut rng = CountingRng::new(3);
        let mut engine = EventEngine::new(
            3,
            EventEngineConfig {
                max_active_events: 0,
                event_rate: 5.0,
                ..EventEngineConfig::default()
            },
        );
        for tick in 0..500 {
            engine.step(&mut grid, &mut rng, tick);
        }
        assert_eq!(rng.draws, 0);
        assert!(engine.recent().is_empty());
    }

    #[test]
    fn test_cooldown_suppresses_draws() {
        let mut grid = WorldGrid::new(96, 96);
        let mut rng = CountingRng::new(11);
        let mut engine = EventEngine::new(
            11,
            EventEngineConfig {
                event_rate: 5.0,
                max_active_events: 16,
                ..EventEngineConfig::default()
            },
        );
        let mut tick = 0;
        let spawned_at = loop {
            if engine.step(&mut grid, &mut rng, tick).spawned.is_some() {
                break tick;
            }
            tick += 1;
            assert!(tick < 10_000, "nothing ever spawned");
        };
        let draws = rng.draws;
        for t in spawned_at + 1..spawned_at + 180 {
            assert!(engine.step(&mut grid, &mut rng, t).spawned.is_none());
        }
        assert_eq!(rng.draws, draws);
    }

    #[test]
    fn test_same_seed_same_event_stream() {
        let run = || {
            let mut grid = WorldGrid::new(80, 60);
            let mut rng = Xoshiro256StarStar::seed_from_u64(77);
            let mut engine = EventEngine::new(77, EventEngineConfig::default());
            for tick in 0..4000 {
                engine.step(&mut grid, &mut rng, tick);
            }
            (engine.recent().to_vec(), grid.fingerprint())
        };
        let (a_log, a_grid) = run();
        let (b_log, b_grid) = run();
        assert!(!a_log.is_empty());
        assert_eq!(a_log, b_log);
        assert_eq!(a_grid, b_grid);
    }

    #[test]
    fn test_manual_spawn_logged_and_completes() {
        let mut grid = WorldGrid::new(48, 48);
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        let mut engine = EventEngine::new(
            5,
            EventEngineConfig {
                max_active_events: 1,
                ..EventEngineConfig::default()
            },
        );
        let id = engine.spawn(rain(10, 10), &grid, 0).expect("rain spawned");
        assert_eq!(engine.recent().len(), 1);
        assert_eq!(engine.recent()[0].id, id);
        assert_eq!(engine.recent()[0].kind, EventKind::RainStorm);

        let mut completed = Vec::new();
        for tick in 0..100 {
            let result = engine.step(&mut grid, &mut rng, tick);
            completed.extend(result.completed);
        }
        assert_eq!(completed, vec![id]);
        assert!(engine.active().is_empty());
    }

    #[test]
    fn test_invalid_requests_dropped() {
        let grid = WorldGrid::new(16, 16);
        let mut engine = EventEngine::new(1, EventEngineConfig::default());
        assert!(engine.spawn(rain(-1, 4), &grid, 0).is_none());
        let zero_radius = EventSpawnRequest::Area {
            kind: EventKind::Drought,
            x: 4,
            y: 4,
            radius_x: 0,
            radius_y: 3,
            intensity: 1.0,
            duration: 10,
        };
        assert!(engine.spawn(zero_radius, &grid, 0).is_none());
        let wrong_kind = EventSpawnRequest::Area {
            kind: EventKind::Earthquake,
            x: 4,
            y: 4,
            radius_x: 3,
            radius_y: 3,
            intensity: 1.0,
            duration: 10,
        };
        assert!(engine.spawn(wrong_kind, &grid, 0).is_none());
        assert!(engine.recent().is_empty());
    }

    #[test]
    fn test_oversized_area_clamped_to_grid() {
        let mut grid = WorldGrid::new(64, 64);
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);
        let mut engine = EventEngine::new(
            2,
            EventEngineConfig {
                event_rate: 0.0,
                ..EventEngineConfig::default()
            },
        );
        let huge = EventSpawnRequest::Area {
            kind: EventKind::RainStorm,
            x: 10,
            y: 10,
            radius_x: 40_000,
            radius_y: 40_000,
            intensity: 1.0,
            duration: 5,
        };
        let id = engine.spawn(huge, &grid, 0).expect("clamped spawn accepted");
        let ActiveEvent::Area(area) = &engine.active()[0] else {
            panic!("expected an area event");
        };
        assert_eq!((area.radius_x, area.radius_y), (64, 64));

        let mut completed = Vec::new();
        for tick in 0..5 {
            completed.extend(engine.step(&mut grid, &mut rng, tick).completed);
        }
        assert_eq!(completed, vec![id]);
    }

    #[test]
    fn test_recent_log_capped() {
        let grid = WorldGrid::new(16, 16);
        let mut engine = EventEngine::new(
            1,
            EventEngineConfig {
                recent_capacity: 5,
                ..EventEngineConfig::default()
            },
        );
        for tick in 0..12 {
            engine.record_external(EventKind::VolcanoEruption, tick, 1, 1, String::new());
        }
        assert_eq!(engine.recent().len(), 5);
        assert_eq!(engine.recent()[0].tick, 7);
        assert!(engine.spawn(rain(8, 8), &grid, 12).is_some());
        assert_eq!(engine.recent().len(), 5);
        assert_eq!(engine.recent()[4].id, 13);
    }

    #[test]
    fn test_export_hydrate_resumes_identically() {
        let mut grid = WorldGrid::new(64, 48);
        let mut rng = Xoshiro256StarStar::seed_from_u64(9);
        let config = EventEngineConfig {
            event_rate: 4.0,
            ..EventEngineConfig::default()
        };
        let mut engine = EventEngine::new(9, config.clone());
        for tick in 0..900 {
            engine.step(&mut grid, &mut rng, tick);
        }

        let mut restored = EventEngine::new(0, EventEngineConfig::default());
        restored.hydrate_state(engine.export_state(), &grid);
        let mut grid_b = grid.clone();
        let mut rng_b = rng.clone();
        for tick in 900..1800 {
            engine.step(&mut grid, &mut rng, tick);
            restored.step(&mut grid_b, &mut rng_b, tick);
        }
        assert_eq!(engine.export_state(), restored.export_state());
        assert_eq!(grid.fingerprint(), grid_b.fingerprint());
    }

    #[test]
    fn test_hydrate_drops_malformed_and_truncates_log() {
        let grid = WorldGrid::new(16, 16);
        let mut engine = EventEngine::new(1, EventEngineConfig::default());
        engine.spawn(rain(4, 4), &grid, 0);
        let mut state = engine.export_state();
        if let ActiveEvent::Area(area) = &mut state.active[0] {
            area.header.duration = 0;
        }
        state.config.recent_capacity = 2;
        state.recent = (0..6)
            .map(|i| RecentEvent {
                id: i,
                ..RecentEvent::default()
            })
            .collect();
        state.next_id = 0;

        let mut restored = EventEngine::new(0, EventEngineConfig::default());
        restored.hydrate_state(state, &grid);
        assert!(restored.active().is_empty());
        assert_eq!(restored.recent().len(), 2);
        assert_eq!(restored.recent()[0].id, 4);
        let id = restored.record_external(EventKind::Drought, 1, 0, 0, String::new());
        assert_eq!(id, 6);
    }
}
