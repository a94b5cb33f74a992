//! Shared environmental event vocabulary
//!
//! Lives here so the creature crate can read the recent-event log without
//! depending on the event engine itself.

use serde::{Deserialize, Serialize};

/// Kind of environmental hazard
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[default]
    RainStorm,
    Drought,
    HeatWave,
    ColdSnap,
    Earthquake,
    VolcanoEruption,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::RainStorm,
        EventKind::Drought,
        EventKind::HeatWave,
        EventKind::ColdSnap,
        EventKind::Earthquake,
        EventKind::VolcanoEruption,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventKind::RainStorm => "rain storm",
            EventKind::Drought => "drought",
            EventKind::HeatWave => "heat wave",
            EventKind::ColdSnap => "cold snap",
            EventKind::Earthquake => "earthquake",
            EventKind::VolcanoEruption => "volcanic eruption",
        }
    }

    /// Elliptical area events share one walker
    pub fn is_area(self) -> bool {
        matches!(
            self,
            EventKind::RainStorm | EventKind::Drought | EventKind::HeatWave | EventKind::ColdSnap
        )
    }

    /// How strongly a newly observed event of this kind bumps cognition pressure
    pub fn pulse_intensity(self) -> f32 {
        match self {
            EventKind::RainStorm => 0.08,
            EventKind::ColdSnap => 0.14,
            EventKind::HeatWave => 0.16,
            EventKind::Drought => 0.22,
            EventKind::Earthquake => 0.28,
            EventKind::VolcanoEruption => 0.34,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable row of the recent-events log
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentEvent {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub kind: EventKind,
    #[serde(default)]
    pub tick: u64,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub summary: String,
}

/// Atmosphere tint requested by active events, each channel 0.0-1.0
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub storm_alpha: f32,
    pub heat_alpha: f32,
    pub cold_alpha: f32,
}

impl Overlay {
    /// Channel-wise maximum
    pub fn max(self, other: Overlay) -> Overlay {
        Overlay {
            storm_alpha: self.storm_alpha.max(other.storm_alpha),
            heat_alpha: self.heat_alpha.max(other.heat_alpha),
            cold_alpha: self.cold_alpha.max(other.cold_alpha),
        }
    }

    pub fn scaled(self, factor: f32) -> Overlay {
        Overlay {
            storm_alpha: (self.storm_alpha * factor).clamp(0.0, 1.0),
            heat_alpha: (self.heat_alpha * factor).clamp(0.0, 1.0),
            cold_alpha: (self.cold_alpha * factor).clamp(0.0, 1.0),
        }
    }

    pub fn is_clear(&self) -> bool {
        self.storm_alpha <= 0.0 && self.heat_alpha <= 0.0 && self.cold_alpha <= 0.0
    }
}
