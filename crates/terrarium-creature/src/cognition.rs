//! Per-species cognition emergence
//!
//! Numeric state (intelligence, language, sociality, event pressure) advances
//! every tick from aggregated member statistics and a world-wide event
//! pulse. Thoughts and dialogue are telemetry on top of that state: they are
//! picked by hashing (species, tick) and never draw from the simulation RNG.

use std::collections::{BTreeMap, VecDeque};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use terrarium_simulation::RecentEvent;
use terrarium_simulation::hash::{hash_unit, mix32};

use crate::naming;
use crate::types::SpeciesId;

/// Processed event ids remembered before the oldest is evicted
pub const PROCESSED_EVENT_CAP: usize = 320;
/// Thought/dialogue lines kept per species
pub const TELEMETRY_CAP: usize = 12;

pub const INTELLIGENCE_THRESHOLD: f32 = 0.56;
pub const LANGUAGE_THRESHOLD: f32 = 0.3;
pub const POPULATION_THRESHOLD: usize = 14;

const COGNITION_CEILING: f32 = 0.99;
const PULSE_DECAY: f32 = 0.95;

/// One generated thought or dialogue line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitionLine {
    pub tick: u64,
    pub text: String,
}

/// Cognitive state of one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesCognition {
    pub species: SpeciesId,
    #[serde(default)]
    pub intelligence: f32,
    #[serde(default)]
    pub language_level: f32,
    #[serde(default)]
    pub social_complexity: f32,
    #[serde(default)]
    pub event_pressure: f32,
    #[serde(default)]
    pub first_intelligent_tick: Option<u64>,
    #[serde(default)]
    pub last_thought_tick: Option<u64>,
    #[serde(default)]
    pub last_dialogue_tick: Option<u64>,
    #[serde(default)]
    pub thoughts: VecDeque<CognitionLine>,
    #[serde(default)]
    pub dialogue: VecDeque<CognitionLine>,
    #[serde(default)]
    pub last_population: usize,
}

impl SpeciesCognition {
    /// Fresh state seeded from a hash of the species id
    pub fn seeded(species: SpeciesId) -> Self {
        let h = mix32(species.0 ^ 0x3c6e_f372);
        Self {
            species,
            intelligence: hash_unit(h) * 0.05,
            language_level: hash_unit(mix32(h ^ 0xa54f_f53a)) * 0.02,
            social_complexity: 0.0,
            event_pressure: 0.0,
            first_intelligent_tick: None,
            last_thought_tick: None,
            last_dialogue_tick: None,
            thoughts: VecDeque::new(),
            dialogue: VecDeque::new(),
            last_population: 0,
        }
    }

    pub fn is_intelligent(&self) -> bool {
        self.first_intelligent_tick.is_some()
    }

    fn sanitize(&mut self) {
        self.intelligence = clamp_to(self.intelligence, COGNITION_CEILING);
        self.language_level = clamp_to(self.language_level, COGNITION_CEILING);
        self.social_complexity = clamp_to(self.social_complexity, 1.0);
        self.event_pressure = clamp_to(self.event_pressure, 1.0);
        while self.thoughts.len() > TELEMETRY_CAP {
            self.thoughts.pop_front();
        }
        while self.dialogue.len() > TELEMETRY_CAP {
            self.dialogue.pop_front();
        }
    }
}

fn clamp_to(v: f32, max: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, max) } else { 0.0 }
}

/// Means over the living members of one species for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeciesAggregate {
    pub population: usize,
    pub generation: f32,
    pub temp_stress: f32,
    pub humidity_stress: f32,
    pub hazard: f32,
    /// Perception radius normalized to 0.0-1.0
    pub perception: f32,
    /// Efficiency normalized to 0.0-1.0
    pub efficiency: f32,
}

impl SpeciesAggregate {
    /// Accumulate one member (sums; call `finish` afterwards)
    pub fn add(&mut self, c: &crate::creature::Creature) {
        self.population += 1;
        self.generation += c.generation as f32;
        self.temp_stress += c.temp_stress;
        self.humidity_stress += c.humidity_stress;
        self.hazard += c.hazard_exposure;
        self.perception += (c.genome.perception_radius as f32 / 8.0).min(1.0);
        self.efficiency += ((c.genome.efficiency - 0.5) / 1.0).clamp(0.0, 1.0);
    }

    /// Turn sums into means
    pub fn finish(mut self) -> Self {
        if self.population > 0 {
            let n = self.population as f32;
            self.generation /= n;
            self.temp_stress /= n;
            self.humidity_stress /= n;
            self.hazard /= n;
            self.perception /= n;
            self.efficiency /= n;
        }
        self
    }
}

/// Plain snapshot of the tracker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CognitionState {
    #[serde(default)]
    pub event_pulse: f32,
    #[serde(default)]
    pub processed_events: Vec<u64>,
    #[serde(default)]
    pub species: Vec<SpeciesCognition>,
}

#[derive(Debug, Clone, Default)]
pub struct CognitionTracker {
    event_pulse: f32,
    processed: VecDeque<u64>,
    species: BTreeMap<SpeciesId, SpeciesCognition>,
}

impl CognitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_pulse(&self) -> f32 {
        self.event_pulse
    }

    pub fn processed_len(&self) -> usize {
        self.processed.len()
    }

    pub fn has_processed(&self, id: u64) -> bool {
        self.processed.contains(&id)
    }

    pub fn get(&self, species: SpeciesId) -> Option<&SpeciesCognition> {
        self.species.get(&species)
    }

    pub fn all(&self) -> impl Iterator<Item = &SpeciesCognition> {
        self.species.values()
    }

    /// Get-or-create the state of a species
    pub fn state_mut(&mut self, species: SpeciesId) -> &mut SpeciesCognition {
        self.species
            .entry(species)
            .or_insert_with(|| SpeciesCognition::seeded(species))
    }

    /// Decay the pulse, then bump it once for every event id not seen before
    pub fn observe_events(&mut self, events: &[RecentEvent]) {
        self.event_pulse *= PULSE_DECAY;
        for event in events {
            if self.processed.contains(&event.id) {
                continue;
            }
            self.processed.push_back(event.id);
            while self.processed.len() > PROCESSED_EVENT_CAP {
                self.processed.pop_front();
            }
            self.event_pulse = (self.event_pulse + event.kind.pulse_intensity()).min(1.0);
        }
    }

    /// Advance every species with living members. Returns species that
    /// became intelligent this tick.
    pub fn update(
        &mut self,
        aggregates: &BTreeMap<SpeciesId, SpeciesAggregate>,
        tick: u64,
    ) -> Vec<SpeciesId> {
        let pulse = self.event_pulse;
        let mut emerged = Vec::new();

        for state in self.species.values_mut() {
            if !aggregates.contains_key(&state.species) {
                state.last_population = 0;
            }
        }

        for (&id, agg) in aggregates {
            let state = self
                .species
                .entry(id)
                .or_insert_with(|| SpeciesCognition::seeded(id));
            advance(state, agg, pulse);
            state.last_population = agg.population;

            if state.first_intelligent_tick.is_none()
                && state.intelligence >= INTELLIGENCE_THRESHOLD
                && state.language_level >= LANGUAGE_THRESHOLD
                && agg.population >= POPULATION_THRESHOLD
            {
                state.first_intelligent_tick = Some(tick);
                log::info!(
                    "Species {} became intelligent at tick {} (intelligence {:.2}, language {:.2}, population {})",
                    id,
                    tick,
                    state.intelligence,
                    state.language_level,
                    agg.population
                );
                emerged.push(id);
            }

            emit_telemetry(state, agg, tick);
        }
        emerged
    }

    pub fn export_state(&self) -> CognitionState {
        CognitionState {
            event_pulse: self.event_pulse,
            processed_events: self.processed.iter().copied().collect(),
            species: self.species.values().cloned().collect(),
        }
    }

    pub fn hydrate_state(&mut self, state: CognitionState) {
        self.event_pulse = clamp_to(state.event_pulse, 1.0);
        // Keep each id at its first position, then evict the oldest past the cap
        let mut seen = AHashSet::new();
        let mut processed: VecDeque<u64> = state
            .processed_events
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        while processed.len() > PROCESSED_EVENT_CAP {
            processed.pop_front();
        }
        self.processed = processed;
        self.species.clear();
        for mut s in state.species {
            s.sanitize();
            self.species.insert(s.species, s);
        }
    }
}

/// Exponential approach of `current` toward `target`
fn approach(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

fn advance(state: &mut SpeciesCognition, agg: &SpeciesAggregate, pulse: f32) {
    let adaptation = (1.0
        - (agg.temp_stress * 0.82 + agg.humidity_stress * 0.78 + agg.hazard * 0.36))
        .clamp(0.0, 1.0);

    let social_target = ((agg.population as f32 + 1.0).ln() / 170f32.ln()).clamp(0.0, 1.0);
    state.social_complexity =
        approach(state.social_complexity, social_target, 0.04).clamp(0.0, 1.0);

    let pressure_target = (pulse * (0.6 + agg.hazard * 0.8)).clamp(0.0, 1.0);
    state.event_pressure = approach(state.event_pressure, pressure_target, 0.08).clamp(0.0, 1.0);

    let generation = (agg.generation / 40.0).min(1.0);
    let mut gain = 0.00035
        * (state.social_complexity * 0.9
            + adaptation * 0.6
            + state.event_pressure * 0.8
            + generation * 0.5
            + agg.perception * 0.4
            + agg.efficiency * 0.3);
    if state.social_complexity < 0.2 {
        gain *= 0.35;
    }
    let penalty = 0.00025 * (agg.temp_stress + agg.humidity_stress);
    state.intelligence = clamp_to(state.intelligence + gain - penalty, COGNITION_CEILING);

    let language_target = (state.intelligence * 0.72
        + state.social_complexity * 0.22
        + state.event_pressure * 0.12
        - 0.08)
        .clamp(0.0, COGNITION_CEILING);
    state.language_level = clamp_to(
        approach(state.language_level, language_target, 0.02),
        COGNITION_CEILING,
    );
}

static INSTINCT_THOUGHTS: &[&str] = &[
    "hungry",
    "warm here",
    "danger near",
    "stay close",
    "water?",
    "move on",
    "safe",
    "cold",
];

static INSTINCT_CALLS: &[&str] = &["chirr", "hoo", "kek-kek", "mrr", "tsk", "oo-oo"];

static FULL_THOUGHTS: &[&str] = &[
    "The land shifts; we must remember where the water was.",
    "Fewer of us returned from the dry plains this season.",
    "If we follow the rains, the young will grow strong.",
    "Fire from the mountain again. The old paths are gone.",
    "We are many now. Someone should watch the horizon.",
    "The cold came early. We should gather closer.",
    "There is more to the world than the next meal.",
];

static FULL_DIALOGUE: &[&str] = &[
    "\"Have you seen the river since the quake?\"",
    "\"Stay near the grass; the storm is coming.\"",
    "\"The elders say the heat will pass.\"",
    "\"Let us teach the young the safe valleys.\"",
    "\"Why does the ground burn in the east?\"",
    "\"Together we endured the long drought.\"",
];

static CONCERNS: &[&str] = &["danger", "thirst", "heat", "kin", "food", "rain"];

fn pick<'a>(pool: &'a [&'a str], h: u32) -> &'a str {
    pool[(h as usize) % pool.len()]
}

fn dominant_concern(agg: &SpeciesAggregate) -> &'static str {
    if agg.hazard > 0.3 {
        CONCERNS[0]
    } else if agg.humidity_stress > agg.temp_stress && agg.humidity_stress > 0.1 {
        CONCERNS[1]
    } else if agg.temp_stress > 0.1 {
        CONCERNS[2]
    } else if agg.population > 40 {
        CONCERNS[3]
    } else {
        CONCERNS[4]
    }
}

fn push_line(buf: &mut VecDeque<CognitionLine>, tick: u64, text: String) {
    buf.push_back(CognitionLine { tick, text });
    while buf.len() > TELEMETRY_CAP {
        buf.pop_front();
    }
}

fn emit_telemetry(state: &mut SpeciesCognition, agg: &SpeciesAggregate, tick: u64) {
    let h = mix32(state.species.0.wrapping_mul(0x9e37_79b9) ^ (tick as u32) ^ 0x7f4a_7c15);

    if state.intelligence >= 0.08 {
        let interval = 20 + (240.0 * (1.0 - state.intelligence)) as u64;
        let due = state
            .last_thought_tick
            .is_none_or(|last| tick.saturating_sub(last) >= interval);
        if due {
            let text = if state.language_level < 0.15 {
                pick(INSTINCT_THOUGHTS, h).to_string()
            } else if state.language_level < 0.55 {
                format!(
                    "{}... {}",
                    naming::utterance(h, 2),
                    dominant_concern(agg)
                )
            } else {
                pick(FULL_THOUGHTS, h).to_string()
            };
            push_line(&mut state.thoughts, tick, text);
            state.last_thought_tick = Some(tick);
        }
    }

    if state.language_level >= 0.12 && agg.population >= 2 {
        let interval = 30 + (320.0 * (1.0 - state.language_level)) as u64;
        let due = state
            .last_dialogue_tick
            .is_none_or(|last| tick.saturating_sub(last) >= interval);
        if due {
            let h = mix32(h ^ 0x1f83_d9ab);
            let text = if state.language_level < 0.15 {
                pick(INSTINCT_CALLS, h).to_string()
            } else if state.language_level < 0.55 {
                let words = 2 + (state.language_level * 6.0) as usize;
                format!("\"{}!\"", naming::utterance(h, words))
            } else {
                pick(FULL_DIALOGUE, h).to_string()
            };
            push_line(&mut state.dialogue, tick, text);
            state.last_dialogue_tick = Some(tick);
        }
    }
}
