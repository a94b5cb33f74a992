//! Run reporting: lifecycle hook that logs milestones, periodic summary
//! lines and the end-of-run species table

use terrarium_core::creature::{CreatureId, PopulationHooks, SpeciesId, SpeciesStats};
use terrarium_core::grid::Overlay;
use terrarium_core::{Simulation, TickReport};

/// Counts births and deaths, logs speciation and intelligence emergence
#[derive(Debug, Default)]
pub struct LoggingHooks {
    pub births: u64,
    pub deaths: u64,
    pub speciations: u64,
    pub intelligent: Vec<(SpeciesId, u64)>,
}

impl PopulationHooks for LoggingHooks {
    fn on_birth(&mut self, _child: CreatureId, _parent: CreatureId, _species: SpeciesId, _tick: u64) {
        self.births += 1;
    }

    fn on_death(&mut self, _creature: CreatureId, _species: SpeciesId, _tick: u64) {
        self.deaths += 1;
    }

    fn on_speciation(&mut self, species: SpeciesId, parent_species: SpeciesId, tick: u64) {
        self.speciations += 1;
        log::info!(
            "Tick {}: species {} branched off from {}",
            tick,
            species,
            parent_species
        );
    }

    fn on_intelligence(&mut self, species: SpeciesId, tick: u64) {
        self.intelligent.push((species, tick));
        log::info!("Tick {}: species {} became intelligent", tick, species);
    }
}

fn overlay_label(overlay: Overlay) -> String {
    if overlay.is_clear() {
        return "clear".to_string();
    }
    format!(
        "storm {:.2} heat {:.2} cold {:.2}",
        overlay.storm_alpha, overlay.heat_alpha, overlay.cold_alpha
    )
}

/// One-line status for periodic logging
pub fn summary_line(sim: &Simulation, report: &TickReport, hooks: &LoggingHooks) -> String {
    let active: Vec<String> = sim
        .events()
        .active()
        .iter()
        .map(|e| e.kind().to_string())
        .collect();
    format!(
        "tick {} | pop {} | species {} | births {} deaths {} | events [{}]{} | overlay {}",
        report.tick,
        report.population,
        sim.species().living_count(),
        hooks.births,
        hooks.deaths,
        active.join(", "),
        if sim.volcano().is_erupting() {
            " + volcano"
        } else {
            ""
        },
        overlay_label(report.overlay)
    )
}

/// Rows of the end-of-run species table, living species first
pub fn species_table(stats: &[SpeciesStats]) -> Vec<String> {
    let mut rows: Vec<&SpeciesStats> = stats.iter().collect();
    rows.sort_by_key(|s| (s.population == 0, std::cmp::Reverse(s.population), s.id));
    rows.into_iter()
        .map(|s| {
            let status = match (s.extinct_tick, s.first_intelligent_tick) {
                (Some(t), _) => format!("extinct at {t}"),
                (None, Some(t)) => format!("intelligent since {t}"),
                (None, None) => "living".to_string(),
            };
            let mut row = format!(
                "{} '{}': pop {} (peak {}), gen {:.1}, energy {:.1}, intelligence {:.2}, language {:.2}, {}",
                s.id,
                s.name,
                s.population,
                s.peak_population,
                s.mean_generation,
                s.mean_energy,
                s.intelligence,
                s.language_level,
                status
            );
            if let Some(thought) = &s.latest_thought {
                row.push_str(&format!(" | \"{thought}\""));
            }
            row
        })
        .collect()
}
