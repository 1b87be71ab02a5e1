//! Day driver: runs one day transition at a time for a single settlement.
//!
//! A transition resolves the current event's vote, applies the passive
//! mechanics, feeds production into the active project, and selects the
//! next event. `advance_day` takes `&mut self`, so one `Simulation` can only
//! ever have one transition in flight. Votes are collected by the host; the
//! tally handed in is a snapshot, and a vote arriving after it was taken
//! belongs to no day.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{EventCategory, EventTemplate, TemplatePool};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::mechanics::{apply_passive_mechanics, Disaster, PassiveReport};
use crate::projects::{daily_production, ProductionReport, ProjectLedger};
use crate::resolution::{resolve_day, Ending, VoteTally};
use crate::selector::select_template;
use crate::stats::{StatDeltas, WorldStats};

/// One completed day, kept for history views and for rewinding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub day_number: u32,
    pub event_id: String,
    pub headline: String,
    pub category: EventCategory,
    pub chosen_option: String,
    pub chosen_label: String,
    pub tally: VoteTally,
    pub stats_before: WorldStats,
    pub stats_after: WorldStats,
    pub disaster: Option<Disaster>,
    /// The full template the day was played with; rewinding restores it.
    pub event: EventTemplate,
}

/// Everything a transition produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReport {
    pub day_number: u32,
    pub chosen_option: String,
    pub chosen_label: String,
    pub tally: VoteTally,
    pub vote_deltas: StatDeltas,
    pub passive: Option<PassiveReport>,
    pub production: Option<ProductionReport>,
    pub ending: Option<Ending>,
    pub stats: WorldStats,
    /// The event for the following day; `None` once the game has ended.
    pub next_event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub config: SimConfig,
    pub stats: WorldStats,
    pub day_number: u32,
    pub current_event: EventTemplate,
    pub history: Vec<HistoryEntry>,
    pub ledger: ProjectLedger,
    pub ending: Option<Ending>,
}

impl Simulation {
    /// Start at genesis on day 1 with a freshly selected event.
    pub fn new<R: Rng + ?Sized>(config: SimConfig, pool: &TemplatePool, rng: &mut R) -> Self {
        let stats = config.genesis_stats();
        let current_event = select_template(pool, &stats, 1, &config, rng);
        log::info!("Simulation started on day 1 with {}", current_event.id);
        Self {
            config,
            stats,
            day_number: 1,
            current_event,
            history: Vec::new(),
            ledger: ProjectLedger::default(),
            ending: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.ending.is_some()
    }

    /// Resolve today and move to tomorrow.
    pub fn advance_day<R: Rng + ?Sized>(
        &mut self,
        tally: &VoteTally,
        pool: &TemplatePool,
        rng: &mut R,
    ) -> Result<DayReport, SimError> {
        if let Some(ending) = self.ending {
            return Err(SimError::Ended {
                day: self.day_number,
                ending,
            });
        }

        let buffs = self.ledger.buffs();
        let bounds = self.config.population_bounds(buffs.population_capacity);
        let stats_before = self.stats.clone();
        let resolution = resolve_day(tally, &self.current_event, &self.stats, &bounds);

        let mut passive = None;
        let mut production = None;
        let mut ending = resolution.ending;
        let mut stats = resolution.new_stats;

        if ending.is_none() {
            let report = apply_passive_mechanics(&stats, &buffs, &self.config, rng);
            stats = report.stats.clone();
            passive = Some(report);
            production = self
                .ledger
                .apply_production(daily_production(&stats, &buffs));
            ending = Ending::check(&stats);
        }

        self.history.push(HistoryEntry {
            day_number: self.day_number,
            event_id: self.current_event.id.clone(),
            headline: self.current_event.headline.clone(),
            category: self.current_event.category,
            chosen_option: resolution.chosen_option.clone(),
            chosen_label: resolution.chosen_label.clone(),
            tally: tally.clone(),
            stats_before,
            stats_after: stats.clone(),
            disaster: passive.as_ref().and_then(|p| p.disaster.clone()),
            event: self.current_event.clone(),
        });

        let day_number = self.day_number;
        self.stats = stats;
        self.ending = ending;

        let next_event_id = match ending {
            Some(ending) => {
                log::info!("Day {} ended the simulation: {}", day_number, ending);
                None
            }
            None => {
                self.day_number += 1;
                self.current_event =
                    select_template(pool, &self.stats, self.day_number, &self.config, rng);
                log::info!(
                    "Day {} begins with {} ({})",
                    self.day_number,
                    self.current_event.id,
                    self.current_event.category
                );
                Some(self.current_event.id.clone())
            }
        };

        Ok(DayReport {
            day_number,
            chosen_option: resolution.chosen_option,
            chosen_label: resolution.chosen_label,
            tally: tally.clone(),
            vote_deltas: resolution.deltas,
            passive,
            production,
            ending,
            stats: self.stats.clone(),
            next_event_id,
        })
    }

    /// Undo the most recent transition: stats, day, event and ending go
    /// back to how they were before it. Project progress stays.
    pub fn rewind_last_day(&mut self) -> Result<HistoryEntry, SimError> {
        let entry = self.history.pop().ok_or(SimError::NothingToRewind)?;
        self.stats = entry.stats_before.clone();
        self.day_number = entry.day_number;
        self.current_event = entry.event.clone();
        self.ending = None;
        log::info!("Rewound to the start of day {}", self.day_number);
        Ok(entry)
    }

    /// Back to genesis: day 1, empty history, no projects, no ending.
    pub fn reset<R: Rng + ?Sized>(&mut self, pool: &TemplatePool, rng: &mut R) {
        *self = Simulation::new(self.config.clone(), pool, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::{BuffKind, Project};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet_config() -> SimConfig {
        SimConfig {
            disaster_chance: 0.0,
            ..SimConfig::default()
        }
    }

    fn general_only_pool() -> TemplatePool {
        TemplatePool::new(vec![EventTemplate::new(
            "routine",
            "Routine",
            "",
            EventCategory::General,
        )
        .option("hold", "Hold Steady", [0, 0, 0], "")
        .option("collapse", "Collapse", [-100, 0, 0], "")])
        .unwrap()
    }

    #[test]
    fn test_new_starts_at_genesis() {
        let mut rng = StdRng::seed_from_u64(1);
        let sim = Simulation::new(quiet_config(), &TemplatePool::builtin(), &mut rng);
        assert_eq!(sim.day_number, 1);
        assert_eq!(sim.stats, WorldStats::default());
        assert!(!sim.is_over());
    }

    #[test]
    fn test_new_clamps_genesis() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut config = quiet_config();
        config.genesis.morale = 500;
        config.genesis.supplies = -20;
        config.genesis.population = 3;
        let sim = Simulation::new(config, &general_only_pool(), &mut rng);
        assert!(sim.stats.in_bounds());
        assert_eq!((sim.stats.morale, sim.stats.supplies), (100, 0));
        assert_eq!(sim.stats.population, 10);
    }

    #[test]
    fn test_advance_records_history_and_moves_day() {
        let mut rng = StdRng::seed_from_u64(2);
        let pool = general_only_pool();
        let mut sim = Simulation::new(quiet_config(), &pool, &mut rng);
        let report = sim.advance_day(&VoteTally::new(), &pool, &mut rng).unwrap();
        assert_eq!(report.day_number, 1);
        assert_eq!(report.chosen_option, "hold");
        assert_eq!(sim.day_number, 2);
        assert_eq!(sim.history.len(), 1);
        assert_eq!(report.next_event_id.as_deref(), Some("routine"));
        // Passive decay only: 70/80/30 -> 68/76/32
        assert_eq!((sim.stats.morale, sim.stats.supplies, sim.stats.threat), (68, 76, 32));
    }

    #[test]
    fn test_terminal_vote_stops_the_simulation() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = general_only_pool();
        let mut sim = Simulation::new(quiet_config(), &pool, &mut rng);
        let tally: VoteTally = [("collapse", 4)].into_iter().collect();
        let report = sim.advance_day(&tally, &pool, &mut rng).unwrap();
        assert_eq!(report.ending, Some(Ending::HopeLost));
        assert!(report.passive.is_none());
        assert!(report.next_event_id.is_none());
        assert_eq!(sim.day_number, 1);

        let err = sim.advance_day(&VoteTally::new(), &pool, &mut rng).unwrap_err();
        assert_eq!(
            err,
            SimError::Ended {
                day: 1,
                ending: Ending::HopeLost
            }
        );
    }

    #[test]
    fn test_decay_can_end_the_simulation() {
        let mut rng = StdRng::seed_from_u64(4);
        let pool = general_only_pool();
        let config = SimConfig {
            genesis: WorldStats::new(2, 80, 30),
            ..quiet_config()
        };
        let mut sim = Simulation::new(config, &pool, &mut rng);
        let report = sim.advance_day(&VoteTally::new(), &pool, &mut rng).unwrap();
        assert_eq!(report.ending, Some(Ending::HopeLost));
        assert!(report.passive.is_some());
        assert!(sim.is_over());
    }

    #[test]
    fn test_rewind_restores_previous_day() {
        let mut rng = StdRng::seed_from_u64(5);
        let pool = general_only_pool();
        let mut sim = Simulation::new(quiet_config(), &pool, &mut rng);
        let before = sim.stats.clone();
        let event_before = sim.current_event.id.clone();
        sim.advance_day(&VoteTally::new(), &pool, &mut rng).unwrap();
        let entry = sim.rewind_last_day().unwrap();
        assert_eq!(entry.day_number, 1);
        assert_eq!(sim.stats, before);
        assert_eq!(sim.day_number, 1);
        assert_eq!(sim.current_event.id, event_before);
        assert_eq!(sim.rewind_last_day().unwrap_err(), SimError::NothingToRewind);
    }

    #[test]
    fn test_rewind_after_persisting_restores_event() {
        let pool = TemplatePool::new(vec![
            EventTemplate::new("first", "First", "", EventCategory::General)
                .max_threat(30)
                .option("hold", "Hold", [0, 0, 0], "")
                .option("wait", "Wait", [0, 0, 0], ""),
            EventTemplate::new("later", "Later", "", EventCategory::General)
                .requires_day(2)
                .option("hold", "Hold", [0, 0, 0], "")
                .option("wait", "Wait", [0, 0, 0], ""),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut sim = Simulation::new(quiet_config(), &pool, &mut rng);
        assert_eq!(sim.current_event.id, "first");
        sim.advance_day(&VoteTally::new(), &pool, &mut rng).unwrap();
        assert_eq!(sim.current_event.id, "later");

        let json = serde_json::to_string(&sim).unwrap();
        let mut restored: Simulation = serde_json::from_str(&json).unwrap();
        restored.rewind_last_day().unwrap();
        assert_eq!(restored.day_number, 1);
        assert_eq!(restored.current_event.id, "first");
        assert_eq!(restored.stats, WorldStats::default());
    }

    #[test]
    fn test_rewind_clears_ending() {
        let mut rng = StdRng::seed_from_u64(6);
        let pool = general_only_pool();
        let mut sim = Simulation::new(quiet_config(), &pool, &mut rng);
        let tally: VoteTally = [("collapse", 1)].into_iter().collect();
        sim.advance_day(&tally, &pool, &mut rng).unwrap();
        assert!(sim.is_over());
        sim.rewind_last_day().unwrap();
        assert!(!sim.is_over());
        assert!(sim.advance_day(&VoteTally::new(), &pool, &mut rng).is_ok());
    }

    #[test]
    fn test_active_project_gets_production() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = general_only_pool();
        let mut sim = Simulation::new(quiet_config(), &pool, &mut rng);
        sim.ledger.start(Project {
            id: 1,
            name: "Storage Depot".to_string(),
            description: String::new(),
            cost: 20,
            buff_type: BuffKind::SuppliesBuff,
            buff_value: 2,
        });
        let report = sim.advance_day(&VoteTally::new(), &pool, &mut rng).unwrap();
        let production = report.production.unwrap();
        // (68 + 76) * 0.15 = 21.6 -> 21
        assert_eq!(production.production, 21);
        assert!(production.completed);
        assert_eq!(sim.ledger.buffs().supplies_buff, 2);
    }

    #[test]
    fn test_reset_returns_to_genesis() {
        let mut rng = StdRng::seed_from_u64(8);
        let pool = general_only_pool();
        let mut sim = Simulation::new(quiet_config(), &pool, &mut rng);
        sim.advance_day(&VoteTally::new(), &pool, &mut rng).unwrap();
        sim.reset(&pool, &mut rng);
        assert_eq!(sim.day_number, 1);
        assert!(sim.history.is_empty());
        assert_eq!(sim.stats, WorldStats::default());
    }
}
