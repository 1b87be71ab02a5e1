//! Passive mechanics: what happens to the settlement overnight regardless
//! of the vote.
//!
//! Applied once per day transition, after resolution and before the next
//! event is chosen, in this order:
//!
//! 1. base decay (population eats, morale frays, threat creeps up)
//! 2. percentage decay reduction from projects, then flat project buffs
//! 3. add and clamp
//! 4. cascade failures evaluated on the post-decay snapshot
//! 5. random disaster roll, amplified when the settlement is strained
//! 6. population drift, clamped to the floor and the project-raised cap

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::projects::ProjectBuffs;
use crate::stats::{StatDeltas, WorldStats};

/// Cascade threshold: morale below this hurts supplies.
const CASCADE_MORALE: i32 = 25;
/// Cascade threshold: supplies below this hurt morale and raise threat.
const CASCADE_SUPPLIES: i32 = 25;
/// Cascade threshold: threat above this hurts morale.
const CASCADE_THREAT: i32 = 75;

/// An unplanned setback rolled independently of the vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disaster {
    pub name: String,
    pub description: String,
    pub deltas: StatDeltas,
    /// Amplified because the settlement was already strained.
    #[serde(default)]
    pub critical: bool,
}

impl Disaster {
    fn new(name: &str, description: &str, morale: i32, supplies: i32, threat: i32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            deltas: StatDeltas::new(morale, supplies, threat),
            critical: false,
        }
    }

    /// ×1.3 on every delta, truncated toward zero, marked critical.
    pub fn amplified(&self) -> Disaster {
        let scale = |v: i32| v * 13 / 10;
        Disaster {
            name: self.name.clone(),
            description: format!("{} (CRITICAL)", self.description),
            deltas: StatDeltas {
                morale: scale(self.deltas.morale),
                supplies: scale(self.deltas.supplies),
                threat: scale(self.deltas.threat),
                population: scale(self.deltas.population),
            },
            critical: true,
        }
    }
}

/// The fixed disaster table. Uniformly sampled.
pub fn disaster_catalog() -> Vec<Disaster> {
    vec![
        Disaster::new(
            "Sudden Storm",
            "A violent storm damages shelter and depletes supplies",
            -8,
            -12,
            0,
        ),
        Disaster::new(
            "Equipment Failure",
            "Critical equipment breaks down unexpectedly",
            -6,
            -8,
            3,
        ),
        Disaster::new(
            "Illness Outbreak",
            "Several people fall ill without warning",
            -10,
            -6,
            0,
        ),
        Disaster::new(
            "Hostile Scouts",
            "Unfriendly groups spotted nearby",
            -5,
            0,
            12,
        ),
        Disaster::new(
            "Supply Spoilage",
            "Some of the food stores have gone bad",
            -4,
            -15,
            0,
        ),
        Disaster::new(
            "Accident",
            "A work accident injures someone and damages equipment",
            -8,
            -8,
            5,
        ),
        Disaster::new(
            "Theft",
            "Supplies have gone missing - stolen or misplaced",
            -12,
            -10,
            8,
        ),
        Disaster::new(
            "Wildlife Attack",
            "Dangerous animals raid the settlement",
            -6,
            -8,
            10,
        ),
    ]
}

/// Overnight decay with project buffs applied. Population is not touched.
///
/// Supply drain grows by 0.2 per resident above 20; the fractional part is
/// carried in tenths and truncated toward zero once, after buffs.
pub fn passive_decay(stats: &WorldStats, buffs: &ProjectBuffs) -> StatDeltas {
    let mut supply_tenths = -40 - (stats.population - 20).max(0) * 2;
    if stats.morale < 40 {
        supply_tenths -= 20;
    }

    let mut morale = -2;
    if stats.supplies < 40 {
        morale -= 2;
    }
    if stats.threat > 60 {
        morale -= 2;
    }
    let mut threat = 2;

    let reduction = buffs.decay_reduction.clamp(0, 100);
    let supplies = if reduction > 0 {
        let keep = 100 - reduction;
        morale = morale * keep / 100;
        threat = threat * keep / 100;
        supply_tenths * keep / 1000 + buffs.supplies_buff
    } else {
        (supply_tenths + buffs.supplies_buff * 10) / 10
    };

    StatDeltas::new(
        morale + buffs.morale_buff,
        supplies,
        threat - buffs.threat_reduction,
    )
}

/// Secondary penalties from stats already in the red.
///
/// Every condition is read from the same snapshot; the penalties add up.
/// Two or more critical stats at once add a compounding penalty on top.
pub fn cascade_penalties(stats: &WorldStats) -> StatDeltas {
    let mut penalty = StatDeltas::ZERO;
    let low_morale = stats.morale < CASCADE_MORALE;
    let low_supplies = stats.supplies < CASCADE_SUPPLIES;
    let high_threat = stats.threat > CASCADE_THREAT;

    if low_morale {
        penalty.supplies -= 5;
        log::info!("Cascade: critical morale causing supply problems");
    }
    if low_supplies {
        penalty.morale -= 5;
        penalty.threat += 5;
        log::info!("Cascade: critical supplies causing morale collapse and rising threat");
    }
    if high_threat {
        penalty.morale -= 5;
        log::info!("Cascade: high threat causing morale problems");
    }

    let critical = [low_morale, low_supplies, high_threat]
        .iter()
        .filter(|&&c| c)
        .count();
    if critical >= 2 {
        penalty.morale -= 5;
        penalty.supplies -= 5;
        penalty.threat += 5;
        log::info!("Cascade: {} critical stats compounding", critical);
    }
    penalty
}

/// Roll for a disaster with probability `chance`.
pub fn roll_disaster<R: Rng + ?Sized>(
    stats: &WorldStats,
    chance: f64,
    rng: &mut R,
) -> Option<Disaster> {
    if !rng.gen_bool(chance.clamp(0.0, 1.0)) {
        return None;
    }
    let catalog = disaster_catalog();
    let picked = catalog.choose(rng)?;
    let disaster = if stats.is_strained() {
        picked.amplified()
    } else {
        picked.clone()
    };
    log::info!("Random disaster: {}", disaster.name);
    Some(disaster)
}

/// Population change for the night.
///
/// Rules run in fixed order and each match *replaces* the change from an
/// earlier one rather than adding to it.
pub fn population_change<R: Rng + ?Sized>(stats: &WorldStats, rng: &mut R) -> i32 {
    let mut change = 0;

    if stats.morale > 60 && stats.supplies > 60 && stats.threat < 40 && rng.gen_bool(0.20) {
        change = rng.gen_range(1..=2);
        log::info!("Population growth: +{} (good conditions)", change);
    }
    if (stats.morale < 25 || stats.supplies < 25) && rng.gen_bool(0.25) {
        change = -rng.gen_range(1..=2);
        log::info!("Population loss: {} (harsh conditions)", change);
    }
    if stats.threat > 80 && rng.gen_bool(0.20) {
        change = -rng.gen_range(1..=3);
        log::info!("Population loss: {} (high threat)", change);
    }
    change
}

/// Everything the night did, for display and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveReport {
    pub decay: StatDeltas,
    pub cascade: StatDeltas,
    pub disaster: Option<Disaster>,
    pub population_change: i32,
    pub stats: WorldStats,
}

/// Run the overnight rules on `stats` and return the next snapshot.
pub fn apply_passive_mechanics<R: Rng + ?Sized>(
    stats: &WorldStats,
    buffs: &ProjectBuffs,
    config: &SimConfig,
    rng: &mut R,
) -> PassiveReport {
    let decay = passive_decay(stats, buffs);
    let decayed = stats.apply_core(&decay);

    let cascade = cascade_penalties(&decayed);
    let mut next = decayed.apply_core(&cascade);

    let disaster = roll_disaster(&next, config.disaster_chance, rng);
    if let Some(d) = &disaster {
        next = next.apply_core(&d.deltas);
        next.last_event_summary = format!(
            "{} | {}: {}",
            next.last_event_summary, d.name, d.description
        );
    }

    let bounds = config.population_bounds(buffs.population_capacity);
    let population_change = population_change(&next, rng);
    next.population = bounds.clamp(next.population + population_change);

    PassiveReport {
        decay,
        cascade,
        disaster,
        population_change,
        stats: next,
    }
}
